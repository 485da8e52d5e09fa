use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TmdbSearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TmdbPageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}
