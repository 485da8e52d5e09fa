use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::User;

use super::double_option;

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Confirmation, must equal `password`.
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LogoutRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Partial update of the caller's account and profile in one call.
/// The username is immutable and is not part of this request.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// `Some(None)` clears the birth date, `None` leaves it untouched.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn birth_date_distinguishes_null_from_missing() {
        let missing: UpdateProfileRequest = serde_json::from_str(r#"{"bio":"hi"}"#).unwrap();
        assert_eq!(missing.birth_date, None);

        let cleared: UpdateProfileRequest =
            serde_json::from_str(r#"{"birth_date":null}"#).unwrap();
        assert_eq!(cleared.birth_date, Some(None));

        let set: UpdateProfileRequest =
            serde_json::from_str(r#"{"birth_date":"1990-04-01"}"#).unwrap();
        assert_eq!(
            set.birth_date,
            Some(NaiveDate::from_ymd_opt(1990, 4, 1))
        );
    }

    #[test]
    fn username_in_profile_update_is_ignored() {
        let req: UpdateProfileRequest =
            serde_json::from_str(r#"{"username":"other","first_name":"Ann"}"#).unwrap();
        assert_eq!(req.first_name.as_deref(), Some("Ann"));
    }
}
