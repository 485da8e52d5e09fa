mod auth;
mod meetups;
mod movies;
mod tmdb;

pub use auth::*;
pub use meetups::*;
pub use movies::*;
pub use tmdb::*;

use serde::{Deserialize, Deserializer};

/// Maps a present JSON value (including `null`) to `Some`, so a missing
/// field and an explicit `null` can be told apart with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
