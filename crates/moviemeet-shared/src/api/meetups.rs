use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::MeetupStatus;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateMeetupRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Local catalog id, or a provider id when no such local row exists.
    pub movie: i64,
    /// Display name for the placeholder row created when the provider
    /// cannot be reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_title: Option<String>,
    pub location: String,
    #[serde(default)]
    pub theater_name: String,
    pub meetup_datetime: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<i32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateMeetupRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theater_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meetup_datetime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MeetupStatus>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MeetupListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MeetupStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie: Option<i64>,
    /// Only meetups scheduled from now on that are still upcoming.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upcoming: Option<bool>,
    /// Only meetups organized by the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_meetups: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ParticipantListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meetup: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JoinMeetupRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCommentRequest {
    pub text: String,
}
