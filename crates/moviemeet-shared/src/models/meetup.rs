use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MovieSummary, UserSummary};

pub const DEFAULT_MAX_PARTICIPANTS: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "meetup_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MeetupStatus {
    #[default]
    Upcoming,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "participant_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Pending,
    #[default]
    Accepted,
    Declined,
}

/// Head count of a meetup.
///
/// The organizer always occupies one seat but is never stored as a
/// participant row, so the count is derived from accepted rows plus one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub participants_count: i64,
    pub is_full: bool,
    pub available_spots: i64,
}

impl Attendance {
    pub fn new(accepted_participants: i64, max_participants: i32) -> Self {
        let participants_count = accepted_participants + 1;
        let max = i64::from(max_participants);
        Self {
            participants_count,
            is_full: participants_count >= max,
            available_spots: max - participants_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meetup {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub movie: MovieSummary,
    pub organizer: UserSummary,
    pub location: String,
    pub theater_name: String,
    pub meetup_datetime: DateTime<Utc>,
    pub max_participants: i32,
    pub status: MeetupStatus,
    #[serde(flatten)]
    pub attendance: Attendance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetupParticipant {
    pub id: i64,
    pub meetup_id: i64,
    pub user: UserSummary,
    pub status: ParticipantStatus,
    pub message: String,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetupComment {
    pub id: i64,
    pub meetup_id: i64,
    pub user: UserSummary,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Meetup with its roster and comment thread (newest comment first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetupDetail {
    #[serde(flatten)]
    pub meetup: Meetup,
    pub participants: Vec<MeetupParticipant>,
    pub comments: Vec<MeetupComment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organizer_counts_as_a_participant() {
        let attendance = Attendance::new(0, 10);
        assert_eq!(attendance.participants_count, 1);
        assert_eq!(attendance.available_spots, 9);
        assert!(!attendance.is_full);
    }

    #[test]
    fn full_when_count_reaches_capacity() {
        let attendance = Attendance::new(1, 2);
        assert_eq!(attendance.participants_count, 2);
        assert_eq!(attendance.available_spots, 0);
        assert!(attendance.is_full);
    }

    #[test]
    fn capacity_of_one_is_full_with_organizer_alone() {
        let attendance = Attendance::new(0, 1);
        assert!(attendance.is_full);
        assert_eq!(attendance.available_spots, 0);
    }

    #[test]
    fn over_capacity_goes_negative() {
        let attendance = Attendance::new(3, 3);
        assert_eq!(attendance.participants_count, 4);
        assert_eq!(attendance.available_spots, -1);
        assert!(attendance.is_full);
    }

    #[test]
    fn statuses_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&MeetupStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(
            serde_json::from_str::<ParticipantStatus>("\"pending\"").unwrap(),
            ParticipantStatus::Pending
        );
        assert_eq!(MeetupStatus::default(), MeetupStatus::Upcoming);
        assert_eq!(ParticipantStatus::default(), ParticipantStatus::Accepted);
    }

    #[test]
    fn attendance_is_flattened_into_meetup_json() {
        let json = serde_json::to_value(Attendance::new(2, 5)).unwrap();
        assert_eq!(json["participants_count"], 3);
        assert_eq!(json["available_spots"], 2);
        assert_eq!(json["is_full"], false);
    }
}
