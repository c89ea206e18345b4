//! Meeting entity model and DTOs.

use portal_core::meeting::{self, MeetingLocation, MeetingStatus};
use portal_core::types::{EntityRef, MeetingId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A meeting row from the `meetings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Meeting {
    pub id: Uuid,
    pub project_id: Uuid,
    pub deliverable_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: Timestamp,
    pub duration_minutes: i32,
    #[sqlx(try_from = "String")]
    pub location: MeetingLocation,
    pub meeting_link: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: MeetingStatus,
    pub notes: Option<String>,
    pub scheduled_by: Option<Uuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Meeting {
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::Meeting(MeetingId(self.id))
    }

    pub fn end_time(&self) -> Timestamp {
        meeting::end_time(self.scheduled_at, self.duration_minutes)
    }

    pub fn is_upcoming(&self, now: Timestamp) -> bool {
        meeting::is_upcoming(self.scheduled_at, self.status, now)
    }
}

/// A meeting with its derived schedule fields, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingView {
    #[serde(flatten)]
    pub meeting: Meeting,
    pub end_time: Timestamp,
    pub is_upcoming: bool,
}

impl MeetingView {
    pub fn new(meeting: Meeting, now: Timestamp) -> Self {
        Self {
            end_time: meeting.end_time(),
            is_upcoming: meeting.is_upcoming(now),
            meeting,
        }
    }
}

/// DTO for scheduling a meeting.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScheduleMeeting {
    pub deliverable_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: Timestamp,
    /// Defaults to 60 minutes.
    pub duration_minutes: Option<i32>,
    /// Defaults to `meet`.
    pub location: Option<MeetingLocation>,
    #[validate(url)]
    pub meeting_link: Option<String>,
}

/// DTO for updating meeting details. Time changes go through reschedule.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateMeeting {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<MeetingLocation>,
    #[validate(url)]
    pub meeting_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleMeeting {
    pub scheduled_at: Timestamp,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteMeeting {
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddMeetingNotes {
    #[validate(length(min = 1))]
    pub notes: String,
}
