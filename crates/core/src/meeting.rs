//! Meeting locations, statuses and scheduling rules.

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

string_enum! {
    pub enum MeetingLocation {
        Zoom => "zoom",
        Meet => "meet",
        Teams => "teams",
        Physical => "physical",
    }
}

string_enum! {
    pub enum MeetingStatus {
        Scheduled => "scheduled",
        Rescheduled => "rescheduled",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

pub const DEFAULT_DURATION_MINUTES: i32 = 60;
pub const DEFAULT_LOCATION: MeetingLocation = MeetingLocation::Meet;

/// Longest meeting that can be booked, in minutes.
pub const MAX_DURATION_MINUTES: i32 = 24 * 60;

impl MeetingStatus {
    /// Completed and cancelled meetings can no longer change.
    pub fn is_closed(&self) -> bool {
        matches!(self, MeetingStatus::Completed | MeetingStatus::Cancelled)
    }
}

pub fn end_time(scheduled_at: Timestamp, duration_minutes: i32) -> Timestamp {
    scheduled_at + Duration::minutes(i64::from(duration_minutes))
}

/// A meeting is upcoming while it is still open and starts in the future.
pub fn is_upcoming(scheduled_at: Timestamp, status: MeetingStatus, now: Timestamp) -> bool {
    matches!(status, MeetingStatus::Scheduled | MeetingStatus::Rescheduled) && scheduled_at > now
}

pub fn validate_duration(duration_minutes: i32) -> Result<(), CoreError> {
    if (1..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "duration_minutes must be between 1 and {MAX_DURATION_MINUTES}"
        )))
    }
}

/// Reject transitions out of a closed meeting.
pub fn ensure_open(status: MeetingStatus) -> Result<(), CoreError> {
    if status.is_closed() {
        Err(CoreError::Validation(format!(
            "Meeting is already {status} and cannot be changed"
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;

    #[test]
    fn end_time_adds_duration() {
        let start = Utc::now();
        assert_eq!(end_time(start, 90), start + Duration::minutes(90));
    }

    #[test]
    fn future_scheduled_meeting_is_upcoming() {
        let now = Utc::now();
        let later = now + Duration::hours(1);
        assert!(is_upcoming(later, MeetingStatus::Scheduled, now));
        assert!(is_upcoming(later, MeetingStatus::Rescheduled, now));
    }

    #[test]
    fn past_or_closed_meeting_is_not_upcoming() {
        let now = Utc::now();
        assert!(!is_upcoming(now - Duration::hours(1), MeetingStatus::Scheduled, now));
        assert!(!is_upcoming(now + Duration::hours(1), MeetingStatus::Cancelled, now));
    }

    #[test]
    fn closed_meetings_reject_changes() {
        assert_matches!(ensure_open(MeetingStatus::Completed), Err(CoreError::Validation(_)));
        assert_matches!(ensure_open(MeetingStatus::Cancelled), Err(CoreError::Validation(_)));
        assert!(ensure_open(MeetingStatus::Rescheduled).is_ok());
    }

    #[test]
    fn duration_bounds() {
        assert!(validate_duration(DEFAULT_DURATION_MINUTES).is_ok());
        assert!(validate_duration(0).is_err());
        assert!(validate_duration(MAX_DURATION_MINUTES + 1).is_err());
    }
}
