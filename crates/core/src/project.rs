//! Project status, currency and progress rules.

use crate::error::CoreError;

string_enum! {
    pub enum ProjectStatus {
        Planning => "planning",
        Active => "active",
        OnHold => "on_hold",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

string_enum! {
    pub enum Currency {
        Usd => "usd",
        Ngn => "ngn",
        Eur => "eur",
    }
}

pub const MIN_PROGRESS: i32 = 0;
pub const MAX_PROGRESS: i32 = 100;

/// Reject progress values outside `[0, 100]`.
pub fn validate_progress(progress: i32) -> Result<(), CoreError> {
    if (MIN_PROGRESS..=MAX_PROGRESS).contains(&progress) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "progress_percentage must be between {MIN_PROGRESS} and {MAX_PROGRESS}, got {progress}"
        )))
    }
}

/// Completed milestones as a rounded percentage of all milestones.
///
/// A project without milestones has 0% progress.
pub fn progress_from_milestones(total: i64, completed: i64) -> i32 {
    if total <= 0 {
        return MIN_PROGRESS;
    }
    let completed = completed.clamp(0, total);
    ((completed as f64 / total as f64) * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        assert!(validate_progress(0).is_ok());
        assert!(validate_progress(100).is_ok());
        assert!(validate_progress(-1).is_err());
        assert!(validate_progress(101).is_err());
    }

    #[test]
    fn no_milestones_means_zero_progress() {
        assert_eq!(progress_from_milestones(0, 0), 0);
    }

    #[test]
    fn progress_rounds_to_nearest() {
        assert_eq!(progress_from_milestones(3, 1), 33);
        assert_eq!(progress_from_milestones(3, 2), 67);
        assert_eq!(progress_from_milestones(4, 4), 100);
    }

    #[test]
    fn completed_count_is_clamped() {
        assert_eq!(progress_from_milestones(2, 5), 100);
    }

    #[test]
    fn status_parses_snake_case() {
        assert_eq!("on_hold".parse::<ProjectStatus>().unwrap(), ProjectStatus::OnHold);
        assert!("ON_HOLD".parse::<ProjectStatus>().is_err());
    }
}
