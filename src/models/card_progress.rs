use super::sm2::Sm2State;
use chrono::{DateTime, NaiveDate, Utc};

/// Scheduling state of one card for one learner.
///
/// A missing record means the card has never been reviewed by that learner.
#[derive(Clone, Debug, PartialEq)]
pub struct CardProgress {
    pub user_id: String,
    pub card_id: i64,
    pub easiness_factor: f64,
    pub repetitions: u32,
    pub interval: u32,
    pub next_review_date: NaiveDate,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every save; stores reject writes based on a stale version.
    pub version: i64,
}

impl CardProgress {
    pub fn sm2_state(&self) -> Sm2State {
        Sm2State {
            easiness_factor: self.easiness_factor,
            repetitions: self.repetitions,
            interval: self.interval,
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review_date <= today
    }
}

/// Due predicate over an optional progress record.
pub fn is_due(progress: Option<&CardProgress>, today: NaiveDate) -> bool {
    progress.is_none_or(|p| p.is_due(today))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress_due_on(date: NaiveDate) -> CardProgress {
        CardProgress {
            user_id: "user-1".to_string(),
            card_id: 1,
            easiness_factor: 2.5,
            repetitions: 1,
            interval: 1,
            next_review_date: date,
            updated_at: Utc::now(),
            version: 0,
        }
    }

    #[test]
    fn test_due_boundary() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let yesterday = today.pred_opt().unwrap();
        let tomorrow = today.succ_opt().unwrap();

        assert!(progress_due_on(today).is_due(today));
        assert!(progress_due_on(yesterday).is_due(today));
        assert!(!progress_due_on(tomorrow).is_due(today));
        // Looked at from the day before, a card due today is not yet due.
        assert!(!progress_due_on(today).is_due(yesterday));
    }

    #[test]
    fn test_never_reviewed_is_due() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert!(is_due(None, today));
    }
}
