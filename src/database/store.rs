//! Storage contracts the scheduler depends on.

use crate::error::Result;
use crate::models::{CardProgress, Flashcard};

/// Per-user, per-card scheduling state.
pub trait ProgressStore {
    fn load_progress(&self, user_id: &str, card_id: i64) -> Result<Option<CardProgress>>;

    /// Progress rows that exist for `user_id` among `card_ids`; cards never
    /// reviewed are simply absent from the result.
    fn load_progress_for_cards(&self, user_id: &str, card_ids: &[i64]) -> Result<Vec<CardProgress>> {
        let mut found = Vec::new();
        for &card_id in card_ids {
            if let Some(progress) = self.load_progress(user_id, card_id)? {
                found.push(progress);
            }
        }
        Ok(found)
    }

    /// Writes `progress` only if the stored row still has `expected_version`
    /// (`None` meaning no row exists yet). Otherwise fails with
    /// `SchedulerError::Conflict` and leaves the row untouched. A card that
    /// no longer exists fails with `SchedulerError::NotFound` instead.
    fn save_progress(&self, progress: &CardProgress, expected_version: Option<i64>) -> Result<()>;
}

/// Read access to flashcard sets.
pub trait CardCatalog {
    /// All cards of a set; `SchedulerError::NotFound` if the set does not exist.
    fn cards_in_set(&self, set_id: i64) -> Result<Vec<Flashcard>>;
}
