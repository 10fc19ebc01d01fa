//! Review scheduling on top of a progress store.
//!
//! `submit_review` is a read-modify-write of one `CardProgress` row: the row
//! is loaded, the next SM-2 state computed, and the result saved with a
//! version check so that two reviews racing on the same card cannot both win.
//! The losing call gets `SchedulerError::Conflict` and nothing is written.

use crate::clock::{Clock, UtcClock};
use crate::database::{CardCatalog, ProgressStore};
use crate::error::{Result, SchedulerError};
use crate::models::{CardProgress, Flashcard, Grade, card_progress, sm2};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// New scheduling values after a review.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewOutcome {
    pub card_id: i64,
    pub easiness_factor: f64,
    pub repetitions: u32,
    pub interval: u32,
    pub next_review_date: NaiveDate,
}

/// How a learner stands on one set on a given day.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SetProgress {
    pub total: usize,
    /// Never reviewed.
    pub new: usize,
    /// Reviewed before and due again.
    pub due: usize,
    /// Reviewed and not due yet.
    pub scheduled: usize,
}

impl SetProgress {
    /// Cards a review session started today would show.
    pub fn due_today(&self) -> usize {
        self.new + self.due
    }
}

pub struct Scheduler<S, C = UtcClock> {
    store: S,
    clock: C,
}

impl<S, C> Scheduler<S, C>
where
    S: ProgressStore + CardCatalog,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Records a review of `card_id` by `user_id` and reschedules the card.
    ///
    /// `grade` may be a [`Grade`], its name, or its quality score; anything
    /// unrecognized is rejected before the store is touched.
    pub fn submit_review<G>(&self, user_id: &str, card_id: i64, grade: G) -> Result<ReviewOutcome>
    where
        G: TryInto<Grade>,
        SchedulerError: From<G::Error>,
    {
        let grade: Grade = grade.try_into()?;
        let today = self.clock.today();

        let existing = self.store.load_progress(user_id, card_id)?;
        let previous = existing
            .as_ref()
            .map(CardProgress::sm2_state)
            .unwrap_or_default();

        let next = sm2::next_state(previous, grade);
        let next_review_date = sm2::next_review_date(today, next.interval)?;

        let expected_version = existing.as_ref().map(|p| p.version);
        let progress = CardProgress {
            user_id: user_id.to_string(),
            card_id,
            easiness_factor: next.easiness_factor,
            repetitions: next.repetitions,
            interval: next.interval,
            next_review_date,
            updated_at: Utc::now(),
            version: expected_version.map_or(0, |v| v + 1),
        };

        if let Err(err) = self.store.save_progress(&progress, expected_version) {
            if matches!(err, SchedulerError::Conflict { .. }) {
                warn!(user_id, card_id, "review lost a concurrent update");
            }
            return Err(err);
        }

        debug!(
            user_id,
            card_id,
            %grade,
            easiness_factor = next.easiness_factor,
            repetitions = next.repetitions,
            interval = next.interval,
            %next_review_date,
            "card rescheduled"
        );

        Ok(ReviewOutcome {
            card_id,
            easiness_factor: next.easiness_factor,
            repetitions: next.repetitions,
            interval: next.interval,
            next_review_date,
        })
    }

    /// Cards of `set_id` that `user_id` should review on `today`, by card id.
    ///
    /// A card is due if it has never been reviewed or its next review date is
    /// on or before `today`.
    pub fn list_due_cards(&self, user_id: &str, set_id: i64, today: NaiveDate) -> Result<Vec<Flashcard>> {
        let (cards, progress) = self.cards_with_progress(user_id, set_id)?;

        let mut due: Vec<Flashcard> = cards
            .into_iter()
            .filter(|card| card_progress::is_due(progress.get(&card.id), today))
            .collect();
        due.sort_by_key(|card| card.id);

        debug!(user_id, set_id, %today, due = due.len(), "listed due cards");
        Ok(due)
    }

    /// `list_due_cards` for the clock's current day.
    pub fn due_today(&self, user_id: &str, set_id: i64) -> Result<Vec<Flashcard>> {
        self.list_due_cards(user_id, set_id, self.clock.today())
    }

    pub fn set_progress(&self, user_id: &str, set_id: i64, today: NaiveDate) -> Result<SetProgress> {
        let (cards, progress) = self.cards_with_progress(user_id, set_id)?;

        let mut summary = SetProgress {
            total: cards.len(),
            ..SetProgress::default()
        };
        for card in &cards {
            match progress.get(&card.id) {
                None => summary.new += 1,
                Some(p) if p.is_due(today) => summary.due += 1,
                Some(_) => summary.scheduled += 1,
            }
        }
        Ok(summary)
    }

    fn cards_with_progress(
        &self,
        user_id: &str,
        set_id: i64,
    ) -> Result<(Vec<Flashcard>, HashMap<i64, CardProgress>)> {
        let cards = self.store.cards_in_set(set_id)?;
        if cards.is_empty() {
            return Ok((cards, HashMap::new()));
        }

        let card_ids: Vec<i64> = cards.iter().map(|card| card.id).collect();
        let progress = self
            .store
            .load_progress_for_cards(user_id, &card_ids)?
            .into_iter()
            .map(|p| (p.card_id, p))
            .collect();
        Ok((cards, progress))
    }
}
