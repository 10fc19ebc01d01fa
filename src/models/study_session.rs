//! Study session management for spaced repetition practice.
//! Walks the due cards of a set in rounds, submitting every grade to the scheduler.

use super::{Flashcard, Grade};
use crate::clock::Clock;
use crate::database::{CardCatalog, ProgressStore};
use crate::error::Result;
use crate::scheduler::{ReviewOutcome, Scheduler};
use std::cmp::Reverse;
use tracing::info;

#[derive(Clone, Debug)]
pub struct SessionCard {
    pub flashcard: Flashcard,
    pub reviews: u32,
    pub last_grade: Option<Grade>,
    /// Grows with Again/Hard, shrinks with Good/Easy; retries are ordered by it.
    pub struggle: i32,
}

impl SessionCard {
    fn new(flashcard: Flashcard) -> Self {
        Self {
            flashcard,
            reviews: 0,
            last_grade: None,
            struggle: 0,
        }
    }

    fn record(&mut self, grade: Grade) {
        self.reviews += 1;
        self.last_grade = Some(grade);
        self.struggle += struggle_delta(grade);
    }

    /// Again and Hard mean the card was not yet mastered in this session.
    fn needs_repeat(&self) -> bool {
        matches!(self.last_grade, Some(Grade::Again | Grade::Hard))
    }
}

fn struggle_delta(grade: Grade) -> i32 {
    match grade {
        Grade::Again => 3,
        Grade::Hard => 2,
        Grade::Good => -1,
        Grade::Easy => -2,
    }
}

/// Manages a study session with multiple review rounds.
/// Cards graded Again or Hard are repeated in subsequent rounds, up to
/// `max_reviews_per_card` reviews each. Retries come back most-struggled
/// first, ties broken by card id.
pub struct StudySession {
    pub user_id: String,
    pub set_id: i64,
    pub cards: Vec<SessionCard>,
    pub current_round: Vec<usize>,
    pub current_index: usize,
    pub round_number: usize,
    pub max_reviews_per_card: u32,
}

impl StudySession {
    /// Starts a session over the cards of `set_id` that are due today.
    pub fn start<S, C>(
        scheduler: &Scheduler<S, C>,
        user_id: &str,
        set_id: i64,
        max_reviews_per_card: u32,
    ) -> Result<Self>
    where
        S: ProgressStore + CardCatalog,
        C: Clock,
    {
        let due = scheduler.due_today(user_id, set_id)?;
        info!(user_id, set_id, cards = due.len(), "study session started");
        Ok(Self::from_due_cards(user_id, set_id, due, max_reviews_per_card))
    }

    pub fn from_due_cards(
        user_id: &str,
        set_id: i64,
        due: Vec<Flashcard>,
        max_reviews_per_card: u32,
    ) -> Self {
        let cards: Vec<_> = due.into_iter().map(SessionCard::new).collect();
        let indices: Vec<usize> = (0..cards.len()).collect();

        Self {
            user_id: user_id.to_string(),
            set_id,
            cards,
            current_round: indices,
            current_index: 0,
            round_number: 1,
            max_reviews_per_card: max_reviews_per_card.max(1),
        }
    }

    pub fn current_card(&self) -> Option<&Flashcard> {
        self.current_round
            .get(self.current_index)
            .and_then(|&idx| self.cards.get(idx))
            .map(|card| &card.flashcard)
    }

    /// Grades the current card, reschedules it and moves on.
    ///
    /// If the scheduler rejects the review the session does not advance.
    pub fn grade_current<S, C>(&mut self, scheduler: &Scheduler<S, C>, grade: Grade) -> Result<Option<ReviewOutcome>>
    where
        S: ProgressStore + CardCatalog,
        C: Clock,
    {
        let Some(&idx) = self.current_round.get(self.current_index) else {
            return Ok(None);
        };
        let Some(card) = self.cards.get_mut(idx) else {
            return Ok(None);
        };

        let outcome = scheduler.submit_review(&self.user_id, card.flashcard.id, grade)?;
        card.record(grade);

        self.advance();
        Ok(Some(outcome))
    }

    fn advance(&mut self) {
        if self.current_index + 1 < self.current_round.len() {
            self.current_index += 1;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards that still need work.
    /// If none remain the session is complete.
    fn start_next_round(&mut self) {
        let mut repeat: Vec<usize> = self
            .current_round
            .iter()
            .copied()
            .filter(|&idx| {
                self.cards
                    .get(idx)
                    .is_some_and(|card| card.needs_repeat() && card.reviews < self.max_reviews_per_card)
            })
            .collect();
        repeat.sort_by_key(|&idx| {
            let card = &self.cards[idx];
            (Reverse(card.struggle), card.flashcard.id)
        });

        self.current_round = repeat;
        self.current_index = 0;
        if !self.current_round.is_empty() {
            self.round_number += 1;
        }
    }

    pub fn is_completed(&self) -> bool {
        self.current_round.is_empty()
    }

    /// Cards left in the current round, including the current one.
    pub fn remaining_count(&self) -> usize {
        self.current_round.len().saturating_sub(self.current_index)
    }

    pub fn total_reviews(&self) -> u32 {
        self.cards.iter().map(|card| card.reviews).sum()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.current_round.len())
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number,
                self.current_round.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::MemoryStore;
    use crate::models::{CardContent, SetDocument};
    use chrono::NaiveDate;

    fn scheduler_with_cards(count: usize) -> (Scheduler<MemoryStore, FixedClock>, i64) {
        let store = MemoryStore::new();
        let document = SetDocument {
            title: "Session".to_string(),
            description: String::new(),
            flashcards: (0..count)
                .map(|i| CardContent {
                    front: format!("q{}", i),
                    back: format!("a{}", i),
                })
                .collect(),
        };
        let set = store.import_set("owner", &document).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        (Scheduler::new(store, FixedClock(today)), set.id)
    }

    #[test]
    fn test_all_good_completes_in_one_round() {
        let (scheduler, set_id) = scheduler_with_cards(3);
        let mut session = StudySession::start(&scheduler, "u", set_id, 5).unwrap();
        assert_eq!(session.remaining_count(), 3);
        assert_eq!(session.phase_message(), "Round 1: 3 cards");

        while !session.is_completed() {
            session.grade_current(&scheduler, Grade::Good).unwrap();
        }
        assert_eq!(session.round_number, 1);
        assert_eq!(session.total_reviews(), 3);
        assert!(session.current_card().is_none());

        // Nothing left to study today
        assert!(scheduler.due_today("u", set_id).unwrap().is_empty());
    }

    #[test]
    fn test_failed_cards_repeat() {
        let (scheduler, set_id) = scheduler_with_cards(3);
        let mut session = StudySession::start(&scheduler, "u", set_id, 5).unwrap();
        let first_id = session.current_card().unwrap().id;

        session.grade_current(&scheduler, Grade::Again).unwrap();
        session.grade_current(&scheduler, Grade::Easy).unwrap();
        session.grade_current(&scheduler, Grade::Hard).unwrap();

        assert!(!session.is_completed());
        assert_eq!(session.round_number, 2);
        assert_eq!(session.remaining_count(), 2);
        assert_eq!(session.current_card().unwrap().id, first_id);
        assert!(session.phase_message().contains("Review"));

        session.grade_current(&scheduler, Grade::Good).unwrap();
        session.grade_current(&scheduler, Grade::Good).unwrap();
        assert!(session.is_completed());
        assert_eq!(session.total_reviews(), 5);
    }

    #[test]
    fn test_most_struggled_cards_retry_first() {
        let (scheduler, set_id) = scheduler_with_cards(3);
        let mut session = StudySession::start(&scheduler, "u", set_id, 5).unwrap();
        let ids: Vec<i64> = session.cards.iter().map(|card| card.flashcard.id).collect();

        session.grade_current(&scheduler, Grade::Hard).unwrap();
        session.grade_current(&scheduler, Grade::Again).unwrap();
        session.grade_current(&scheduler, Grade::Again).unwrap();

        // Again (+3) ahead of Hard (+2); equal scores keep card id order
        let round: Vec<i64> = session
            .current_round
            .iter()
            .map(|&idx| session.cards[idx].flashcard.id)
            .collect();
        assert_eq!(round, vec![ids[1], ids[2], ids[0]]);
        assert_eq!(session.current_card().unwrap().id, ids[1]);
    }

    #[test]
    fn test_struggle_tracks_grades() {
        let (scheduler, set_id) = scheduler_with_cards(2);
        let mut session = StudySession::start(&scheduler, "u", set_id, 5).unwrap();

        session.grade_current(&scheduler, Grade::Again).unwrap();
        session.grade_current(&scheduler, Grade::Easy).unwrap();
        assert_eq!(session.cards[0].struggle, 3);
        assert_eq!(session.cards[1].struggle, -2);

        session.grade_current(&scheduler, Grade::Good).unwrap();
        assert_eq!(session.cards[0].struggle, 2);
        assert!(session.is_completed());
    }

    #[test]
    fn test_repeat_cap() {
        let (scheduler, set_id) = scheduler_with_cards(1);
        let mut session = StudySession::start(&scheduler, "u", set_id, 3).unwrap();

        let mut graded = 0;
        while !session.is_completed() {
            session.grade_current(&scheduler, Grade::Again).unwrap();
            graded += 1;
        }
        assert_eq!(graded, 3);
        assert_eq!(session.round_number, 3);
    }

    #[test]
    fn test_empty_session() {
        let (scheduler, set_id) = scheduler_with_cards(0);
        let mut session = StudySession::start(&scheduler, "u", set_id, 5).unwrap();
        assert!(session.is_completed());
        assert!(session.grade_current(&scheduler, Grade::Good).unwrap().is_none());
    }
}
