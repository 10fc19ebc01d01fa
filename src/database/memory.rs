//! In-process store with the same contract as the SQLite one.

use super::store::{CardCatalog, ProgressStore};
use crate::error::{Result, SchedulerError};
use crate::models::{CardProgress, Flashcard, FlashcardSet, SetDocument};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    sets: BTreeMap<i64, FlashcardSet>,
    cards: BTreeMap<i64, Flashcard>,
    progress: HashMap<(String, i64), CardProgress>,
    next_set_id: i64,
    next_card_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| SchedulerError::StoreUnavailable("memory store lock poisoned".into()))
    }

    pub fn import_set(&self, owner_id: &str, document: &SetDocument) -> Result<FlashcardSet> {
        let mut state = self.state()?;

        state.next_set_id += 1;
        let set = FlashcardSet {
            id: state.next_set_id,
            title: document.title.clone(),
            description: document.description.clone(),
            owner_id: owner_id.to_string(),
        };
        state.sets.insert(set.id, set.clone());

        for content in &document.flashcards {
            state.next_card_id += 1;
            let card = Flashcard {
                id: state.next_card_id,
                set_id: set.id,
                front: content.front.clone(),
                back: content.back.clone(),
            };
            state.cards.insert(card.id, card);
        }

        Ok(set)
    }
}

impl ProgressStore for MemoryStore {
    fn load_progress(&self, user_id: &str, card_id: i64) -> Result<Option<CardProgress>> {
        let state = self.state()?;
        Ok(state.progress.get(&(user_id.to_string(), card_id)).cloned())
    }

    fn save_progress(&self, progress: &CardProgress, expected_version: Option<i64>) -> Result<()> {
        let mut state = self.state()?;

        if !state.cards.contains_key(&progress.card_id) {
            return Err(SchedulerError::NotFound(format!("flashcard {}", progress.card_id)));
        }

        let key = (progress.user_id.clone(), progress.card_id);
        let current_version = state.progress.get(&key).map(|p| p.version);
        if current_version != expected_version {
            return Err(SchedulerError::Conflict {
                user_id: progress.user_id.clone(),
                card_id: progress.card_id,
            });
        }

        state.progress.insert(key, progress.clone());
        Ok(())
    }
}

impl CardCatalog for MemoryStore {
    fn cards_in_set(&self, set_id: i64) -> Result<Vec<Flashcard>> {
        let state = self.state()?;
        if !state.sets.contains_key(&set_id) {
            return Err(SchedulerError::NotFound(format!("flashcard set {}", set_id)));
        }
        Ok(state
            .cards
            .values()
            .filter(|card| card.set_id == set_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardContent;
    use chrono::{NaiveDate, Utc};

    fn one_card_store() -> (MemoryStore, i64) {
        let store = MemoryStore::new();
        let document = SetDocument {
            flashcards: vec![CardContent {
                front: "猫".to_string(),
                back: "cat".to_string(),
            }],
            ..SetDocument::default()
        };
        let set = store.import_set("owner", &document).unwrap();
        let card_id = store.cards_in_set(set.id).unwrap()[0].id;
        (store, card_id)
    }

    fn progress(card_id: i64, version: i64) -> CardProgress {
        CardProgress {
            user_id: "user-1".to_string(),
            card_id,
            easiness_factor: 2.5,
            repetitions: 0,
            interval: 1,
            next_review_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            updated_at: Utc::now(),
            version,
        }
    }

    #[test]
    fn test_version_checked_saves() {
        let (store, card_id) = one_card_store();

        store.save_progress(&progress(card_id, 0), None).unwrap();
        assert!(matches!(
            store.save_progress(&progress(card_id, 0), None),
            Err(SchedulerError::Conflict { .. })
        ));
        store.save_progress(&progress(card_id, 1), Some(0)).unwrap();
        assert!(matches!(
            store.save_progress(&progress(card_id, 2), Some(0)),
            Err(SchedulerError::Conflict { .. })
        ));

        assert_eq!(store.load_progress("user-1", card_id).unwrap().unwrap().version, 1);
    }

    #[test]
    fn test_poisoned_lock_reports_store_unavailable() {
        let (store, card_id) = one_card_store();

        let poisoner = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _state = store.state.lock().unwrap();
                    panic!("writer died holding the lock");
                })
                .join()
        });
        assert!(poisoner.is_err());

        let err = store.load_progress("user-1", card_id).unwrap_err();
        assert!(matches!(err, SchedulerError::StoreUnavailable(_)));
        assert!(err.is_storage_failure());
        assert!(matches!(
            store.save_progress(&progress(card_id, 0), None),
            Err(SchedulerError::StoreUnavailable(_))
        ));
    }

    #[test]
    fn test_unknown_card_and_set() {
        let (store, card_id) = one_card_store();
        assert!(matches!(
            store.save_progress(&progress(card_id + 1, 0), None),
            Err(SchedulerError::NotFound(_))
        ));
        assert!(matches!(store.cards_in_set(99), Err(SchedulerError::NotFound(_))));
    }
}
