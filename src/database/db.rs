//! SQLite-backed storage for flashcard sets and review progress
//!
//! Handles schema initialization, seeding helpers for sets and flashcards,
//! and version-checked writes of SM-2 progress rows.

use super::store::{CardCatalog, ProgressStore};
use crate::error::{Result, SchedulerError};
use crate::models::{CardProgress, Flashcard, FlashcardSet, SetDocument};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const PROGRESS_COLUMNS: &str = "user_id, card_id, easiness_factor, repetitions, interval_days, \
                                next_review_date, updated_at, version";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and makes sure all tables exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened flashcard database");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SchedulerError::StoreUnavailable("database connection lock poisoned".into()))
    }

    /// Creates an empty flashcard set owned by `owner_id`
    pub fn create_set(&self, owner_id: &str, title: &str, description: &str) -> Result<FlashcardSet> {
        let conn = self.conn()?;
        let set = insert_set(&conn, owner_id, title, description)?;
        info!(set_id = set.id, title, "flashcard set created");
        Ok(set)
    }

    /// Adds a flashcard to an existing set and returns it with its new ID
    pub fn add_flashcard(&self, set_id: i64, front: &str, back: &str) -> Result<Flashcard> {
        let conn = self.conn()?;
        insert_flashcard(&conn, set_id, front, back)
    }

    /// Stores a whole set document in one transaction
    pub fn import_set(&self, owner_id: &str, document: &SetDocument) -> Result<FlashcardSet> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let set = insert_set(&tx, owner_id, &document.title, &document.description)?;
        for card in &document.flashcards {
            insert_flashcard(&tx, set.id, &card.front, &card.back)?;
        }
        tx.commit()?;

        info!(
            set_id = set.id,
            cards = document.flashcards.len(),
            "flashcard set imported"
        );
        Ok(set)
    }

    pub fn get_set(&self, set_id: i64) -> Result<FlashcardSet> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, title, description, owner_id FROM flashcard_sets WHERE id = ?1",
            params![set_id],
            set_from_row,
        )
        .optional()?
        .ok_or_else(|| SchedulerError::NotFound(format!("flashcard set {}", set_id)))
    }

    /// Retrieves all sets, oldest first
    pub fn list_sets(&self) -> Result<Vec<FlashcardSet>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, title, description, owner_id FROM flashcard_sets ORDER BY id")?;
        let sets = stmt
            .query_map([], set_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sets)
    }

    /// Set metadata plus its cards in portable form
    pub fn set_document(&self, set_id: i64) -> Result<SetDocument> {
        let set = self.get_set(set_id)?;
        let cards = self.cards_in_set(set_id)?;
        Ok(SetDocument {
            title: set.title,
            description: set.description,
            flashcards: cards.iter().map(Into::into).collect(),
        })
    }
}

/// Creates tables for sets, flashcards and per-user SM-2 progress.
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS flashcard_sets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            owner_id TEXT NOT NULL
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS flashcards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            set_id INTEGER NOT NULL,
            front TEXT NOT NULL,
            back TEXT NOT NULL,
            FOREIGN KEY (set_id) REFERENCES flashcard_sets(id) ON DELETE CASCADE
        )",
        (),
    )?;

    // One row per (user, card) once the card has been reviewed
    conn.execute(
        "CREATE TABLE IF NOT EXISTS card_progress (
            user_id TEXT NOT NULL,
            card_id INTEGER NOT NULL,
            easiness_factor REAL NOT NULL DEFAULT 2.5 CHECK (easiness_factor >= 1.3),
            repetitions INTEGER NOT NULL DEFAULT 0 CHECK (repetitions >= 0),
            interval_days INTEGER NOT NULL DEFAULT 0 CHECK (interval_days >= 0),
            next_review_date TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user_id, card_id),
            FOREIGN KEY (card_id) REFERENCES flashcards(id) ON DELETE CASCADE
        )",
        (),
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_flashcards_set_id ON flashcards(set_id)",
        (),
    )?;

    Ok(())
}

fn insert_set(conn: &Connection, owner_id: &str, title: &str, description: &str) -> Result<FlashcardSet> {
    conn.execute(
        "INSERT INTO flashcard_sets (title, description, owner_id) VALUES (?1, ?2, ?3)",
        params![title, description, owner_id],
    )?;
    Ok(FlashcardSet {
        id: conn.last_insert_rowid(),
        title: title.to_string(),
        description: description.to_string(),
        owner_id: owner_id.to_string(),
    })
}

fn insert_flashcard(conn: &Connection, set_id: i64, front: &str, back: &str) -> Result<Flashcard> {
    conn.execute(
        "INSERT INTO flashcards (set_id, front, back) VALUES (?1, ?2, ?3)",
        params![set_id, front, back],
    )
    .map_err(|err| not_found_on_foreign_key(err, || format!("flashcard set {}", set_id)))?;

    Ok(Flashcard {
        id: conn.last_insert_rowid(),
        set_id,
        front: front.to_string(),
        back: back.to_string(),
    })
}

fn set_from_row(row: &Row<'_>) -> rusqlite::Result<FlashcardSet> {
    Ok(FlashcardSet {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        owner_id: row.get(3)?,
    })
}

fn progress_from_row(row: &Row<'_>) -> rusqlite::Result<CardProgress> {
    Ok(CardProgress {
        user_id: row.get(0)?,
        card_id: row.get(1)?,
        easiness_factor: row.get(2)?,
        repetitions: row.get(3)?,
        interval: row.get(4)?,
        next_review_date: row.get(5)?,
        updated_at: row.get(6)?,
        version: row.get(7)?,
    })
}

/// A foreign key violation means the referenced set or card does not exist.
fn not_found_on_foreign_key(err: rusqlite::Error, what: impl FnOnce() -> String) -> SchedulerError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            SchedulerError::NotFound(what())
        }
        _ => SchedulerError::StorageFailure(err),
    }
}

impl ProgressStore for SqliteStore {
    fn load_progress(&self, user_id: &str, card_id: i64) -> Result<Option<CardProgress>> {
        let conn = self.conn()?;
        let progress = conn
            .query_row(
                &format!(
                    "SELECT {} FROM card_progress WHERE user_id = ?1 AND card_id = ?2",
                    PROGRESS_COLUMNS
                ),
                params![user_id, card_id],
                progress_from_row,
            )
            .optional()?;
        Ok(progress)
    }

    fn load_progress_for_cards(&self, user_id: &str, card_ids: &[i64]) -> Result<Vec<CardProgress>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM card_progress WHERE user_id = ?1 AND card_id = ?2",
            PROGRESS_COLUMNS
        ))?;

        let mut found = Vec::new();
        for &card_id in card_ids {
            if let Some(progress) = stmt
                .query_row(params![user_id, card_id], progress_from_row)
                .optional()?
            {
                found.push(progress);
            }
        }
        Ok(found)
    }

    fn save_progress(&self, progress: &CardProgress, expected_version: Option<i64>) -> Result<()> {
        let conn = self.conn()?;

        let changed = match expected_version {
            // First review: insert unless someone else got there first
            None => conn
                .execute(
                    &format!(
                        "INSERT INTO card_progress ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                         ON CONFLICT (user_id, card_id) DO NOTHING",
                        PROGRESS_COLUMNS
                    ),
                    params![
                        progress.user_id,
                        progress.card_id,
                        progress.easiness_factor,
                        progress.repetitions,
                        progress.interval,
                        progress.next_review_date,
                        progress.updated_at,
                        progress.version
                    ],
                )
                .map_err(|err| not_found_on_foreign_key(err, || format!("flashcard {}", progress.card_id)))?,
            Some(expected) => conn.execute(
                "UPDATE card_progress
                 SET easiness_factor = ?3, repetitions = ?4, interval_days = ?5,
                     next_review_date = ?6, updated_at = ?7, version = ?8
                 WHERE user_id = ?1 AND card_id = ?2 AND version = ?9",
                params![
                    progress.user_id,
                    progress.card_id,
                    progress.easiness_factor,
                    progress.repetitions,
                    progress.interval,
                    progress.next_review_date,
                    progress.updated_at,
                    progress.version,
                    expected
                ],
            )?,
        };

        if changed == 0 {
            // The card (and its progress) may have been deleted since the load
            let card_exists = conn
                .query_row(
                    "SELECT 1 FROM flashcards WHERE id = ?1",
                    params![progress.card_id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !card_exists {
                return Err(SchedulerError::NotFound(format!("flashcard {}", progress.card_id)));
            }
            return Err(SchedulerError::Conflict {
                user_id: progress.user_id.clone(),
                card_id: progress.card_id,
            });
        }

        debug!(
            user_id = %progress.user_id,
            card_id = progress.card_id,
            version = progress.version,
            "progress saved"
        );
        Ok(())
    }
}

impl CardCatalog for SqliteStore {
    fn cards_in_set(&self, set_id: i64) -> Result<Vec<Flashcard>> {
        let conn = self.conn()?;

        let exists = conn
            .query_row(
                "SELECT 1 FROM flashcard_sets WHERE id = ?1",
                params![set_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(SchedulerError::NotFound(format!("flashcard set {}", set_id)));
        }

        let mut stmt =
            conn.prepare("SELECT id, set_id, front, back FROM flashcards WHERE set_id = ?1 ORDER BY id")?;
        let cards = stmt
            .query_map(params![set_id], |row| {
                Ok(Flashcard {
                    id: row.get(0)?,
                    set_id: row.get(1)?,
                    front: row.get(2)?,
                    back: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(cards)
    }
}
