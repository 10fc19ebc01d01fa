pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;
pub mod scheduler;

pub use clock::{Clock, FixedClock, UtcClock};
pub use error::{Result, SchedulerError};
pub use models::{CardProgress, Flashcard, FlashcardSet, Grade, SetDocument, StudySession};
pub use scheduler::{ReviewOutcome, Scheduler, SetProgress};
