pub mod card_progress;
pub mod flashcard;
pub mod flashcard_set;
pub mod grade;
pub mod sm2;
pub mod study_session;

pub use card_progress::CardProgress;
pub use flashcard::{CardContent, Flashcard};
pub use flashcard_set::{FlashcardSet, SetDocument};
pub use grade::Grade;
pub use study_session::StudySession;
