//! Flashcard is a pair <front, back> belonging to a flashcard set.
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: i64,
    pub set_id: i64,
    pub front: String,
    pub back: String,
}

/// Card content without identity, as it appears in import/export documents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardContent {
    pub front: String,
    pub back: String,
}

impl From<&Flashcard> for CardContent {
    fn from(card: &Flashcard) -> Self {
        Self {
            front: card.front.clone(),
            back: card.back.clone(),
        }
    }
}
