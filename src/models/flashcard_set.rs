//! Flashcard sets and their portable JSON form
use super::CardContent;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlashcardSet {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub owner_id: String,
}

/// A set with its cards, detached from any store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetDocument {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub flashcards: Vec<CardContent>,
}

impl Default for SetDocument {
    fn default() -> Self {
        Self {
            title: "My Set".to_string(),
            description: String::new(),
            flashcards: Vec::new(),
        }
    }
}
