//! JSON import/export module for flashcard sets.
//! Provides functionality to save and load SetDocument structures to/from JSON files.

use crate::error::Result;
use crate::models::SetDocument;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

/// Exports a set document to a JSON file at the specified path.
/// Returns an error if file creation or writing fails.
pub fn export_set_to_path(document: &SetDocument, path: impl AsRef<Path>) -> Result<()> {
    let json_string = serde_json::to_string_pretty(document)?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(json_string.as_bytes())?;
    info!(title = %document.title, path = %path.as_ref().display(), "set exported");
    Ok(())
}

/// Imports a set document from a JSON file.
/// Returns an error if the file doesn't exist or contains invalid JSON.
pub fn import_set_file(path: impl AsRef<Path>) -> Result<SetDocument> {
    let mut file = File::open(path.as_ref())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let document: SetDocument = serde_json::from_str(&contents)?;

    info!(title = %document.title, path = %path.as_ref().display(), "set read from file");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchedulerError;
    use crate::models::CardContent;
    use std::fs;

    fn create_test_document() -> SetDocument {
        SetDocument {
            title: "Test Set".to_string(),
            description: "Chinese basics".to_string(),
            flashcards: vec![
                CardContent {
                    front: "你好".to_string(),
                    back: "hello".to_string(),
                },
                CardContent {
                    front: "再见".to_string(),
                    back: "goodbye".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_export_set_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");

        export_set_to_path(&create_test_document(), &path).unwrap();
        assert!(fs::metadata(&path).is_ok(), "File should exist");
    }

    #[test]
    fn test_import_set_file() {
        let json_content = r#"{
  "title": "Import Test Set",
  "flashcards": [
    {
      "front": "test front",
      "back": "test back"
    }
  ]
}"#;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        fs::write(&path, json_content).unwrap();

        let document = import_set_file(&path).unwrap();
        assert_eq!(document.title, "Import Test Set");
        assert_eq!(document.description, "");
        assert_eq!(document.flashcards.len(), 1);
        assert_eq!(document.flashcards[0].front, "test front");
        assert_eq!(document.flashcards[0].back, "test back");
    }

    #[test]
    fn test_export_then_import_preserves_cards() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.json");

        export_set_to_path(&create_test_document(), &path).unwrap();
        assert_eq!(import_set_file(&path).unwrap(), create_test_document());
    }

    #[test]
    fn test_import_nonexistent_file() {
        let result = import_set_file("nonexistent_file_xyz123.json");
        assert!(matches!(result, Err(SchedulerError::Io(_))));
    }

    #[test]
    fn test_import_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        assert!(matches!(import_set_file(&path), Err(SchedulerError::Json(_))));
    }
}
