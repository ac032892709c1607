//! Traits every stored entity type implements

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

/// A lookup key. Backends index by the string form, so two keys that
/// render to the same string address the same row.
pub trait StorageKey: Clone + Debug + Send + Sync + Eq + std::hash::Hash {
    fn as_str(&self) -> &str;
}

/// A value that can live in a [`Storage`](super::Storage) backend.
/// Entities are serialized whole; the key is carried inside the entity
/// and exposed through [`StorageEntity::key`].
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    type Key: StorageKey;

    fn key(&self) -> &Self::Key;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    struct NoteId(String);

    impl StorageKey for NoteId {
        fn as_str(&self) -> &str {
            &self.0
        }
    }

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    struct Note {
        id: NoteId,
        body: String,
    }

    impl StorageEntity for Note {
        type Key = NoteId;

        fn key(&self) -> &Self::Key {
            &self.id
        }
    }

    #[test]
    fn test_key_string_form() {
        let note = Note {
            id: NoteId("note-7".to_string()),
            body: "hello".to_string(),
        };

        assert_eq!(note.key().as_str(), "note-7");
        assert_eq!(NoteId("x".to_string()).as_str(), "x");
    }
}
