//! Persisted configuration documents.
//!
//! Two small JSON documents live under the store root:
//!
//! - `preferences.json`: user id to preset name
//! - `pronunciations.json`: word to phonetic replacement, seeded with example
//!   entries the first time it is read
//!
//! Every write is a whole-document read-modify-write followed by an atomic
//! replace. An in-process lock serializes writers so concurrent saves resolve
//! to last-write-wins without torn documents.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::core::markup::PronunciationReplacer;
use crate::core::params::find_preset;
use crate::errors::{AppError, AppResult};
use crate::utils::atomic_file::write_atomic;

pub const PREFERENCES_FILE: &str = "preferences.json";
pub const PRONUNCIATIONS_FILE: &str = "pronunciations.json";

/// Example entries written when the dictionary does not exist yet
const SEED_PRONUNCIATIONS: &[(&str, &str)] = &[
    ("API", "a pe i"),
    ("TTS", "te te ese"),
    ("URL", "u erre ele"),
    ("Wi-Fi", "uai fai"),
    ("email", "imeil"),
];

type Document = BTreeMap<String, String>;

pub struct ConfigStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // -------------------------------------------------------------------------
    // User preferences
    // -------------------------------------------------------------------------

    /// All stored user preferences
    pub async fn preferences(&self) -> AppResult<Document> {
        Ok(self.read_document(PREFERENCES_FILE).await?.unwrap_or_default())
    }

    /// Preset stored for `user_id`, if any
    pub async fn user_preset(&self, user_id: &str) -> AppResult<Option<String>> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Ok(None);
        }
        Ok(self.preferences().await?.remove(user_id))
    }

    /// Store `preset` for `user_id` and return the canonical preset name
    pub async fn set_user_preset(&self, user_id: &str, preset: &str) -> AppResult<String> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::InvalidRequest("user_id must not be empty".to_string()));
        }
        let preset = find_preset(preset)
            .ok_or_else(|| AppError::InvalidPreset(preset.to_string()))?
            .name
            .to_string();

        let _guard = self.write_lock.lock().await;
        let mut preferences = self.preferences().await?;
        preferences.insert(user_id.to_string(), preset.clone());
        self.write_document(PREFERENCES_FILE, &preferences).await?;

        info!(user_id = %user_id, preset = %preset, "Saved user preset");
        Ok(preset)
    }

    // -------------------------------------------------------------------------
    // Pronunciation dictionary
    // -------------------------------------------------------------------------

    /// The dictionary, seeding it on first access
    pub async fn pronunciations(&self) -> AppResult<Document> {
        if let Some(dictionary) = self.read_document(PRONUNCIATIONS_FILE).await? {
            return Ok(dictionary);
        }

        let _guard = self.write_lock.lock().await;
        self.pronunciations_locked().await
    }

    /// Read or seed the dictionary; the caller holds the write lock
    async fn pronunciations_locked(&self) -> AppResult<Document> {
        // Another writer may have seeded while we waited
        if let Some(dictionary) = self.read_document(PRONUNCIATIONS_FILE).await? {
            return Ok(dictionary);
        }

        let seed: Document = SEED_PRONUNCIATIONS
            .iter()
            .map(|(word, replacement)| (word.to_string(), replacement.to_string()))
            .collect();
        self.write_document(PRONUNCIATIONS_FILE, &seed).await?;

        info!(entries = seed.len(), "Seeded pronunciation dictionary");
        Ok(seed)
    }

    /// Insert or replace entries, returning the updated dictionary
    pub async fn upsert_pronunciations(&self, entries: Document) -> AppResult<Document> {
        if entries.keys().any(|word| word.trim().is_empty()) {
            return Err(AppError::InvalidRequest(
                "pronunciation keys must not be empty".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let mut dictionary = self.pronunciations_locked().await?;
        dictionary.extend(
            entries
                .into_iter()
                .map(|(word, replacement)| (word.trim().to_string(), replacement)),
        );
        self.write_document(PRONUNCIATIONS_FILE, &dictionary).await?;
        Ok(dictionary)
    }

    /// Remove one entry; returns whether it existed
    pub async fn remove_pronunciation(&self, word: &str) -> AppResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut dictionary = self.pronunciations_locked().await?;
        let removed = dictionary.remove(word.trim()).is_some();
        if removed {
            self.write_document(PRONUNCIATIONS_FILE, &dictionary).await?;
        }
        Ok(removed)
    }

    /// Compiled replacer for the current dictionary
    pub async fn pronunciation_replacer(&self) -> AppResult<PronunciationReplacer> {
        let dictionary = self.pronunciations().await?;
        PronunciationReplacer::new(&dictionary)
            .map_err(|e| AppError::Storage(format!("Invalid pronunciation dictionary: {e}")))
    }

    // -------------------------------------------------------------------------
    // Document I/O
    // -------------------------------------------------------------------------

    async fn read_document(&self, name: &str) -> AppResult<Option<Document>> {
        let path = self.root.join(name);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        let document = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Storage(format!("Failed to parse {}: {e}", path.display()))
        })?;
        Ok(Some(document))
    }

    async fn write_document(&self, name: &str, document: &Document) -> AppResult<()> {
        let path = self.root.join(name);
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|e| AppError::Storage(format!("Failed to encode {name}: {e}")))?;

        write_atomic(&path, &bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {e}", path.display())))?;

        debug!(path = %path.display(), "Wrote config document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_user_preset_roundtrip() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path());

        assert_eq!(store.user_preset("ana").await.unwrap(), None);

        let saved = store.set_user_preset("ana", "Calm").await.unwrap();
        assert_eq!(saved, "calm");
        assert_eq!(
            store.user_preset("ana").await.unwrap().as_deref(),
            Some("calm")
        );
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path());

        store.set_user_preset("ana", "calm").await.unwrap();
        store.set_user_preset("ana", "energetic").await.unwrap();
        store.set_user_preset("luis", "narrator").await.unwrap();

        let preferences = store.preferences().await.unwrap();
        assert_eq!(preferences.get("ana").map(String::as_str), Some("energetic"));
        assert_eq!(preferences.get("luis").map(String::as_str), Some("narrator"));
    }

    #[tokio::test]
    async fn test_unknown_preset_is_not_saved() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path());

        let result = store.set_user_preset("ana", "shouty").await;
        assert!(matches!(result, Err(AppError::InvalidPreset(_))));
        assert!(!dir.path().join(PREFERENCES_FILE).exists());
    }

    #[tokio::test]
    async fn test_empty_user_id() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path());

        assert!(matches!(
            store.set_user_preset("  ", "calm").await,
            Err(AppError::InvalidRequest(_))
        ));
        assert_eq!(store.user_preset("").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pronunciations_seeded_on_first_read() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let path = dir.path().join(PRONUNCIATIONS_FILE);
        assert!(!path.exists());

        let dictionary = store.pronunciations().await.unwrap();
        assert_eq!(dictionary.len(), SEED_PRONUNCIATIONS.len());
        assert_eq!(dictionary.get("API").map(String::as_str), Some("a pe i"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_existing_dictionary_is_not_reseeded() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(PRONUNCIATIONS_FILE),
            r#"{"GPU": "ge pe u"}"#,
        )
        .unwrap();
        let store = ConfigStore::new(dir.path());

        let dictionary = store.pronunciations().await.unwrap();
        assert_eq!(dictionary.len(), 1);
        assert_eq!(dictionary.get("GPU").map(String::as_str), Some("ge pe u"));
    }

    #[tokio::test]
    async fn test_upsert_and_remove_pronunciations() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path());

        let mut entries = BTreeMap::new();
        entries.insert(" GPU ".to_string(), "ge pe u".to_string());
        entries.insert("API".to_string(), "ei pi ai".to_string());
        let dictionary = store.upsert_pronunciations(entries).await.unwrap();

        assert_eq!(dictionary.get("GPU").map(String::as_str), Some("ge pe u"));
        assert_eq!(dictionary.get("API").map(String::as_str), Some("ei pi ai"));

        assert!(store.remove_pronunciation("GPU").await.unwrap());
        assert!(!store.remove_pronunciation("GPU").await.unwrap());
        assert!(!store.pronunciations().await.unwrap().contains_key("GPU"));
    }

    #[tokio::test]
    async fn test_blank_pronunciation_key_rejected() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path());

        let mut entries = BTreeMap::new();
        entries.insert("  ".to_string(), "nada".to_string());
        assert!(matches!(
            store.upsert_pronunciations(entries).await,
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_storage_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(PREFERENCES_FILE), "not json").unwrap();
        let store = ConfigStore::new(dir.path());

        assert!(matches!(
            store.user_preset("ana").await,
            Err(AppError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_replacer_uses_dictionary() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path());

        let replacer = store.pronunciation_replacer().await.unwrap();
        assert_eq!(replacer.apply("Motor TTS"), "Motor te te ese");
    }
}
