//! Last-used model and the bounded translation history.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::KeyValueStore;

const LAST_MODEL_KEY: &str = "lastModelId";
const HISTORY_KEY: &str = "translationHistory";

/// Maximum number of history entries kept, newest first.
pub const HISTORY_LIMIT: usize = 10;

/// A translation as the caller describes it, before it is stamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHistoryEntry {
    pub source_text: String,
    pub translated_text: String,
    pub model_id: String,
    pub source_lang: String,
    pub target_lang: String,
}

/// A persisted history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub source_text: String,
    pub translated_text: String,
    pub model_id: String,
    pub source_lang: String,
    pub target_lang: String,
    /// RFC 3339 time the entry was saved.
    pub timestamp: String,
}

/// Typed view over the preference keys of a [`KeyValueStore`].
#[derive(Clone)]
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
}

impl PreferenceStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Remember the model the user picked. Any string is accepted.
    pub fn save_last_used_model(&self, model_id: &str) -> Result<()> {
        self.store.set(LAST_MODEL_KEY, model_id)
    }

    pub fn last_used_model(&self) -> Option<String> {
        self.store.get(LAST_MODEL_KEY)
    }

    /// Prepend `entry` to the history, stamped with the current time, and
    /// keep only the [`HISTORY_LIMIT`] most recent entries.
    pub fn save_translation_history(&self, entry: NewHistoryEntry) -> Result<()> {
        let mut history = self.translation_history();
        history.insert(
            0,
            HistoryEntry {
                source_text: entry.source_text,
                translated_text: entry.translated_text,
                model_id: entry.model_id,
                source_lang: entry.source_lang,
                target_lang: entry.target_lang,
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        );
        history.truncate(HISTORY_LIMIT);

        let json = serde_json::to_string(&history).context("failed to serialize history")?;
        self.store.set(HISTORY_KEY, &json)
    }

    /// The persisted history, newest first. Absent or corrupt data reads as
    /// an empty history.
    pub fn translation_history(&self) -> Vec<HistoryEntry> {
        self.store
            .get(HISTORY_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    pub fn clear_translation_history(&self) -> Result<()> {
        self.store.remove(HISTORY_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn entry(text: &str) -> NewHistoryEntry {
        NewHistoryEntry {
            source_text: text.to_string(),
            translated_text: format!("[{text}]"),
            model_id: "english_snejag_translator".to_string(),
            source_lang: "English".to_string(),
            target_lang: "Snejag".to_string(),
        }
    }

    fn prefs() -> (Arc<MemoryStore>, PreferenceStore) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), PreferenceStore::new(store))
    }

    #[test]
    fn last_used_model_round_trips() {
        let (_, prefs) = prefs();
        assert_eq!(prefs.last_used_model(), None);
        prefs.save_last_used_model("m1").unwrap();
        prefs.save_last_used_model("m2").unwrap();
        assert_eq!(prefs.last_used_model().as_deref(), Some("m2"));
    }

    #[test]
    fn history_is_newest_first_and_bounded() {
        let (_, prefs) = prefs();
        for i in 0..12 {
            prefs.save_translation_history(entry(&format!("t{i}"))).unwrap();
        }
        let history = prefs.translation_history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].source_text, "t11");
        assert_eq!(history[9].source_text, "t2");
    }

    #[test]
    fn corrupt_history_reads_as_empty_and_is_replaced() {
        let (store, prefs) = prefs();
        store.set(HISTORY_KEY, "[{\"broken\"").unwrap();
        assert!(prefs.translation_history().is_empty());

        prefs.save_translation_history(entry("Hello")).unwrap();
        assert_eq!(prefs.translation_history().len(), 1);
    }

    #[test]
    fn history_uses_camel_case_keys() {
        let (store, prefs) = prefs();
        prefs.save_translation_history(entry("Hello")).unwrap();
        let raw = store.get(HISTORY_KEY).unwrap();
        assert!(raw.contains("\"sourceText\":\"Hello\""));
        assert!(raw.contains("\"timestamp\""));
    }

    #[test]
    fn clear_history_empties() {
        let (_, prefs) = prefs();
        prefs.save_translation_history(entry("Hello")).unwrap();
        prefs.clear_translation_history().unwrap();
        assert!(prefs.translation_history().is_empty());
    }
}
