/// Persistence tests for the preference and correction stores.
///
/// File-backed stores live in a temporary directory; relay behavior is
/// checked with a recording relay so no network is involved.
use std::sync::{Arc, Mutex};

use transctl::storage::{
    CorrectionRelay, CorrectionStore, FileStore, KeyValueStore, MemoryStore, NewCorrection,
    NewHistoryEntry, PreferenceStore,
};

fn entry(n: usize) -> NewHistoryEntry {
    NewHistoryEntry {
        source_text: format!("texto {n}"),
        translated_text: format!("text {n}"),
        model_id: "pt-en".to_string(),
        source_lang: "pt".to_string(),
        target_lang: "en".to_string(),
    }
}

fn correction(corrected: &str) -> NewCorrection {
    NewCorrection {
        source_text: "bom dia".to_string(),
        original_translation: "good day".to_string(),
        corrected_translation: corrected.to_string(),
        model_id: "pt-en".to_string(),
        source_lang: "pt".to_string(),
        target_lang: "en".to_string(),
    }
}

#[derive(Default)]
struct RecordingRelay {
    sent: Mutex<Vec<NewCorrection>>,
}

impl CorrectionRelay for RecordingRelay {
    fn send_correction(&self, correction: &NewCorrection) -> anyhow::Result<serde_json::Value> {
        self.sent.lock().unwrap().push(correction.clone());
        Ok(serde_json::json!({"success": true}))
    }
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

#[test]
fn history_is_bounded_and_newest_first() {
    let prefs = PreferenceStore::new(Arc::new(MemoryStore::new()));
    for n in 0..13 {
        prefs.save_translation_history(entry(n)).unwrap();
    }

    let history = prefs.translation_history();
    assert_eq!(history.len(), 10);
    assert_eq!(history[0].source_text, "texto 12");
    assert_eq!(history[9].source_text, "texto 3");
}

#[test]
fn history_survives_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("storage.json");

    {
        let prefs = PreferenceStore::new(Arc::new(FileStore::new(&path)));
        prefs.save_last_used_model("pt-en").unwrap();
        prefs.save_translation_history(entry(1)).unwrap();
        prefs.save_translation_history(entry(2)).unwrap();
    }

    let reopened = PreferenceStore::new(Arc::new(FileStore::new(&path)));
    assert_eq!(reopened.last_used_model().as_deref(), Some("pt-en"));
    let history = reopened.translation_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].translated_text, "text 2");
    assert_eq!(history[1].translated_text, "text 1");
    assert!(!history[0].timestamp.is_empty());
}

#[test]
fn corrupt_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "{not json").unwrap();

    let store = Arc::new(FileStore::new(&path));
    assert!(store.keys().is_empty());
    let prefs = PreferenceStore::new(store.clone());
    assert!(prefs.translation_history().is_empty());

    // The next write replaces the corrupt file.
    prefs.save_last_used_model("en-pt").unwrap();
    assert_eq!(store.keys(), vec!["lastModelId".to_string()]);
}

#[test]
fn clearing_history_keeps_last_model() {
    let prefs = PreferenceStore::new(Arc::new(MemoryStore::new()));
    prefs.save_last_used_model("pt-en").unwrap();
    prefs.save_translation_history(entry(1)).unwrap();
    prefs.clear_translation_history().unwrap();

    assert!(prefs.translation_history().is_empty());
    assert_eq!(prefs.last_used_model().as_deref(), Some("pt-en"));
}

// ---------------------------------------------------------------------------
// Corrections
// ---------------------------------------------------------------------------

#[test]
fn repeated_key_overwrites_correction() {
    let store = CorrectionStore::local(Arc::new(MemoryStore::new()));
    store.save_correction(correction("good morning")).unwrap();
    store.save_correction(correction("morning!")).unwrap();

    let all = store.all_corrections();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].corrected_translation, "morning!");
    assert!(store.has_correction_for("pt-en", "bom dia"));
    assert!(!store.has_correction_for("en-pt", "bom dia"));
}

#[test]
fn offline_save_never_relays() {
    let relay = Arc::new(RecordingRelay::default());
    let store = CorrectionStore::with_relay(Arc::new(MemoryStore::new()), relay.clone(), false);

    let handle = store.save_correction(correction("good morning")).unwrap();
    assert!(handle.is_none());
    assert!(relay.sent.lock().unwrap().is_empty());
    assert!(store.get_correction("pt-en", "bom dia").is_some());
}

#[test]
fn online_save_relays_in_background() {
    let relay = Arc::new(RecordingRelay::default());
    let store = CorrectionStore::with_relay(Arc::new(MemoryStore::new()), relay.clone(), true);

    let handle = store
        .save_correction(correction("good morning"))
        .unwrap()
        .expect("relay should start when online");
    let reply = handle.wait().unwrap();

    assert_eq!(reply["success"], true);
    let sent = relay.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].corrected_translation, "good morning");
}

#[test]
fn corrections_persist_in_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    CorrectionStore::local(Arc::new(FileStore::new(&path)))
        .save_correction(correction("good morning"))
        .unwrap();

    let record = CorrectionStore::local(Arc::new(FileStore::new(&path)))
        .get_correction("pt-en", "bom dia")
        .unwrap();
    assert_eq!(record.original_translation, "good day");
    assert!(record.timestamp.ends_with('Z'));
}
