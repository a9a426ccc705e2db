//! One translation round trip with its side effects: timing into the
//! collector, the entry into history, and the model into `lastModelId`.

use anyhow::Result;

use crate::client::{ApiClient, ClientError, TranslateResponse};
use crate::metrics::sampler::{SharedCollector, lock};
use crate::metrics::now_ms;
use crate::storage::{NewHistoryEntry, PreferenceStore};

pub struct Translator {
    client: ApiClient,
    preferences: PreferenceStore,
    collector: Option<SharedCollector>,
}

impl Translator {
    pub fn new(client: ApiClient, preferences: PreferenceStore) -> Self {
        Self {
            client,
            preferences,
            collector: None,
        }
    }

    /// Record translation timings into `collector` as well.
    pub fn with_collector(mut self, collector: SharedCollector) -> Self {
        self.collector = Some(collector);
        self
    }

    /// Translate `text` with `model_id`. Application and transport failures
    /// come back as [`ClientError`] and leave history untouched.
    pub fn translate(&self, text: &str, model_id: &str) -> Result<TranslateResponse, ClientError> {
        let start = now_ms();
        let reply = self.client.translate(text, model_id)?;
        let end = now_ms();

        if let Some(collector) = &self.collector {
            lock(collector).record_translation_time(
                start,
                end,
                text.chars().count(),
                reply.translated_text.chars().count(),
                model_id,
            );
        }

        if let Err(e) = self.remember(text, model_id, &reply) {
            log::warn!("failed to persist translation history: {e:#}");
        }
        Ok(reply)
    }

    fn remember(&self, text: &str, model_id: &str, reply: &TranslateResponse) -> Result<()> {
        self.preferences.save_last_used_model(model_id)?;
        self.preferences.save_translation_history(NewHistoryEntry {
            source_text: text.to_string(),
            translated_text: reply.translated_text.clone(),
            model_id: model_id.to_string(),
            source_lang: reply.source_language.clone(),
            target_lang: reply.target_language.clone(),
        })
    }
}
