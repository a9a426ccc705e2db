//! User-submitted translation corrections.
//!
//! Corrections are upserted into a JSON object under the
//! `translationCorrections` key, keyed by `modelId:sourceText`. When the
//! connectivity flag is on, each save also relays the correction to the
//! server on a background thread. The relay is fire-and-forget: the local
//! write never waits for it and failures are only logged.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::KeyValueStore;

const CORRECTIONS_KEY: &str = "translationCorrections";
const FETCHED_KEY: &str = "fetchedCorrections";
const LAST_FETCH_KEY: &str = "lastCorrectionsFetch";

/// A correction as submitted by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCorrection {
    pub source_text: String,
    pub original_translation: String,
    pub corrected_translation: String,
    pub model_id: String,
    pub source_lang: String,
    pub target_lang: String,
}

/// A stored correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionRecord {
    pub source_text: String,
    pub original_translation: String,
    pub corrected_translation: String,
    pub model_id: String,
    pub source_lang: String,
    pub target_lang: String,
    /// RFC 3339 time of the latest save.
    pub timestamp: String,
}

/// A correction collected by the server, as returned by
/// `GET /api/corrections`. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteCorrection {
    /// Server-assigned id, a string or a number.
    pub id: serde_json::Value,
    pub timestamp: String,
    pub model_id: String,
    pub source_text: String,
    pub original_translation: String,
    pub corrected_translation: String,
    pub source_lang: String,
    pub target_lang: String,
}

impl RemoteCorrection {
    /// Key used to de-duplicate fetched corrections. Corrections without an
    /// id all share one key.
    pub fn id_key(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Destination for relayed corrections (`POST /api/corrections`).
pub trait CorrectionRelay: Send + Sync {
    fn send_correction(&self, correction: &NewCorrection) -> Result<serde_json::Value>;
}

/// Handle to an in-flight relay. Dropping it detaches the thread, which a
/// short-lived process will kill on exit.
#[derive(Debug)]
pub struct RelayHandle {
    reply: Receiver<Result<serde_json::Value>>,
}

impl RelayHandle {
    /// Block until the relay finishes and return the server's reply.
    pub fn wait(self) -> Result<serde_json::Value> {
        self.reply
            .recv()
            .map_err(|_| anyhow::anyhow!("correction relay thread exited without a reply"))?
    }

    /// Like [`wait`](Self::wait), but give up after `timeout`. `None` means
    /// the relay is still running.
    pub fn wait_timeout(self, timeout: Duration) -> Option<Result<serde_json::Value>> {
        match self.reply.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(anyhow::anyhow!(
                "correction relay thread exited without a reply"
            ))),
        }
    }
}

fn correction_key(model_id: &str, source_text: &str) -> String {
    format!("{model_id}:{source_text}")
}

/// Typed view over the corrections key of a [`KeyValueStore`].
#[derive(Clone)]
pub struct CorrectionStore {
    store: Arc<dyn KeyValueStore>,
    relay: Option<Arc<dyn CorrectionRelay>>,
    online: bool,
}

impl CorrectionStore {
    /// A store that never relays.
    pub fn local(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            relay: None,
            online: false,
        }
    }

    /// A store that relays through `relay` whenever `online` is true.
    pub fn with_relay(
        store: Arc<dyn KeyValueStore>,
        relay: Arc<dyn CorrectionRelay>,
        online: bool,
    ) -> Self {
        Self {
            store,
            relay: Some(relay),
            online,
        }
    }

    /// Upsert `correction` and, when online, start relaying it.
    ///
    /// Returns the relay handle when a relay was started.
    pub fn save_correction(&self, correction: NewCorrection) -> Result<Option<RelayHandle>> {
        let key = correction_key(&correction.model_id, &correction.source_text);
        let record = CorrectionRecord {
            source_text: correction.source_text.clone(),
            original_translation: correction.original_translation.clone(),
            corrected_translation: correction.corrected_translation.clone(),
            model_id: correction.model_id.clone(),
            source_lang: correction.source_lang.clone(),
            target_lang: correction.target_lang.clone(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let mut all = self.read_all();
        all.insert(key, record);
        let json = serde_json::to_string(&all).context("failed to serialize corrections")?;
        self.store.set(CORRECTIONS_KEY, &json)?;

        let Some(relay) = self.relay.clone().filter(|_| self.online) else {
            return Ok(None);
        };

        let (tx, reply) = mpsc::channel();
        thread::Builder::new()
            .name("transctl-relay".to_string())
            .spawn(move || {
                let result = relay.send_correction(&correction);
                match &result {
                    Ok(reply) => log::info!("correction relayed: {reply}"),
                    Err(e) => log::warn!("failed to relay correction: {e:#}"),
                }
                let _ = tx.send(result);
            })
            .context("failed to start correction relay")?;

        Ok(Some(RelayHandle { reply }))
    }

    pub fn get_correction(&self, model_id: &str, source_text: &str) -> Option<CorrectionRecord> {
        self.read_all().remove(&correction_key(model_id, source_text))
    }

    pub fn has_correction_for(&self, model_id: &str, source_text: &str) -> bool {
        self.read_all()
            .contains_key(&correction_key(model_id, source_text))
    }

    // -- Corrections pulled from the server --

    /// Corrections pulled from the server, in arrival order.
    pub fn fetched_corrections(&self) -> Vec<RemoteCorrection> {
        self.store
            .get(FETCHED_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Append the fetched corrections whose id is not stored yet and
    /// return the ones that were added.
    pub fn merge_fetched(&self, fetched: Vec<RemoteCorrection>) -> Result<Vec<RemoteCorrection>> {
        let mut stored = self.fetched_corrections();
        let mut known: HashSet<String> = stored.iter().map(RemoteCorrection::id_key).collect();

        let added: Vec<RemoteCorrection> = fetched
            .into_iter()
            .filter(|c| known.insert(c.id_key()))
            .collect();
        if added.is_empty() {
            return Ok(added);
        }

        stored.extend(added.iter().cloned());
        let json = serde_json::to_string(&stored).context("failed to serialize fetched corrections")?;
        self.store.set(FETCHED_KEY, &json)?;
        Ok(added)
    }

    /// When corrections were last pulled, as sent in `?since=`.
    pub fn last_fetch(&self) -> Option<String> {
        self.store.get(LAST_FETCH_KEY).filter(|s| !s.is_empty())
    }

    pub fn save_last_fetch(&self, at: &str) -> Result<()> {
        self.store.set(LAST_FETCH_KEY, at)
    }

    /// Every stored correction, in key order.
    pub fn all_corrections(&self) -> Vec<CorrectionRecord> {
        self.read_all().into_values().collect()
    }

    fn read_all(&self) -> BTreeMap<String, CorrectionRecord> {
        self.store
            .get(CORRECTIONS_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }
}
