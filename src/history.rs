// 📜 History Store - Append-only committed sessions, per station
// The sole write path into permanent history; no update, no delete

use crate::events::{CoreEvent, EventSink, NullSink};
use crate::session::ScanSession;
use crate::store::{keys, KvStore};
use log::{debug, warn};
use std::collections::HashMap;
use thiserror::Error;

// ============================================================================
// SCANNED DATA
// ============================================================================

/// The durable history: station id → committed sessions, newest first.
///
/// Insertion order is reverse chronological intent, but consumers re-sort by
/// `date` before display rather than trusting it.
pub type ScannedData = HashMap<String, Vec<ScanSession>>;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    /// Commit refused before any data could be lost: the caller must bind a
    /// station profile first
    #[error("no active station set")]
    NoActiveStation,

    #[error("failed to persist history: {0}")]
    Persist(String),
}

// ============================================================================
// HISTORY STORE
// ============================================================================

/// Owns the persisted session history and keeps the on-disk copy in sync.
///
/// Every commit writes the whole map through to the backing store before
/// returning; a malformed persisted blob is discarded at load and replaced
/// with empty state.
pub struct HistoryStore {
    data: ScannedData,
    store: KvStore,
    sink: Box<dyn EventSink>,
}

impl HistoryStore {
    /// Load committed history from the backing store
    pub fn load(store: KvStore) -> Self {
        Self::load_with_sink(store, Box::new(NullSink))
    }

    /// Load, reporting recovered corruption and commits through `sink`
    pub fn load_with_sink(store: KvStore, mut sink: Box<dyn EventSink>) -> Self {
        let raw = store.get(keys::SCANNED_DATA).unwrap_or_else(|err| {
            warn!("failed to read history: {}", err);
            None
        });

        let data = match raw {
            None => ScannedData::new(),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(data) => data,
                Err(err) => {
                    // Recover locally: the operator has no meaningful action
                    // for a corrupt blob, so reset silently
                    warn!("discarding corrupt history blob: {}", err);
                    let _ = store.remove(keys::SCANNED_DATA);
                    sink.emit(CoreEvent::StoreError(
                        "corrupt history discarded".to_string(),
                    ));
                    ScannedData::new()
                }
            },
        };

        HistoryStore { data, store, sink }
    }

    /// Snapshot of the full history (for aggregation queries)
    pub fn snapshot(&self) -> &ScannedData {
        &self.data
    }

    /// Sessions committed for a station, newest first; empty if none
    pub fn sessions_for(&self, station_id: &str) -> &[ScanSession] {
        self.data
            .get(station_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append a finished session to a station's history and persist.
    ///
    /// Fails fast with [`StoreError::NoActiveStation`] on an empty station
    /// id — the session is never silently dropped.
    pub fn commit(&mut self, station_id: &str, session: ScanSession) -> Result<(), StoreError> {
        if station_id.is_empty() {
            return Err(StoreError::NoActiveStation);
        }

        self.data
            .entry(station_id.to_string())
            .or_default()
            .insert(0, session.clone());

        self.store
            .set_json(keys::SCANNED_DATA, &self.data)
            .map_err(|err| StoreError::Persist(format!("{:#}", err)))?;
        debug!(
            "committed session with {} entries for station {}",
            session.entries.len(),
            station_id
        );
        self.sink.emit(CoreEvent::SessionCommitted(session));
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
