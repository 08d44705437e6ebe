// 🔋 Scan Session - In-progress inventory count + deduplicated battery scans
// The accept/reject decision for every decoded code lives here

use crate::events::{CoreEvent, EventSink, NullSink};
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

// ============================================================================
// SESSION DATA MODEL
// ============================================================================

/// One scanned battery. Created at scan-accept time, immutable after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryEntry {
    /// Raw decoded payload, treated as an opaque unique token
    pub battery_id: String,

    /// Display time (HH:MM) captured when the scan was accepted
    pub timestamp: String,
}

/// A committed accessory tally. Counts are always present here; the unset
/// pending state exists only inside the manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub count: u32,
}

/// One completed round of counting + scanning at a station.
///
/// Built once by [`ScanSessionManager::finalize`] and never mutated again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSession {
    /// ISO-8601 creation instant (also the ordering key for history queries)
    pub date: String,

    /// Display time (HH:MM) for list rows
    pub timestamp: String,

    /// Accessory tallies. Older persisted sessions may lack this field, so it
    /// defaults to empty on load and is always populated in memory.
    #[serde(default)]
    pub items: Vec<InventoryItem>,

    /// Deduplicated battery scans, newest first
    pub entries: Vec<BatteryEntry>,
}

/// An accessory tally still being typed in. `None` means the operator has not
/// entered a number yet; that is distinct from an explicit zero.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingItem {
    pub name: String,
    pub count: Option<u32>,
}

// ============================================================================
// ERRORS & OUTCOMES
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    /// Item names are unique per session, ignoring case
    #[error("an item named '{0}' already exists")]
    DuplicateItem(String),

    #[error("no item named '{0}' in this session")]
    UnknownItem(String),

    #[error("item name must not be empty")]
    EmptyItemName,
}

/// Result of feeding one decoded code into the manager.
///
/// `Duplicate` is a defined outcome, not an error; `Ignored` means the event
/// arrived while the gate was closed and had no effect at all.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// New id, appended to the session
    Accepted(BatteryEntry),

    /// Id already present; session unchanged
    Duplicate { battery_id: String },

    /// Dropped: a prior accept is still awaiting acknowledgment, or the
    /// settle delay after the last decision has not elapsed
    Ignored,
}

/// Scan-accept concurrency guard.
///
/// One enumerated state instead of a boolean: while `AwaitingAck`, every
/// decode event is dropped until the caller acknowledges the accepted scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanGate {
    /// Ready to judge the next decode event
    Ready,

    /// An accepted scan is on screen; decode events are dropped
    AwaitingAck,
}

// ============================================================================
// CONFIG
// ============================================================================

/// Tuning knobs for the session manager.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pause after a duplicate/accept decision before new decode events are
    /// honored, so a code still held in front of the camera does not
    /// re-trigger on the next frame (default: 100 ms)
    pub settle_delay: Duration,

    /// Tally row every session starts with (default: "Chargers")
    pub default_item: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            settle_delay: Duration::from_millis(100),
            default_item: "Chargers".to_string(),
        }
    }
}

// ============================================================================
// SCAN SESSION MANAGER
// ============================================================================

/// Owns the in-progress session: pending accessory tallies and the
/// deduplicated battery entries, plus the gate serializing accept decisions.
///
/// The manager is discarded on cancellation; only [`finalize`] output ever
/// reaches permanent history.
///
/// [`finalize`]: ScanSessionManager::finalize
pub struct ScanSessionManager {
    config: SessionConfig,
    items: Vec<PendingItem>,
    entries: Vec<BatteryEntry>,
    gate: ScanGate,
    settle_until: Option<Instant>,
    sink: Box<dyn EventSink>,
}

impl ScanSessionManager {
    /// Create a manager with the default tally row and no entries
    pub fn new(config: SessionConfig) -> Self {
        Self::with_sink(config, Box::new(NullSink))
    }

    /// Create a manager that reports accepts/duplicates through `sink`
    pub fn with_sink(config: SessionConfig, sink: Box<dyn EventSink>) -> Self {
        let default_item = PendingItem {
            name: config.default_item.clone(),
            count: None,
        };

        ScanSessionManager {
            config,
            items: vec![default_item],
            entries: Vec::new(),
            gate: ScanGate::Ready,
            settle_until: None,
            sink,
        }
    }

    // ========================================================================
    // INVENTORY ITEMS
    // ========================================================================

    /// Pending tallies, in entry order
    pub fn items(&self) -> &[PendingItem] {
        &self.items
    }

    /// Add a tally row. Names are unique per session, ignoring case.
    pub fn add_item(&mut self, name: &str) -> Result<(), SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyItemName);
        }
        if self.find_item(name).is_some() {
            return Err(SessionError::DuplicateItem(name.to_string()));
        }

        self.items.push(PendingItem {
            name: name.to_string(),
            count: None,
        });
        Ok(())
    }

    /// Set or clear the count of an existing tally row.
    /// `None` returns the row to the unset pending state (not zero).
    pub fn set_item_count(&mut self, name: &str, count: Option<u32>) -> Result<(), SessionError> {
        let lower = name.to_lowercase();
        let item = self
            .items
            .iter_mut()
            .find(|i| i.name.to_lowercase() == lower)
            .ok_or_else(|| SessionError::UnknownItem(name.to_string()))?;

        item.count = count;
        Ok(())
    }

    /// Remove a tally row
    pub fn remove_item(&mut self, name: &str) -> Result<(), SessionError> {
        let lower = name.to_lowercase();
        let index = self
            .items
            .iter()
            .position(|i| i.name.to_lowercase() == lower)
            .ok_or_else(|| SessionError::UnknownItem(name.to_string()))?;

        self.items.remove(index);
        Ok(())
    }

    /// Admission check into the scanning phase: every tally row must have a
    /// set count before battery scanning may begin
    pub fn can_start_scanning(&self) -> bool {
        self.items.iter().all(|i| i.count.is_some())
    }

    fn find_item(&self, name: &str) -> Option<&PendingItem> {
        let lower = name.to_lowercase();
        self.items.iter().find(|i| i.name.to_lowercase() == lower)
    }

    // ========================================================================
    // SCAN ACCEPT / REJECT
    // ========================================================================

    /// Entries accepted so far, newest first
    pub fn entries(&self) -> &[BatteryEntry] {
        &self.entries
    }

    /// Current gate state
    pub fn gate(&self) -> ScanGate {
        self.gate
    }

    /// Judge one decoded code.
    ///
    /// Accepted scans close the gate until [`acknowledge_and_resume`] is
    /// called; duplicates leave the session unchanged and only arm the settle
    /// delay. Events arriving while the gate is closed are dropped.
    ///
    /// [`acknowledge_and_resume`]: ScanSessionManager::acknowledge_and_resume
    pub fn on_scan_decoded(&mut self, battery_id: &str) -> ScanOutcome {
        if self.gate == ScanGate::AwaitingAck || self.is_settling() {
            return ScanOutcome::Ignored;
        }

        if self.entries.iter().any(|e| e.battery_id == battery_id) {
            self.arm_settle_delay();
            self.sink.emit(CoreEvent::ScanDuplicate {
                battery_id: battery_id.to_string(),
            });
            return ScanOutcome::Duplicate {
                battery_id: battery_id.to_string(),
            };
        }

        let entry = BatteryEntry {
            battery_id: battery_id.to_string(),
            timestamp: display_time(),
        };
        self.entries.insert(0, entry.clone());
        self.gate = ScanGate::AwaitingAck;
        self.sink.emit(CoreEvent::ScanAccepted(entry.clone()));

        ScanOutcome::Accepted(entry)
    }

    /// Reopen the gate after the caller has presented the accepted scan and
    /// chosen to continue. The settle delay still applies.
    pub fn acknowledge_and_resume(&mut self) {
        self.gate = ScanGate::Ready;
        self.arm_settle_delay();
    }

    /// Destructive: drop every accepted entry. Tally rows are untouched.
    /// Callers are expected to confirm with the operator first.
    pub fn clear_entries(&mut self) {
        self.entries.clear();
    }

    fn arm_settle_delay(&mut self) {
        self.settle_until = Some(Instant::now() + self.config.settle_delay);
    }

    fn is_settling(&self) -> bool {
        self.settle_until
            .map_or(false, |until| Instant::now() < until)
    }

    // ========================================================================
    // FINALIZE
    // ========================================================================

    /// Produce the immutable session snapshot, or `None` when there is
    /// nothing meaningful to save (no entries and no positive count) — the
    /// caller treats that as "session cancelled", not an error.
    ///
    /// Unset counts coerce to 0; rows with empty names are dropped.
    pub fn finalize(&self) -> Option<ScanSession> {
        let has_entries = !self.entries.is_empty();
        let has_counts = self.items.iter().any(|i| i.count.unwrap_or(0) > 0);
        if !has_entries && !has_counts {
            return None;
        }

        let items = self
            .items
            .iter()
            .filter(|i| !i.name.is_empty())
            .map(|i| InventoryItem {
                name: i.name.clone(),
                count: i.count.unwrap_or(0),
            })
            .collect();

        Some(ScanSession {
            date: Utc::now().to_rfc3339(),
            timestamp: display_time(),
            items,
            entries: self.entries.clone(),
        })
    }
}

/// Wall-clock HH:MM, the display format used on entry and session rows
fn display_time() -> String {
    Local::now().format("%H:%M").to_string()
}

// ============================================================================
// TESTS
// ============================================================================
