// 🔔 Core Events - Outward notification interface
// The engine never renders anything; the view layer subscribes here

use crate::camera::CameraState;
use crate::session::{BatteryEntry, ScanSession};

// ============================================================================
// CORE EVENT
// ============================================================================

/// Everything the core announces to the outside world.
///
/// Consumers (toasts, overlays, dashboards) react to these; the core does not
/// care whether anyone listens.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// A scan was accepted and appended to the in-progress session
    ScanAccepted(BatteryEntry),

    /// A scan decoded an id already present in the session (not an error)
    ScanDuplicate { battery_id: String },

    /// The camera lifecycle moved to a new state
    CameraStateChanged(CameraState),

    /// A finished session was appended to permanent history
    SessionCommitted(ScanSession),

    /// A non-fatal store problem was handled internally (e.g. a corrupt
    /// persisted blob was discarded and replaced with an empty default)
    StoreError(String),
}

// ============================================================================
// EVENT SINK
// ============================================================================

/// Receiver for [`CoreEvent`]s.
///
/// Components own a boxed sink; the default [`NullSink`] drops everything,
/// which keeps the engine usable headless and in tests.
pub trait EventSink {
    fn emit(&mut self, event: CoreEvent);
}

/// Sink that discards all events
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: CoreEvent) {}
}
