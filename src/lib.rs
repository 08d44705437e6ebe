// SnapStock Core - Scan-Session Engine
// Camera lifecycle, per-scan deduplication, session accumulation and the
// append-only per-station history with its aggregation queries.
// The view layer consumes state and events; it never holds invariants.

pub mod aggregate; // Pure queries over a history snapshot
pub mod app;       // Explicit application-state object (theme, profile)
pub mod camera;    // Device lifecycle state machine
pub mod events;    // Outward notification interface
pub mod history;   // Append-only committed-session store
pub mod session;   // In-progress session: dedup gate + tallies
pub mod station;   // Fixed station reference data
pub mod store;     // Persisted key-value backing

// Re-export commonly used types
pub use aggregate::{latest_item_count, latest_session, unique_battery_count};
pub use app::{AppState, Profile, Theme};
pub use camera::{
    CameraConfig, CameraController, CameraDevice, CameraError, CameraState, Capabilities,
    DeviceError, Facing,
};
pub use events::{CoreEvent, EventSink, NullSink};
pub use history::{HistoryStore, ScannedData, StoreError};
pub use session::{
    BatteryEntry, InventoryItem, PendingItem, ScanGate, ScanOutcome, ScanSession,
    ScanSessionManager, SessionConfig, SessionError,
};
pub use station::{Station, StationDirectory};
pub use store::{keys, KvStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
