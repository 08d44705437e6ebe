// 📊 Aggregation Queries - Pure functions over a history snapshot
// Recomputed on demand; no cached counters to invalidate

use crate::history::ScannedData;
use crate::session::ScanSession;
use chrono::{DateTime, FixedOffset};
use std::collections::HashSet;

/// The most recently dated session for a station, if any.
///
/// Sessions are compared by parsed `date`, not stored order; unparsable
/// dates sort before everything else.
pub fn latest_session<'a>(data: &'a ScannedData, station_id: &str) -> Option<&'a ScanSession> {
    data.get(station_id)?
        .iter()
        .max_by(|a, b| parse_date(&a.date).cmp(&parse_date(&b.date)))
}

/// Number of distinct battery ids ever scanned at a station, across all of
/// its sessions (cumulative, not per-session).
pub fn unique_battery_count(data: &ScannedData, station_id: &str) -> usize {
    let sessions = match data.get(station_id) {
        Some(sessions) => sessions,
        None => return 0,
    };

    let ids: HashSet<&str> = sessions
        .iter()
        .flat_map(|s| s.entries.iter())
        .map(|e| e.battery_id.as_str())
        .collect();
    ids.len()
}

/// Count of a named accessory item in the station's latest session, or 0 if
/// the station has no sessions or the latest session lacks the item.
/// Name matching ignores case.
pub fn latest_item_count(data: &ScannedData, station_id: &str, item_name: &str) -> u32 {
    let lower = item_name.to_lowercase();
    latest_session(data, station_id)
        .and_then(|session| {
            session
                .items
                .iter()
                .find(|item| item.name.to_lowercase() == lower)
        })
        .map(|item| item.count)
        .unwrap_or(0)
}

fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok()
}

// ============================================================================
// TESTS
// ============================================================================
