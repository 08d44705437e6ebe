// ⚙️ Application State - Theme and active station profile
// One explicit state object, loaded at startup and passed by reference;
// nothing in the crate reads ambient/static state

use crate::station::Station;
use crate::store::{keys, KvStore};
use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};

// ============================================================================
// THEME
// ============================================================================

/// Display theme. Persisted under `app-theme` as the raw strings `"light"`
/// and `"dark"` (not JSON), so unknown values fall back to the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    fn from_str(raw: &str) -> Option<Theme> {
        match raw {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

// ============================================================================
// PROFILE
// ============================================================================

/// The device's active station binding. Exactly one lives at a time; an
/// empty `station_id` means the operator has not picked a station yet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub station_id: String,

    #[serde(default)]
    pub station_name: String,
}

impl Profile {
    /// Bind to a station from the directory
    pub fn for_station(station: &Station) -> Self {
        Profile {
            station_id: station.id.clone(),
            station_name: station.name.clone(),
        }
    }

    /// Whether a station has been selected yet
    pub fn has_station(&self) -> bool {
        !self.station_id.is_empty()
    }
}

// ============================================================================
// APP STATE
// ============================================================================

/// Theme + profile, backed by the key-value store.
///
/// Constructed once at startup with [`AppState::load`]; every mutation
/// writes through immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    theme: Theme,
    profile: Profile,
}

impl AppState {
    /// Load persisted state. Corrupt or unknown entries reset to defaults.
    pub fn load(store: &KvStore) -> Result<Self> {
        let theme = match store.get(keys::THEME)? {
            Some(raw) => Theme::from_str(&raw).unwrap_or_else(|| {
                warn!("unknown theme '{}', falling back to default", raw);
                Theme::default()
            }),
            None => Theme::default(),
        };

        let profile = store.get_json(keys::PROFILE)?.unwrap_or_default();

        Ok(AppState { theme, profile })
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Flip light/dark and persist the new value
    pub fn toggle_theme(&mut self, store: &KvStore) -> Result<Theme> {
        self.theme = self.theme.toggled();
        store.set(keys::THEME, self.theme.as_str())?;
        Ok(self.theme)
    }

    /// Replace the station binding and persist it
    pub fn update_profile(&mut self, store: &KvStore, profile: Profile) -> Result<()> {
        store.set_json(keys::PROFILE, &profile)?;
        self.profile = profile;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
