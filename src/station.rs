// 📍 Station Directory - Fixed swap-station reference data
// Stations are selected by the operator, never created or edited

use serde::{Deserialize, Serialize};

// ============================================================================
// STATION
// ============================================================================

/// A physical swap station. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Fixed station id (e.g. "De963991")
    pub id: String,

    /// Human-readable site name
    pub name: String,

    /// City the station operates in
    pub city: String,
}

impl Station {
    fn new(id: &str, name: &str, city: &str) -> Self {
        Station {
            id: id.to_string(),
            name: name.to_string(),
            city: city.to_string(),
        }
    }
}

// ============================================================================
// STATION DIRECTORY
// ============================================================================

/// Registry of the known stations an operator can bind a profile to.
pub struct StationDirectory {
    stations: Vec<Station>,
}

impl StationDirectory {
    /// Create the directory with the current station network
    pub fn new() -> Self {
        StationDirectory {
            stations: vec![
                Station::new("De963991", "Hallo Majra", "Chandigarh"),
                Station::new("De425627", "Raipur Khurd", "Chandigarh"),
                Station::new("De988915", "Sector 42", "Chandigarh"),
                Station::new("De316535", "Maloya", "Chandigarh"),
                Station::new("De337282", "Daria", "Chandigarh"),
                Station::new("De258797", "Sector 20", "Chandigarh"),
                Station::new("De455892", "Sector 35", "Chandigarh"),
                Station::new("De297974", "Sector 26", "Chandigarh"),
            ],
        }
    }

    /// All stations, in directory order
    pub fn all(&self) -> &[Station] {
        &self.stations
    }

    /// Look up a station by its fixed id
    pub fn find(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }
}

impl Default for StationDirectory {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_has_known_stations() {
        let directory = StationDirectory::new();

        assert_eq!(directory.all().len(), 8);

        let station = directory.find("De963991").expect("station should exist");
        assert_eq!(station.name, "Hallo Majra");
        assert_eq!(station.city, "Chandigarh");
    }

    #[test]
    fn test_unknown_station_id() {
        let directory = StationDirectory::new();

        assert!(directory.find("De000000").is_none());
        assert!(directory.find("").is_none());
    }
}
