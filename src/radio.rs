//! Radio stations, proximity filtering and the player state.

use serde::{Deserialize, Serialize};

use crate::geo::{distance_km, Coordinate};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadioStation {
    pub name: String,
    pub stream_url: String,
    /// None when the directory has no usable position for the station
    pub coordinate: Option<Coordinate>,
}

/// Station record as returned by the radio-browser directory.
/// Only the fields we use; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct StationRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    pub geo_lat: Option<f64>,
    pub geo_long: Option<f64>,
}

impl From<StationRecord> for RadioStation {
    fn from(record: StationRecord) -> Self {
        let coordinate = match (record.geo_lat, record.geo_long) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng).ok(),
            _ => None,
        };
        RadioStation {
            name: record.name.trim().to_string(),
            stream_url: record.url,
            coordinate,
        }
    }
}

/// Stations within `radius_km` of `center`, in input order.
pub fn filter_near<'a>(
    center: Coordinate,
    stations: &'a [RadioStation],
    radius_km: f64,
) -> Vec<&'a RadioStation> {
    stations
        .iter()
        .filter(|station| {
            station
                .coordinate
                .is_some_and(|position| distance_km(center, position) <= radius_km)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NowPlaying {
    pub station_name: String,
    pub stream_url: String,
}

/// Which stream the page's audio player should be playing, if any.
#[derive(Debug, Default)]
pub struct RadioPlayer {
    current: Option<NowPlaying>,
}

impl RadioPlayer {
    pub fn play(&mut self, station_name: &str, stream_url: &str) -> &NowPlaying {
        self.current.insert(NowPlaying {
            station_name: station_name.to_string(),
            stream_url: stream_url.to_string(),
        })
    }

    pub fn stop(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&NowPlaying> {
        self.current.as_ref()
    }
}
