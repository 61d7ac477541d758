//! Coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

use crate::constants::EARTH_RADIUS_KM;
use crate::error::{LegendMapError, Result};

/// A WGS-84 position in degrees. Serialized as `{ "lat", "lng" }` for the map page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl Coordinate {
    /// Builds a coordinate, rejecting values outside [-90, 90] / [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let coordinate = Coordinate { latitude, longitude };
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(LegendMapError::InvalidCoordinate {
                lat: latitude,
                lng: longitude,
            })
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Haversine distance in kilometers. NaN in, NaN out.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let delta_lat = lat_b - lat_a;
    let delta_lng = b.longitude.to_radians() - a.longitude.to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}
