//! Country boundary overlay drawn under the markers.

use serde::Serialize;

use crate::constants::{BOUNDARY_FILL_COLOR, BOUNDARY_FILL_OPACITY};
use crate::settings::Settings;

/// GeoJSON feature property keys that may carry the ISO 3166-1 alpha-3 code,
/// depending on which country dataset is configured.
pub const ISO3_PROPERTY_KEYS: [&str; 4] = ["ISO_A3", "ISO3166-1-Alpha-3", "iso_a3", "iso_3166_1_alpha_3"];

/// Fill layer over every country except `focus_country`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryOverlay {
    pub source_url: String,
    pub focus_country: String,
    pub iso3_keys: Vec<&'static str>,
    pub fill_color: &'static str,
    pub fill_opacity: f64,
}

impl BoundaryOverlay {
    /// `None` when no boundary source is configured.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let source_url = settings.boundaries_url.trim();
        if source_url.is_empty() {
            return None;
        }
        Some(BoundaryOverlay {
            source_url: source_url.to_string(),
            focus_country: settings.focus_country.to_uppercase(),
            iso3_keys: ISO3_PROPERTY_KEYS.to_vec(),
            fill_color: BOUNDARY_FILL_COLOR,
            fill_opacity: BOUNDARY_FILL_OPACITY,
        })
    }
}
