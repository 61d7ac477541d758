use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::geo::Coordinate;
use crate::legend::ImageRef;
use crate::markers::Marker;
use crate::radio::NowPlaying;

// Commands pushed to the map page over SSE
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    FlyTo {
        center: Coordinate,
        zoom: f64,
        duration_ms: Option<u64>,
    },
    OpenDrawer {
        legend_id: i64,
        title: String,
        description: String,
        images: Vec<ImageRef>,
    },
    CloseDrawer,
    ZoomOutVisibility {
        visible: bool,
    },
    ClosePopups,
    RadioMarkers {
        markers: Vec<Marker>,
    },
    Player {
        now_playing: Option<NowPlaying>,
    },
    Reload,
    /// Reopen the page from scratch
    Refresh,
    Heartbeat {
        at: DateTime<Utc>,
    },
}

impl MapEvent {
    pub fn heartbeat() -> Self {
        MapEvent::Heartbeat { at: Utc::now() }
    }
}
