//! Markers placed on the map and their lifecycle.
//!
//! Legend markers and radio markers each live in their own [`MarkerSet`],
//! a two-state machine (`Empty` / `Populated`). Radio markers are toggled:
//! asking for them while they are shown hides them instead of refreshing.
//! The center marker follows the viewport and is never removed.

use serde::Serialize;
use tracing::debug;

use crate::constants::{CENTER_MARKER_COLOR, LEGEND_MARKER_COLOR};
use crate::geo::Coordinate;
use crate::legend::Legend;
use crate::radio::{filter_near, RadioStation};

pub type MarkerId = u64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkerKind {
    Legend { legend_id: i64 },
    Radio,
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkerStyle {
    Pin { color: &'static str },
    RadioIcon,
}

/// The single thing a click on a marker does.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkerAction {
    SelectLegend { legend_id: i64 },
    PlayRadio { name: String, url: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: MarkerId,
    pub kind: MarkerKind,
    pub coordinate: Coordinate,
    pub style: MarkerStyle,
    pub popup: Option<String>,
    pub action: Option<MarkerAction>,
}

#[derive(Debug, Default)]
pub enum MarkerSet {
    #[default]
    Empty,
    Populated(Vec<Marker>),
}

/// What a populate/toggle call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Shown(usize),
    Hidden,
}

impl MarkerSet {
    pub fn is_populated(&self) -> bool {
        matches!(self, MarkerSet::Populated(_))
    }

    pub fn markers(&self) -> &[Marker] {
        match self {
            MarkerSet::Empty => &[],
            MarkerSet::Populated(markers) => markers,
        }
    }

    /// Places `markers` when empty. When already populated, clears instead.
    pub fn populate(&mut self, markers: Vec<Marker>) -> Transition {
        match self {
            MarkerSet::Empty => {
                let count = markers.len();
                *self = MarkerSet::Populated(markers);
                Transition::Shown(count)
            }
            MarkerSet::Populated(_) => {
                self.clear();
                Transition::Hidden
            }
        }
    }

    pub fn clear(&mut self) {
        *self = MarkerSet::Empty;
    }
}

#[derive(Debug)]
pub struct MarkerRegistry {
    next_id: MarkerId,
    legends: MarkerSet,
    radios: MarkerSet,
    center: Marker,
}

impl MarkerRegistry {
    /// New registry with the center marker at `home`.
    pub fn new(home: Coordinate) -> Self {
        let center = Marker {
            id: 0,
            kind: MarkerKind::Center,
            coordinate: home,
            style: MarkerStyle::Pin { color: CENTER_MARKER_COLOR },
            popup: None,
            action: None,
        };
        MarkerRegistry {
            next_id: 1,
            legends: MarkerSet::Empty,
            radios: MarkerSet::Empty,
            center,
        }
    }

    fn allocate_id(&mut self) -> MarkerId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Replaces every legend marker with one green pin per legend.
    pub fn place_legends(&mut self, legends: &[Legend]) -> usize {
        self.legends.clear();
        let markers = legends
            .iter()
            .map(|legend| Marker {
                id: self.allocate_id(),
                kind: MarkerKind::Legend { legend_id: legend.id },
                coordinate: legend.coordinate,
                style: MarkerStyle::Pin { color: LEGEND_MARKER_COLOR },
                popup: Some(legend.name.clone()),
                action: Some(MarkerAction::SelectLegend { legend_id: legend.id }),
            })
            .collect();
        match self.legends.populate(markers) {
            Transition::Shown(count) => count,
            Transition::Hidden => 0,
        }
    }

    /// Shows radio markers near `center` if none are shown, otherwise hides them.
    pub fn toggle_radio_markers(
        &mut self,
        center: Coordinate,
        stations: &[RadioStation],
        radius_km: f64,
    ) -> Transition {
        if self.radios.is_populated() {
            self.radios.clear();
            debug!("Radio markers hidden");
            return Transition::Hidden;
        }

        let nearby = filter_near(center, stations, radius_km);
        let mut markers = Vec::with_capacity(nearby.len());
        for station in nearby {
            // filter_near only returns stations with a position
            let Some(coordinate) = station.coordinate else { continue };
            markers.push(Marker {
                id: self.allocate_id(),
                kind: MarkerKind::Radio,
                coordinate,
                style: MarkerStyle::RadioIcon,
                popup: Some(station.name.clone()),
                action: Some(MarkerAction::PlayRadio {
                    name: station.name.clone(),
                    url: station.stream_url.clone(),
                }),
            });
        }
        let transition = self.radios.populate(markers);
        debug!("Radio markers: {:?}", transition);
        transition
    }

    pub fn clear_radio(&mut self) {
        self.radios.clear();
    }

    pub fn move_center(&mut self, coordinate: Coordinate) {
        self.center.coordinate = coordinate;
    }

    pub fn center(&self) -> &Marker {
        &self.center
    }

    pub fn legend_markers(&self) -> &[Marker] {
        self.legends.markers()
    }

    pub fn radio_markers(&self) -> &[Marker] {
        self.radios.markers()
    }

    pub fn radios_shown(&self) -> bool {
        self.radios.is_populated()
    }

    /// Every marker currently on the map, center marker first.
    pub fn all(&self) -> Vec<&Marker> {
        std::iter::once(&self.center)
            .chain(self.legends.markers())
            .chain(self.radios.markers())
            .collect()
    }

    pub fn find(&self, id: MarkerId) -> Option<&Marker> {
        self.all().into_iter().find(|marker| marker.id == id)
    }
}
