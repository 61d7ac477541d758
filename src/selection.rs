//! What happens when a legend marker is activated.

use serde::Serialize;
use tracing::info;

use crate::constants::SELECTION_ZOOM;
use crate::geo::Coordinate;
use crate::legend::{ImageRef, Legend};
use crate::markers::MarkerRegistry;
use crate::radio::{RadioPlayer, RadioStation};
use crate::server::events::MapEvent;
use crate::viewport::MapViewController;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub legend_id: i64,
    pub title: String,
    pub description: String,
    pub coordinate: Coordinate,
}

/// Collaborators a selection touches, borrowed from the session for one call.
pub struct SelectionContext<'a> {
    pub registry: &'a mut MarkerRegistry,
    pub viewport: &'a mut MapViewController,
    pub player: &'a mut RadioPlayer,
    pub stations: &'a [RadioStation],
    pub images: &'a [ImageRef],
    pub radius_km: f64,
    /// Clear shown radio markers first so the toggle always repopulates
    pub refresh_radios: bool,
}

#[derive(Debug, Default)]
pub struct LegendSelectionController {
    current: Option<Selection>,
}

impl LegendSelectionController {
    pub fn current(&self) -> Option<&Selection> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Runs the whole activation sequence and returns the commands for the map page,
    /// in order: player stop, radio markers, fly-to, detail panel.
    pub fn select_legend(&mut self, legend: &Legend, ctx: SelectionContext<'_>) -> Vec<MapEvent> {
        info!("📍 Legend selected: {} ({})", legend.name, legend.id);

        self.current = Some(Selection {
            legend_id: legend.id,
            title: legend.name.clone(),
            description: legend.description.clone(),
            coordinate: legend.coordinate,
        });

        ctx.player.stop();

        if ctx.refresh_radios {
            ctx.registry.clear_radio();
        }
        ctx.registry
            .toggle_radio_markers(legend.coordinate, ctx.stations, ctx.radius_km);

        vec![
            MapEvent::Player { now_playing: None },
            MapEvent::RadioMarkers {
                markers: ctx.registry.radio_markers().to_vec(),
            },
            ctx.viewport.fly_to(legend.coordinate, SELECTION_ZOOM, None),
            MapEvent::OpenDrawer {
                legend_id: legend.id,
                title: legend.name.clone(),
                description: legend.description.clone(),
                images: ctx.images.to_vec(),
            },
        ]
    }
}
