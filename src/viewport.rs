//! Viewport state and fly-to bookkeeping.

use serde::Serialize;
use tracing::debug;

use crate::constants::{LANDING_TOLERANCE_KM, SEARCH_FLY_DURATION_MS, SELECTION_ZOOM};
use crate::geo::{distance_km, Coordinate};
use crate::legend::Legend;
use crate::markers::MarkerRegistry;
use crate::server::events::MapEvent;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportState {
    pub center: Coordinate,
    pub zoom: f64,
}

/// An animated transition requested from the map surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flight {
    pub generation: u64,
    pub target: Coordinate,
    pub zoom: f64,
    /// Legend to select once the map lands (search results)
    pub select_on_landing: Option<i64>,
}

#[derive(Debug)]
pub struct MapViewController {
    home: ViewportState,
    state: ViewportState,
    pending: Option<Flight>,
    generation: u64,
}

impl MapViewController {
    pub fn new(home: Coordinate, home_zoom: f64) -> Self {
        let home = ViewportState { center: home, zoom: home_zoom };
        MapViewController {
            home,
            state: home,
            pending: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn home(&self) -> ViewportState {
        self.home
    }

    pub fn pending_flight(&self) -> Option<&Flight> {
        self.pending.as_ref()
    }

    /// Requests a flight. A newer request supersedes any flight still in the air.
    pub fn fly_to(&mut self, target: Coordinate, zoom: f64, duration_ms: Option<u64>) -> MapEvent {
        self.start_flight(target, zoom, None);
        MapEvent::FlyTo { center: target, zoom, duration_ms }
    }

    /// Flight for a picked search result; the legend is selected on landing.
    pub fn fly_to_legend(&mut self, legend: &Legend) -> MapEvent {
        self.start_flight(legend.coordinate, SELECTION_ZOOM, Some(legend.id));
        MapEvent::FlyTo {
            center: legend.coordinate,
            zoom: SELECTION_ZOOM,
            duration_ms: Some(SEARCH_FLY_DURATION_MS),
        }
    }

    fn start_flight(&mut self, target: Coordinate, zoom: f64, select_on_landing: Option<i64>) {
        self.generation += 1;
        self.pending = Some(Flight {
            generation: self.generation,
            target,
            zoom,
            select_on_landing,
        });
    }

    /// Called for every pan/zoom frame. Returns the zoom-out control visibility.
    pub fn on_viewport_changed(
        &mut self,
        center: Coordinate,
        zoom: f64,
        registry: &mut MarkerRegistry,
    ) -> bool {
        self.state = ViewportState { center, zoom };
        registry.move_center(center);
        self.zoom_out_visible()
    }

    /// Completes the pending flight if the map actually reached its target.
    /// A flight cut short by user panning is discarded.
    pub fn on_move_end(&mut self) -> Option<Flight> {
        let flight = self.pending.take()?;
        if distance_km(self.state.center, flight.target) > LANDING_TOLERANCE_KM {
            debug!("Flight {} interrupted before landing", flight.generation);
            return None;
        }
        Some(flight)
    }

    /// Jumps straight home and forgets any flight, as a fresh page load would.
    pub fn reset(&mut self) {
        self.state = self.home;
        self.pending = None;
    }

    pub fn reset_to_home(&mut self) -> Vec<MapEvent> {
        let home = self.home;
        vec![
            self.fly_to(home.center, home.zoom, None),
            MapEvent::CloseDrawer,
            MapEvent::ZoomOutVisibility { visible: false },
            MapEvent::ClosePopups,
        ]
    }

    pub fn zoom_out_visible(&self) -> bool {
        self.state.zoom > self.home.zoom
    }

    /// Footer line: center to 4 decimals, zoom to 2.
    pub fn display(&self) -> String {
        format!(
            "Longitude: {:.4} | Latitude: {:.4} | Zoom: {:.2}",
            self.state.center.longitude, self.state.center.latitude, self.state.zoom
        )
    }
}
