//! Map session: the separately-owned component states and the event routing
//! between them.
//!
//! Background loads are applied through [`LoadTicket`]s. Starting a new load of
//! a kind bumps that kind's generation, so a response that arrives after a newer
//! load was started is dropped instead of overwriting fresher state.

use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::BackendClient;
use crate::error::Result;
use crate::geo::Coordinate;
use crate::legend::{search_legends, ImageRef, Legend, LegendRecord};
use crate::markers::{Marker, MarkerAction, MarkerId, MarkerRegistry};
use crate::radio::{NowPlaying, RadioPlayer, RadioStation, StationRecord};
use crate::selection::{LegendSelectionController, Selection, SelectionContext};
use crate::server::events::MapEvent;
use crate::settings::Settings;
use crate::viewport::{Flight, MapViewController, ViewportState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Legends,
    Stations,
    Images,
}

impl LoadKind {
    fn index(self) -> usize {
        match self {
            LoadKind::Legends => 0,
            LoadKind::Stations => 1,
            LoadKind::Images => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    kind: LoadKind,
    generation: u64,
}

/// What the page needs to draw its chrome.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub viewport: ViewportState,
    pub zoom_out_visible: bool,
    pub footer: String,
    pub flight: Option<Flight>,
    pub selection: Option<Selection>,
    pub now_playing: Option<NowPlaying>,
    pub legends: usize,
    pub stations: usize,
    pub images: usize,
}

#[derive(Debug)]
pub struct MapSession {
    radius_km: f64,
    refresh_radios: bool,
    legends: Vec<Legend>,
    stations: Vec<RadioStation>,
    images: Vec<ImageRef>,
    registry: MarkerRegistry,
    viewport: MapViewController,
    selection: LegendSelectionController,
    player: RadioPlayer,
    generations: [u64; 3],
}

impl MapSession {
    pub fn new(home: Coordinate, home_zoom: f64, radius_km: f64) -> Self {
        MapSession {
            radius_km,
            refresh_radios: false,
            legends: Vec::new(),
            stations: Vec::new(),
            images: Vec::new(),
            registry: MarkerRegistry::new(home),
            viewport: MapViewController::new(home, home_zoom),
            selection: LegendSelectionController::default(),
            player: RadioPlayer::default(),
            generations: [0; 3],
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let home = Coordinate::new(settings.home_lat, settings.home_lng)?;
        Ok(Self::new(home, settings.home_zoom, settings.radius_km)
            .with_radio_refresh(settings.refresh_radios_on_select))
    }

    /// Re-selecting a legend refreshes radio markers instead of toggling them off.
    pub fn with_radio_refresh(mut self, enabled: bool) -> Self {
        self.refresh_radios = enabled;
        self
    }

    pub fn begin_load(&mut self, kind: LoadKind) -> LoadTicket {
        let slot = &mut self.generations[kind.index()];
        *slot += 1;
        LoadTicket { kind, generation: *slot }
    }

    // Stale tickets are dropped; failures are logged and leave the state as it was
    fn accept<T>(&self, ticket: LoadTicket, result: Result<T>) -> Option<T> {
        if self.generations[ticket.kind.index()] != ticket.generation {
            debug!("Dropping stale {:?} response (generation {})", ticket.kind, ticket.generation);
            return None;
        }
        match result {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("Failed to load {:?}: {}", ticket.kind, e);
                None
            }
        }
    }

    /// Applies a `/places` response and places one marker per valid legend.
    pub fn apply_legends(&mut self, ticket: LoadTicket, result: Result<Vec<LegendRecord>>) -> bool {
        let Some(records) = self.accept(ticket, result) else {
            return false;
        };
        let mut legends = Vec::with_capacity(records.len());
        for record in records {
            let id = record.id;
            match Legend::try_from(record) {
                Ok(legend) => legends.push(legend),
                Err(e) => warn!("Skipping legend {}: {}", id, e),
            }
        }
        let placed = self.registry.place_legends(&legends);
        self.legends = legends;
        info!("🗺️  {} legends placed on the map", placed);
        true
    }

    pub fn apply_stations(&mut self, ticket: LoadTicket, result: Result<Vec<StationRecord>>) -> bool {
        let Some(records) = self.accept(ticket, result) else {
            return false;
        };
        self.stations = records.into_iter().map(RadioStation::from).collect();
        let located = self.stations.iter().filter(|s| s.coordinate.is_some()).count();
        info!("📻 {} radio stations loaded ({} with a position)", self.stations.len(), located);
        true
    }

    pub fn apply_images(&mut self, ticket: LoadTicket, result: Result<Vec<ImageRef>>) -> bool {
        let Some(images) = self.accept(ticket, result) else {
            return false;
        };
        self.images = images;
        info!("🖼️  {} images loaded", self.images.len());
        true
    }

    pub fn legends(&self) -> &[Legend] {
        &self.legends
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.current()
    }

    pub fn player(&self) -> &RadioPlayer {
        &self.player
    }

    pub fn viewport(&self) -> &MapViewController {
        &self.viewport
    }

    pub fn markers(&self) -> Vec<Marker> {
        self.registry.all().into_iter().cloned().collect()
    }

    pub fn search(&self, keyword: &str) -> Vec<Legend> {
        search_legends(&self.legends, keyword).into_iter().cloned().collect()
    }

    /// Activation of a legend marker. `None` when the legend is unknown.
    pub fn select_legend(&mut self, legend_id: i64) -> Option<Vec<MapEvent>> {
        let legend = self.legends.iter().find(|legend| legend.id == legend_id)?;
        let ctx = SelectionContext {
            registry: &mut self.registry,
            viewport: &mut self.viewport,
            player: &mut self.player,
            stations: &self.stations,
            images: &self.images,
            radius_km: self.radius_km,
            refresh_radios: self.refresh_radios,
        };
        Some(self.selection.select_legend(legend, ctx))
    }

    pub fn play_radio(&mut self, name: &str, url: &str) -> MapEvent {
        info!("🎵 Playing {} ({})", name, url);
        let now_playing = self.player.play(name, url).clone();
        MapEvent::Player { now_playing: Some(now_playing) }
    }

    /// Runs the single action attached to a marker. `None` for unknown ids.
    pub fn click_marker(&mut self, id: MarkerId) -> Option<Vec<MapEvent>> {
        let action = self.registry.find(id)?.action.clone();
        match action {
            Some(MarkerAction::SelectLegend { legend_id }) => self.select_legend(legend_id),
            Some(MarkerAction::PlayRadio { name, url }) => Some(vec![self.play_radio(&name, &url)]),
            None => Some(Vec::new()),
        }
    }

    /// Search result picked: fly there, selection follows on landing.
    pub fn fly_to_legend(&mut self, legend_id: i64) -> Option<MapEvent> {
        let legend = self.legends.iter().find(|legend| legend.id == legend_id)?;
        Some(self.viewport.fly_to_legend(legend))
    }

    pub fn on_viewport_changed(&mut self, center: Coordinate, zoom: f64) -> bool {
        self.viewport.on_viewport_changed(center, zoom, &mut self.registry)
    }

    pub fn on_move_end(&mut self) -> Vec<MapEvent> {
        match self.viewport.on_move_end() {
            Some(flight) => match flight.select_on_landing {
                Some(legend_id) => self.select_legend(legend_id).unwrap_or_default(),
                None => Vec::new(),
            },
            None => Vec::new(),
        }
    }

    pub fn reset_to_home(&mut self) -> Vec<MapEvent> {
        self.viewport.reset_to_home()
    }

    /// Back to the state of a freshly opened page: no selection, no radio
    /// markers, nothing playing, viewport at home. Loaded data is kept.
    pub fn reset_view(&mut self) {
        self.selection.clear();
        self.registry.clear_radio();
        self.player.stop();
        self.viewport.reset();
        self.registry.move_center(self.viewport.home().center);
        info!("🔁 View reset to home");
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            viewport: self.viewport.state(),
            zoom_out_visible: self.viewport.zoom_out_visible(),
            footer: self.viewport.display(),
            flight: self.viewport.pending_flight().cloned(),
            selection: self.selection.current().cloned(),
            now_playing: self.player.current().cloned(),
            legends: self.legends.len(),
            stations: self.stations.len(),
            images: self.images.len(),
        }
    }
}

/// Fetches legends, stations and images concurrently without holding the
/// session lock, then applies each result with its ticket.
pub async fn load_all(session: &Mutex<MapSession>, client: &BackendClient) {
    let (legends_ticket, stations_ticket, images_ticket) = {
        let mut session = session.lock().unwrap();
        (
            session.begin_load(LoadKind::Legends),
            session.begin_load(LoadKind::Stations),
            session.begin_load(LoadKind::Images),
        )
    };

    let (legends, stations, images) = tokio::join!(
        client.fetch_legends(),
        client.fetch_stations(),
        client.fetch_images()
    );

    let mut session = session.lock().unwrap();
    session.apply_legends(legends_ticket, legends);
    session.apply_stations(stations_ticket, stations);
    session.apply_images(images_ticket, images);
}
