use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use crate::backend::BackendClient;
use crate::session::{load_all, MapSession};
use crate::settings::Settings;
use super::events::MapEvent;

// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<MapSession>>,
    pub client: BackendClient,
    pub settings: Arc<Mutex<Settings>>,
    pub event_sender: broadcast::Sender<MapEvent>,
}

impl AppState {
    /// Sends commands to every connected page. No subscribers is not an error.
    pub fn publish(&self, events: impl IntoIterator<Item = MapEvent>) {
        for event in events {
            let _ = self.event_sender.send(event);
        }
    }

    /// Re-fetches everything from the backend, then tells the page to redraw.
    pub async fn reload(&self) {
        load_all(&self.session, &self.client).await;
        self.publish([MapEvent::Reload]);
    }

    /// Full view refresh after a write: fresh data, view reset to home,
    /// and every page told to start over.
    pub async fn refresh(&self) {
        load_all(&self.session, &self.client).await;
        self.session.lock().unwrap().reset_view();
        self.publish([MapEvent::Refresh]);
    }
}
