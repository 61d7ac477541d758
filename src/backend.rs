//! HTTP client for the legend backend and the radio directory.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{LegendMapError, Result};
use crate::form::NewLegend;
use crate::legend::{ImageRef, LegendRecord};
use crate::radio::StationRecord;
use crate::settings::Settings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    backend_url: String,
    radio_directory_url: String,
    radio_country: String,
    radio_limit: u32,
}

impl BackendClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("legendmap/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(BackendClient {
            http,
            backend_url: settings.backend_url.trim_end_matches('/').to_string(),
            radio_directory_url: settings.radio_directory_url.trim_end_matches('/').to_string(),
            radio_country: settings.radio_country.clone(),
            radio_limit: settings.radio_limit,
        })
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LegendMapError::ServerRejection { status: status.as_u16() });
        }
        Ok(response.json::<T>().await?)
    }

    /// `GET /places`
    pub async fn fetch_legends(&self) -> Result<Vec<LegendRecord>> {
        let url = format!("{}/places", self.backend_url);
        debug!("Fetching legends from {}", url);
        Self::send_json(self.http.get(url)).await
    }

    /// `GET /images`
    pub async fn fetch_images(&self) -> Result<Vec<ImageRef>> {
        let url = format!("{}/images", self.backend_url);
        debug!("Fetching images from {}", url);
        Self::send_json(self.http.get(url)).await
    }

    /// Stations of the configured country, most voted first, broken ones hidden.
    pub async fn fetch_stations(&self) -> Result<Vec<StationRecord>> {
        let url = format!("{}/json/stations/search", self.radio_directory_url);
        debug!("Fetching radio stations from {}", url);
        let limit = self.radio_limit.to_string();
        let request = self.http.get(url).query(&[
            ("limit", limit.as_str()),
            ("countrycode", self.radio_country.as_str()),
            ("hidebroken", "true"),
            ("order", "votes"),
            ("reverse", "true"),
        ]);
        Self::send_json(request).await
    }

    /// `POST /api/add-legend`. Any 2xx counts as an acknowledged write.
    pub async fn submit_legend(&self, legend: &NewLegend, token: Option<&str>) -> Result<()> {
        let url = format!("{}/api/add-legend", self.backend_url);
        let mut request = self.http.post(url).json(legend);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(LegendMapError::ServerRejection { status: status.as_u16() })
        }
    }
}
