use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_BACKEND_URL, DEFAULT_BOUNDARIES_URL, DEFAULT_FOCUS_COUNTRY, DEFAULT_PORT, DEFAULT_RADIO_COUNTRY, DEFAULT_RADIO_DIRECTORY_URL,
    DEFAULT_RADIO_LIMIT, HOME_LAT, HOME_LNG, HOME_ZOOM, RADIO_RADIUS_KM,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub port: u16,
    pub backend_url: String,
    pub radio_directory_url: String,
    pub radio_country: String,
    pub radio_limit: u32,
    pub radius_km: f64,
    #[serde(default)]
    pub refresh_radios_on_select: bool,
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
    pub home_lat: f64,
    pub home_lng: f64,
    pub home_zoom: f64,
    pub boundaries_url: String,
    pub focus_country: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            radio_directory_url: DEFAULT_RADIO_DIRECTORY_URL.to_string(),
            radio_country: DEFAULT_RADIO_COUNTRY.to_string(),
            radio_limit: DEFAULT_RADIO_LIMIT,
            radius_km: RADIO_RADIUS_KM,
            refresh_radios_on_select: false,
            auth_token: None,
            home_lat: HOME_LAT,
            home_lng: HOME_LNG,
            home_zoom: HOME_ZOOM,
            boundaries_url: DEFAULT_BOUNDARIES_URL.to_string(),
            focus_country: DEFAULT_FOCUS_COUNTRY.to_string(),
        }
    }
}

// Parses the value if present and well-formed, otherwise keeps the default
fn parse_into<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str, target: &mut T) {
    if let Some(raw) = map.get(key) {
        if let Ok(value) = raw.parse::<T>() {
            *target = value;
        } else {
            tracing::warn!("Ignoring invalid value for '{}' in config: {}", key, raw);
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut settings = Settings::default();
        if !config_path.exists() {
            return Ok(settings);
        }

        let file = File::open(config_path).context("Failed to open config file")?;
        let reader = BufReader::new(file);
        let mut config_map = HashMap::new();

        for line in reader.lines() {
            let line = line.context("Failed to read line from config")?;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                config_map.insert(
                    key.trim().to_string(),
                    value.trim().trim_matches('"').to_string(),
                );
            }
        }

        parse_into(&config_map, "port", &mut settings.port);
        parse_into(&config_map, "radio_limit", &mut settings.radio_limit);
        parse_into(&config_map, "radius_km", &mut settings.radius_km);
        parse_into(&config_map, "refresh_radios_on_select", &mut settings.refresh_radios_on_select);
        parse_into(&config_map, "home_lat", &mut settings.home_lat);
        parse_into(&config_map, "home_lng", &mut settings.home_lng);
        parse_into(&config_map, "home_zoom", &mut settings.home_zoom);

        if let Some(url) = config_map.get("backend_url") {
            settings.backend_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = config_map.get("radio_directory_url") {
            settings.radio_directory_url = url.trim_end_matches('/').to_string();
        }
        if let Some(country) = config_map.get("radio_country") {
            settings.radio_country = country.to_uppercase();
        }
        if let Some(url) = config_map.get("boundaries_url") {
            settings.boundaries_url = url.clone();
        }
        if let Some(country) = config_map.get("focus_country") {
            settings.focus_country = country.to_uppercase();
        }
        if let Some(token) = config_map.get("auth_token") {
            settings.auth_token = Some(token.clone()).filter(|t| !t.is_empty());
        }

        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Creating config directory")?;
        }

        let mut content = String::new();
        content.push_str("# LegendMap Configuration File\n");
        content.push_str(&format!("port = {}\n", self.port));
        content.push_str(&format!("backend_url = \"{}\"\n", self.backend_url));
        content.push_str(&format!("radio_directory_url = \"{}\"\n", self.radio_directory_url));
        content.push_str(&format!("radio_country = {}\n", self.radio_country));
        content.push_str(&format!("radio_limit = {}\n", self.radio_limit));
        content.push_str(&format!("radius_km = {}\n", self.radius_km));
        content.push_str(&format!("refresh_radios_on_select = {}\n", self.refresh_radios_on_select));
        if let Some(ref token) = self.auth_token {
            content.push_str(&format!("auth_token = \"{}\"\n", token));
        }
        content.push_str(&format!("home_lat = {}\n", self.home_lat));
        content.push_str(&format!("home_lng = {}\n", self.home_lng));
        content.push_str(&format!("home_zoom = {}\n", self.home_zoom));
        content.push_str(&format!("boundaries_url = \"{}\"\n", self.boundaries_url));
        content.push_str(&format!("focus_country = {}\n", self.focus_country));

        std::fs::write(config_path, content).context("Failed to write to config file")?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let mut path = std::env::current_exe()
            .unwrap_or_default()
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .to_path_buf();

        if path.ends_with("target/debug") || path.ends_with("target/release") {
            path.pop();
            path.pop();
        }
        path.push("legendmap.ini");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("legendmap-test-{}-{}", std::process::id(), name))
            .join("legendmap.ini")
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = Settings::load_from(&temp_config("missing")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.radius_km, 20.0);
        assert_eq!(settings.home_zoom, 6.0);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = temp_config("roundtrip");
        let settings = Settings {
            port: 4100,
            backend_url: "http://backend.local:9000".to_string(),
            radius_km: 35.5,
            refresh_radios_on_select: true,
            focus_country: "CZE".to_string(),
            auth_token: Some("abc.def".to_string()),
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let path = temp_config("invalid");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "# comment\nport = not-a-port\nradius_km = 12\nbackend_url = \"http://x/\"\nradio_country = de\n",
        )
        .unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.port, DEFAULT_PORT);
        assert_eq!(loaded.radius_km, 12.0);
        assert_eq!(loaded.backend_url, "http://x");
        assert_eq!(loaded.radio_country, "DE");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
