//! Error types for backend calls and legend submission

use thiserror::Error;

use crate::form::FieldError;

/// Errors surfaced by the map session and its backend client
#[derive(Error, Debug)]
pub enum LegendMapError {
    /// Backend or radio directory could not be reached, or the body was unreadable
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// One or more form fields failed their constraints
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    /// Backend answered with a non-success status
    #[error("Server rejected the request with status {status}")]
    ServerRejection { status: u16 },

    /// Latitude or longitude outside the valid range
    #[error("Invalid coordinate: lat {lat}, lng {lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, LegendMapError>;
