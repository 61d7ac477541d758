//! The "add legend" form: field rules, touched tracking and submission.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::backend::BackendClient;
use crate::constants::{DEFAULT_CATEGORY_ID, DESCRIPTION_MIN_CHARS, NAME_MIN_CHARS};
use crate::error::{LegendMapError, Result};
use crate::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Description,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Name => write!(f, "name"),
            Field::Description => write!(f, "description"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldError {
    #[error("{field} is required")]
    Required { field: Field },

    #[error("{field} must have at least {min} characters")]
    TooShort { field: Field, min: usize },
}

impl FieldError {
    pub fn field(&self) -> Field {
        match self {
            FieldError::Required { field } | FieldError::TooShort { field, .. } => *field,
        }
    }
}

/// Values typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

fn check(field: Field, value: &str, min: usize) -> Option<FieldError> {
    let chars = value.chars().count();
    if chars == 0 {
        Some(FieldError::Required { field })
    } else if chars < min {
        Some(FieldError::TooShort { field, min })
    } else {
        None
    }
}

/// At most one error per field; empty when the draft can be submitted.
pub fn validate(draft: &LegendDraft) -> Vec<FieldError> {
    [
        check(Field::Name, &draft.name, NAME_MIN_CHARS),
        check(Field::Description, &draft.description, DESCRIPTION_MIN_CHARS),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Body of `POST /api/add-legend`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLegend {
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
    pub category_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
    pub name: String,
}

#[derive(Debug)]
pub struct LegendSubmissionForm {
    user_id: Option<i64>,
    coordinate: Coordinate,
    values: LegendDraft,
    touched_name: bool,
    touched_description: bool,
}

impl LegendSubmissionForm {
    pub fn new(user_id: Option<i64>, coordinate: Coordinate) -> Self {
        LegendSubmissionForm {
            user_id,
            coordinate,
            values: LegendDraft::default(),
            touched_name: false,
            touched_description: false,
        }
    }

    pub fn with_values(mut self, values: LegendDraft) -> Self {
        self.values = values;
        self
    }

    pub fn values(&self) -> &LegendDraft {
        &self.values
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        match field {
            Field::Name => self.values.name = value.into(),
            Field::Description => self.values.description = value.into(),
        }
    }

    /// Marks a field as visited (blur). Errors only show for touched fields.
    pub fn touch(&mut self, field: Field) {
        match field {
            Field::Name => self.touched_name = true,
            Field::Description => self.touched_description = true,
        }
    }

    fn is_touched(&self, field: Field) -> bool {
        match field {
            Field::Name => self.touched_name,
            Field::Description => self.touched_description,
        }
    }

    pub fn visible_errors(&self) -> Vec<FieldError> {
        validate(&self.values)
            .into_iter()
            .filter(|e| self.is_touched(e.field()))
            .collect()
    }

    pub fn payload(&self) -> NewLegend {
        NewLegend {
            user_id: self.user_id,
            category_id: DEFAULT_CATEGORY_ID,
            latitude: self.coordinate.latitude,
            longitude: self.coordinate.longitude,
            description: self.values.description.clone(),
            name: self.values.name.clone(),
        }
    }

    /// Validates and sends the legend. `Ok` means the host should refresh;
    /// on any error the typed values stay in the form.
    pub async fn submit(&mut self, client: &BackendClient, token: Option<&str>) -> Result<()> {
        self.touched_name = true;
        self.touched_description = true;

        let errors = validate(&self.values);
        if !errors.is_empty() {
            return Err(LegendMapError::Validation(errors));
        }

        match client.submit_legend(&self.payload(), token).await {
            Ok(()) => {
                info!("✅ Legend \"{}\" submitted", self.values.name);
                Ok(())
            }
            Err(e) => {
                error!("Legend submission failed: {}", e);
                Err(e)
            }
        }
    }
}
