//! Lookup tables: disease, weather, severity, report and media types.

use roadsim_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row of any `(id, name, code)` lookup table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LookupRow {
    pub id: DbId,
    pub name: String,
    pub code: String,
}

/// A row from the `disease_type` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DiseaseType {
    pub id: DbId,
    pub name: String,
    pub description: String,
}

/// Lookup tables keyed by `(name, code)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTable {
    Weather,
    Severity,
    ReportType,
    MediaType,
}

impl LookupTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Weather => "weather_type",
            Self::Severity => "severity_level",
            Self::ReportType => "report_type",
            Self::MediaType => "media_type",
        }
    }
}
