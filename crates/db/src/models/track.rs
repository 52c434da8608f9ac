//! Defect track model and DTO.

use roadsim_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `defect_track` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DefectTrack {
    pub id: DbId,
    pub batch_id: DbId,
    pub disease_type_id: DbId,
    pub unique_code: String,
    pub severity_id: Option<DbId>,
    pub start_frame: i64,
    pub end_frame: i64,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub develop_trend: String,
    pub snapshot_link: String,
    pub report_id: Option<DbId>,
}

/// DTO for creating a defect track.
#[derive(Debug)]
pub struct CreateDefectTrack {
    pub batch_id: DbId,
    pub disease_type_id: DbId,
    pub unique_code: String,
    pub severity_id: Option<DbId>,
    pub start_frame: i64,
    pub end_frame: i64,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub report_id: Option<DbId>,
}
