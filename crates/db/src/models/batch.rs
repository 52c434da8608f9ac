//! Detection batch model and DTO.

use roadsim_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `detection_batch` table: one inspection flight.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DetectionBatch {
    pub id: DbId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub airport: String,
    pub drone_id: String,
    pub weather_id: Option<DbId>,
    pub temperature: Option<f64>,
    pub status: String,
    pub video_link: String,
    pub flight_duration: Option<f64>,
    pub recharge_time: Option<f64>,
    pub total_frames: Option<i64>,
    pub video_duration: Option<f64>,
    pub is_archived: bool,
    pub expire_at: Option<Timestamp>,
}

/// DTO for creating a detection batch.
#[derive(Debug)]
pub struct CreateDetectionBatch {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub airport: String,
    pub drone_id: String,
    pub weather_id: Option<DbId>,
    pub temperature: Option<f64>,
    pub status: String,
    pub video_link: String,
    pub total_frames: Option<i64>,
    pub video_duration: Option<f64>,
}
