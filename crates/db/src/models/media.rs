//! Disease media model.

use roadsim_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `disease_media` table: one still attached to a track.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DiseaseMedia {
    pub id: DbId,
    pub defect_track_id: DbId,
    pub media_type_id: DbId,
    pub file_link: String,
    pub description: String,
}
