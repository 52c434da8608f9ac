//! Ground-truth frame model and DTO.

use roadsim_core::geometry::NormalizedBox;
use roadsim_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `ground_truth_frame` table. Box fields are normalized.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GroundTruthFrame {
    pub id: DbId,
    pub track_id: DbId,
    pub frame_index: i64,
    pub time: Option<f64>,
    pub bbox_x: f64,
    pub bbox_y: f64,
    pub bbox_width: f64,
    pub bbox_height: f64,
}

impl GroundTruthFrame {
    pub fn bbox(&self) -> NormalizedBox {
        NormalizedBox {
            x: self.bbox_x,
            y: self.bbox_y,
            width: self.bbox_width,
            height: self.bbox_height,
        }
    }
}

/// DTO for creating a ground-truth frame.
#[derive(Debug)]
pub struct CreateGroundTruthFrame {
    pub track_id: DbId,
    pub frame_index: i64,
    pub time: Option<f64>,
    pub bbox_x: f64,
    pub bbox_y: f64,
    pub bbox_width: f64,
    pub bbox_height: f64,
}
