//! Repository for the `ground_truth_frame` table.

use roadsim_core::types::DbId;
use sqlx::SqliteConnection;

use crate::models::ground_truth::{CreateGroundTruthFrame, GroundTruthFrame};
use crate::DbPool;

const COLUMNS: &str = "id, track_id, frame_index, time, bbox_x, bbox_y, bbox_width, bbox_height";

pub struct GroundTruthFrameRepo;

impl GroundTruthFrameRepo {
    pub async fn create(
        conn: &mut SqliteConnection,
        input: &CreateGroundTruthFrame,
    ) -> Result<GroundTruthFrame, sqlx::Error> {
        let query = format!(
            "INSERT INTO ground_truth_frame
                (track_id, frame_index, time, bbox_x, bbox_y, bbox_width, bbox_height)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GroundTruthFrame>(&query)
            .bind(input.track_id)
            .bind(input.frame_index)
            .bind(input.time)
            .bind(input.bbox_x)
            .bind(input.bbox_y)
            .bind(input.bbox_width)
            .bind(input.bbox_height)
            .fetch_one(conn)
            .await
    }

    /// List the observations of a track ordered by frame index.
    pub async fn list_by_track(
        pool: &DbPool,
        track_id: DbId,
    ) -> Result<Vec<GroundTruthFrame>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ground_truth_frame
             WHERE track_id = ?1
             ORDER BY frame_index ASC"
        );
        sqlx::query_as::<_, GroundTruthFrame>(&query)
            .bind(track_id)
            .fetch_all(pool)
            .await
    }
}
