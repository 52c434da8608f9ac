//! Repository for the `defect_track` table.

use roadsim_core::types::DbId;
use sqlx::SqliteConnection;

use crate::models::track::{CreateDefectTrack, DefectTrack};
use crate::DbPool;

/// Column list for defect_track queries.
const COLUMNS: &str = "id, batch_id, disease_type_id, unique_code, severity_id, \
    start_frame, end_frame, start_time, end_time, develop_trend, snapshot_link, report_id";

pub struct DefectTrackRepo;

impl DefectTrackRepo {
    /// Insert a track. Fails if `unique_code` is already taken.
    pub async fn create(
        conn: &mut SqliteConnection,
        input: &CreateDefectTrack,
    ) -> Result<DefectTrack, sqlx::Error> {
        let query = format!(
            "INSERT INTO defect_track
                (batch_id, disease_type_id, unique_code, severity_id, start_frame,
                 end_frame, start_time, end_time, report_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DefectTrack>(&query)
            .bind(input.batch_id)
            .bind(input.disease_type_id)
            .bind(&input.unique_code)
            .bind(input.severity_id)
            .bind(input.start_frame)
            .bind(input.end_frame)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.report_id)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_code(
        pool: &DbPool,
        unique_code: &str,
    ) -> Result<Option<DefectTrack>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM defect_track WHERE unique_code = ?1");
        sqlx::query_as::<_, DefectTrack>(&query)
            .bind(unique_code)
            .fetch_optional(pool)
            .await
    }

    /// List the tracks of a batch in insertion order.
    pub async fn list_by_batch(
        pool: &DbPool,
        batch_id: DbId,
    ) -> Result<Vec<DefectTrack>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM defect_track WHERE batch_id = ?1 ORDER BY id ASC");
        sqlx::query_as::<_, DefectTrack>(&query)
            .bind(batch_id)
            .fetch_all(pool)
            .await
    }
}
