//! Repository for the `report` table.

use roadsim_core::types::{DbId, Timestamp};
use sqlx::SqliteConnection;

use crate::models::report::Report;
use crate::DbPool;

const COLUMNS: &str = "id, batch_id, report_type_id, generated_at, file_link, content";

pub struct ReportRepo;

impl ReportRepo {
    /// Insert an empty report for a batch.
    pub async fn create(
        conn: &mut SqliteConnection,
        batch_id: DbId,
        report_type_id: Option<DbId>,
        generated_at: Timestamp,
    ) -> Result<Report, sqlx::Error> {
        let query = format!(
            "INSERT INTO report (batch_id, report_type_id, generated_at)
             VALUES (?1, ?2, ?3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(batch_id)
            .bind(report_type_id)
            .bind(generated_at)
            .fetch_one(conn)
            .await
    }

    pub async fn list_by_batch(pool: &DbPool, batch_id: DbId) -> Result<Vec<Report>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM report WHERE batch_id = ?1 ORDER BY id ASC");
        sqlx::query_as::<_, Report>(&query)
            .bind(batch_id)
            .fetch_all(pool)
            .await
    }
}
