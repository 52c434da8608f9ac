//! Repository for the `detection_batch` table.

use sqlx::SqliteConnection;

use crate::models::batch::{CreateDetectionBatch, DetectionBatch};
use crate::DbPool;

/// Column list for detection_batch queries.
const COLUMNS: &str = "id, start_time, end_time, airport, drone_id, weather_id, \
    temperature, status, video_link, flight_duration, recharge_time, total_frames, \
    video_duration, is_archived, expire_at";

pub struct BatchRepo;

impl BatchRepo {
    /// Insert a batch. Archival fields take their defaults: not archived, no
    /// expiry.
    pub async fn create(
        conn: &mut SqliteConnection,
        input: &CreateDetectionBatch,
    ) -> Result<DetectionBatch, sqlx::Error> {
        let query = format!(
            "INSERT INTO detection_batch
                (start_time, end_time, airport, drone_id, weather_id, temperature,
                 status, video_link, total_frames, video_duration)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DetectionBatch>(&query)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.airport)
            .bind(&input.drone_id)
            .bind(input.weather_id)
            .bind(input.temperature)
            .bind(&input.status)
            .bind(&input.video_link)
            .bind(input.total_frames)
            .bind(input.video_duration)
            .fetch_one(conn)
            .await
    }

    /// List batches, most recent flight first.
    pub async fn list(pool: &DbPool) -> Result<Vec<DetectionBatch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM detection_batch ORDER BY start_time DESC, id ASC");
        sqlx::query_as::<_, DetectionBatch>(&query)
            .fetch_all(pool)
            .await
    }
}
