//! Repository for the `disease_media` table.

use roadsim_core::types::DbId;
use sqlx::SqliteConnection;

use crate::models::media::DiseaseMedia;
use crate::DbPool;

const COLUMNS: &str = "id, defect_track_id, media_type_id, file_link, description";

pub struct DiseaseMediaRepo;

impl DiseaseMediaRepo {
    pub async fn create(
        conn: &mut SqliteConnection,
        defect_track_id: DbId,
        media_type_id: DbId,
        file_link: &str,
    ) -> Result<DiseaseMedia, sqlx::Error> {
        let query = format!(
            "INSERT INTO disease_media (defect_track_id, media_type_id, file_link)
             VALUES (?1, ?2, ?3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DiseaseMedia>(&query)
            .bind(defect_track_id)
            .bind(media_type_id)
            .bind(file_link)
            .fetch_one(conn)
            .await
    }

    pub async fn list_by_track(
        pool: &DbPool,
        defect_track_id: DbId,
    ) -> Result<Vec<DiseaseMedia>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM disease_media WHERE defect_track_id = ?1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, DiseaseMedia>(&query)
            .bind(defect_track_id)
            .fetch_all(pool)
            .await
    }
}
