//! Whole-dataset persistence in one transaction.
//!
//! A generated [`DemoDataset`] is written as a unit: either every batch,
//! report, track, media row and ground-truth frame is committed, or none is.

use roadsim_core::dataset::{BatchPlan, DemoDataset, TrackPlan};
use roadsim_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::models::batch::CreateDetectionBatch;
use crate::models::ground_truth::CreateGroundTruthFrame;
use crate::models::lookup::LookupTable;
use crate::models::track::CreateDefectTrack;
use crate::repositories::{
    BatchRepo, DefectTrackRepo, DiseaseMediaRepo, GroundTruthFrameRepo, LookupRepo, ReportRepo,
};
use crate::DbPool;

/// Tables cleared by a reset, children before parents.
const RESET_TABLES: [&str; 10] = [
    "ground_truth_frame",
    "disease_media",
    "defect_track",
    "report",
    "detection_batch",
    "media_type",
    "report_type",
    "severity_level",
    "weather_type",
    "disease_type",
];

/// Row counts of the demo tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DatasetCounts {
    pub batches: i64,
    pub reports: i64,
    pub tracks: i64,
    pub media: i64,
    pub ground_truth_frames: i64,
}

pub struct DatasetRepo;

impl DatasetRepo {
    /// Clear every demo table, then write `dataset`, in one transaction.
    ///
    /// `generated_at` stamps the per-batch reports.
    pub async fn replace(
        pool: &DbPool,
        dataset: &DemoDataset,
        generated_at: Timestamp,
    ) -> Result<DatasetCounts, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let counts = Self::replace_in(&mut tx, dataset, generated_at).await?;
        tx.commit().await?;
        Ok(counts)
    }

    /// Clear every demo table and write `dataset` on a caller-owned
    /// connection, normally an open transaction the caller commits once its
    /// own side effects are in place.
    pub async fn replace_in(
        conn: &mut SqliteConnection,
        dataset: &DemoDataset,
        generated_at: Timestamp,
    ) -> Result<DatasetCounts, sqlx::Error> {
        Self::reset_inner(&mut *conn).await?;
        Self::insert_inner(&mut *conn, dataset, generated_at).await
    }

    /// Write `dataset` next to whatever is already stored, in one transaction.
    ///
    /// Fails and rolls back entirely if any track code is already taken.
    pub async fn insert(
        pool: &DbPool,
        dataset: &DemoDataset,
        generated_at: Timestamp,
    ) -> Result<DatasetCounts, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let counts = Self::insert_inner(&mut tx, dataset, generated_at).await?;
        tx.commit().await?;
        Ok(counts)
    }

    /// Current row counts of the demo tables.
    pub async fn counts(pool: &DbPool) -> Result<DatasetCounts, sqlx::Error> {
        let count = |table: &'static str| async move {
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(pool)
                .await
        };
        Ok(DatasetCounts {
            batches: count("detection_batch").await?,
            reports: count("report").await?,
            tracks: count("defect_track").await?,
            media: count("disease_media").await?,
            ground_truth_frames: count("ground_truth_frame").await?,
        })
    }

    async fn reset_inner(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        for table in RESET_TABLES {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *conn)
                .await?;
        }
        tracing::debug!("Cleared demo tables");
        Ok(())
    }

    async fn insert_inner(
        conn: &mut SqliteConnection,
        dataset: &DemoDataset,
        generated_at: Timestamp,
    ) -> Result<DatasetCounts, sqlx::Error> {
        let media_type_id = LookupRepo::get_or_create(
            &mut *conn,
            LookupTable::MediaType,
            dataset.media_type.name,
            dataset.media_type.code,
        )
        .await?;

        let mut counts = DatasetCounts::default();
        for batch in &dataset.batches {
            let batch_counts =
                Self::insert_batch(&mut *conn, batch, media_type_id, generated_at).await?;
            counts.batches += 1;
            counts.reports += 1;
            counts.tracks += batch_counts.tracks;
            counts.media += batch_counts.media;
            counts.ground_truth_frames += batch_counts.ground_truth_frames;
        }
        Ok(counts)
    }

    async fn insert_batch(
        conn: &mut SqliteConnection,
        batch: &BatchPlan,
        media_type_id: DbId,
        generated_at: Timestamp,
    ) -> Result<DatasetCounts, sqlx::Error> {
        let weather_id = LookupRepo::get_or_create(
            &mut *conn,
            LookupTable::Weather,
            batch.weather.name,
            batch.weather.code,
        )
        .await?;
        let report_type_id = LookupRepo::get_or_create(
            &mut *conn,
            LookupTable::ReportType,
            batch.report_type.name,
            batch.report_type.code,
        )
        .await?;

        let row = BatchRepo::create(
            &mut *conn,
            &CreateDetectionBatch {
                start_time: batch.start_time,
                end_time: batch.end_time,
                airport: batch.airport.clone(),
                drone_id: batch.drone_id.clone(),
                weather_id: Some(weather_id),
                temperature: Some(batch.temperature),
                status: batch.status.to_string(),
                video_link: batch.video_link.clone(),
                total_frames: Some(i64::from(batch.total_frames)),
                video_duration: Some(batch.video_duration),
            },
        )
        .await?;
        let report = ReportRepo::create(&mut *conn, row.id, Some(report_type_id), generated_at).await?;

        let mut counts = DatasetCounts::default();
        for track in &batch.tracks {
            let (media, frames) =
                Self::insert_track(&mut *conn, row.id, report.id, track, media_type_id).await?;
            counts.tracks += 1;
            counts.media += media;
            counts.ground_truth_frames += frames;
        }
        tracing::debug!(
            day = batch.day,
            batch_id = row.id,
            tracks = counts.tracks,
            "Persisted batch"
        );
        Ok(counts)
    }

    async fn insert_track(
        conn: &mut SqliteConnection,
        batch_id: DbId,
        report_id: DbId,
        track: &TrackPlan,
        media_type_id: DbId,
    ) -> Result<(i64, i64), sqlx::Error> {
        let disease_type_id = LookupRepo::get_or_create_disease(&mut *conn, &track.disease).await?;
        let severity_id = LookupRepo::get_or_create(
            &mut *conn,
            LookupTable::Severity,
            track.severity.name,
            track.severity.code,
        )
        .await?;

        let row = DefectTrackRepo::create(
            &mut *conn,
            &CreateDefectTrack {
                batch_id,
                disease_type_id,
                unique_code: track.code.clone(),
                severity_id: Some(severity_id),
                start_frame: i64::from(track.start_frame),
                end_frame: i64::from(track.end_frame),
                start_time: Some(track.start_time),
                end_time: Some(track.end_time),
                report_id: Some(report_id),
            },
        )
        .await?;

        let mut media = 0;
        let mut frames = 0;
        for frame in &track.frames {
            DiseaseMediaRepo::create(&mut *conn, row.id, media_type_id, &frame.still_link).await?;
            media += 1;
            GroundTruthFrameRepo::create(
                &mut *conn,
                &CreateGroundTruthFrame {
                    track_id: row.id,
                    frame_index: i64::from(frame.frame_index),
                    time: Some(frame.time_secs),
                    bbox_x: frame.bbox.x,
                    bbox_y: frame.bbox.y,
                    bbox_width: frame.bbox.width,
                    bbox_height: frame.bbox.height,
                },
            )
            .await?;
            frames += 1;
        }
        Ok((media, frames))
    }
}
