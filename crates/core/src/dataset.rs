//! Dataset planning: replicates the track population into one batch per day.
//!
//! The plan is plain data. Writing still images and database rows is left to
//! the pipeline and db crates, which consume a [`DemoDataset`] as-is.

use chrono::Duration;
use serde::Serialize;

use crate::config::DemoConfig;
use crate::geometry::NormalizedBox;
use crate::labels::Track;
use crate::types::{Timestamp, TrackId};

// ---------------------------------------------------------------------------
// Lookup values
// ---------------------------------------------------------------------------

/// A `(name, code)` pair for a lookup table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LookupEntry {
    pub name: &'static str,
    pub code: &'static str,
}

/// Severity assigned to every demo track.
pub const DEMO_SEVERITY: LookupEntry = LookupEntry {
    name: "minor",
    code: "low",
};

/// Report type of the per-batch report.
pub const DAILY_REPORT: LookupEntry = LookupEntry {
    name: "daily report",
    code: "daily",
};

/// Media type of the exported still frames.
pub const IMAGE_MEDIA: LookupEntry = LookupEntry {
    name: "image",
    code: "image",
};

/// Status recorded on every generated batch.
pub const BATCH_STATUS_DONE: &str = "done";

/// Weather condition and the temperature reported with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherOption {
    pub entry: LookupEntry,
    pub temperature: f64,
}

const fn weather(name: &'static str, code: &'static str, temperature: f64) -> WeatherOption {
    WeatherOption {
        entry: LookupEntry { name, code },
        temperature,
    }
}

/// Weather palette, assigned to days round-robin.
pub const WEATHER_PALETTE: [WeatherOption; 5] = [
    weather("sunny", "sunny", 26.0),
    weather("cloudy", "cloudy", 24.0),
    weather("light rain", "rain", 22.0),
    weather("overcast", "overcast", 23.0),
    weather("windy", "windy", 28.0),
];

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// Human-readable, run-unique track code: `DEMO-{day+1}-{index}`.
pub fn track_code(day: u32, index: usize) -> String {
    format!("DEMO-{}-{index}", day + 1)
}

/// Still image file name: `day{day}_{label}_{frame_index}.jpg`.
pub fn still_file_name(day: u32, label: &str, frame_index: u32) -> String {
    format!("day{day}_{label}_{frame_index}.jpg")
}

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

/// One ground-truth observation plus the still image that shows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroundTruthPlan {
    pub frame_index: u32,
    pub time_secs: f64,
    pub bbox: NormalizedBox,
    pub still_file: String,
    pub still_link: String,
}

/// One persisted defect track of one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPlan {
    pub code: String,
    pub track_id: TrackId,
    pub disease: String,
    pub severity: LookupEntry,
    pub start_frame: u32,
    pub end_frame: u32,
    pub start_time: f64,
    pub end_time: f64,
    pub frames: Vec<GroundTruthPlan>,
}

/// One simulated inspection day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchPlan {
    pub day: u32,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub airport: String,
    pub drone_id: String,
    pub weather: LookupEntry,
    pub temperature: f64,
    pub status: &'static str,
    pub video_link: String,
    pub total_frames: u32,
    pub video_duration: f64,
    pub report_type: LookupEntry,
    pub tracks: Vec<TrackPlan>,
}

/// Everything a run persists, for all days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoDataset {
    pub video_link: String,
    pub total_frames: u32,
    pub duration_secs: u32,
    pub media_type: LookupEntry,
    pub batches: Vec<BatchPlan>,
}

impl DemoDataset {
    pub fn track_count(&self) -> usize {
        self.batches.iter().map(|b| b.tracks.len()).sum()
    }

    pub fn ground_truth_count(&self) -> usize {
        self.batches
            .iter()
            .flat_map(|b| &b.tracks)
            .map(|t| t.frames.len())
            .sum()
    }

    /// Every `(file name, frame index)` pair that must exist on disk, without
    /// duplicates, in first-use order.
    pub fn still_images(&self) -> Vec<(&str, u32)> {
        let mut seen = std::collections::HashSet::new();
        self.batches
            .iter()
            .flat_map(|b| &b.tracks)
            .flat_map(|t| &t.frames)
            .filter(|f| seen.insert(f.still_file.as_str()))
            .map(|f| (f.still_file.as_str(), f.frame_index))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Replicate the full track population into `config.days` batches.
///
/// Day `d` is stamped `now − d days`; every batch references the same video
/// and every track, so labels can be cross-checked between days.
pub fn plan_dataset(config: &DemoConfig, tracks: &[Track], now: Timestamp) -> DemoDataset {
    let video_link = config.video_link();
    let batches = (0..config.days)
        .map(|day| {
            let timestamp = now - Duration::days(day as i64);
            let weather = WEATHER_PALETTE[day as usize % WEATHER_PALETTE.len()];
            BatchPlan {
                day,
                start_time: timestamp,
                end_time: timestamp,
                airport: format!("A{}", day + 1),
                drone_id: format!("D{}", day + 1),
                weather: weather.entry,
                temperature: weather.temperature,
                status: BATCH_STATUS_DONE,
                video_link: video_link.clone(),
                total_frames: config.total_frames(),
                video_duration: config.duration_secs as f64,
                report_type: DAILY_REPORT,
                tracks: tracks
                    .iter()
                    .enumerate()
                    .map(|(i, track)| plan_track(config, day, i + 1, track))
                    .collect(),
            }
        })
        .collect();

    DemoDataset {
        video_link,
        total_frames: config.total_frames(),
        duration_secs: config.duration_secs,
        media_type: IMAGE_MEDIA,
        batches,
    }
}

fn plan_track(config: &DemoConfig, day: u32, index: usize, track: &Track) -> TrackPlan {
    TrackPlan {
        code: track_code(day, index),
        track_id: track.track_id,
        disease: track.label.clone(),
        severity: DEMO_SEVERITY,
        start_frame: track.start_frame,
        end_frame: track.end_frame,
        start_time: track.start_time,
        end_time: track.end_time,
        frames: track
            .frames
            .iter()
            .map(|label| {
                let still_file = still_file_name(day, &track.label, label.frame_index);
                GroundTruthPlan {
                    frame_index: label.frame_index,
                    time_secs: label.time_secs,
                    bbox: label.bbox,
                    still_link: config.media_link(&still_file),
                    still_file,
                }
            })
            .collect(),
    }
}
