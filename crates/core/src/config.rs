//! Run configuration for the demo-data generator.
//!
//! [`DemoConfig::default`] is a complete zero-argument configuration; callers
//! override individual fields (the CLI does so from environment variables)
//! and must call [`DemoConfig::validate`] before anything is rendered.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Number of simulated inspection days.
pub const DEFAULT_DAYS: u32 = 5;

/// Length of the shared demo video in seconds.
pub const DEFAULT_DURATION_SECS: u32 = 10;

/// Frame rate of the shared demo video.
pub const DEFAULT_FPS: u32 = 30;

/// Frame width in pixels.
pub const DEFAULT_WIDTH: u32 = 1920;

/// Frame height in pixels.
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Inclusive bounds on the number of descriptors generated per category.
pub const DEFAULT_MIN_DEFECTS: u32 = 2;
pub const DEFAULT_MAX_DEFECTS: u32 = 10;

/// Largest accepted frame width or height in pixels.
pub const MAX_DIMENSION: u32 = 7680;

/// Horizontal distance kept between a defect centre and the road edges.
pub const ROAD_EDGE_MARGIN: u32 = 50;

/// Name of the shared video file inside the run directory.
pub const VIDEO_FILE_NAME: &str = "demo_video.mp4";

// ---------------------------------------------------------------------------
// DemoConfig
// ---------------------------------------------------------------------------

/// Everything a demo run needs to know before it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub days: u32,
    pub duration_secs: u32,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    /// Descriptors generated per defect category, both ends inclusive.
    pub defects_per_category: RangeInclusive<u32>,
    /// Media root on disk (the equivalent of the dashboard's `MEDIA_ROOT`).
    pub output_root: PathBuf,
    /// Per-run subdirectory below `output_root`, recreated on every run.
    pub run_dir: String,
    /// URL prefix under which `output_root` is served (`MEDIA_URL`).
    pub media_url: String,
    /// RNG seed; `None` draws a fresh seed from the OS.
    pub seed: Option<u64>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            duration_secs: DEFAULT_DURATION_SECS,
            fps: DEFAULT_FPS,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            defects_per_category: DEFAULT_MIN_DEFECTS..=DEFAULT_MAX_DEFECTS,
            output_root: PathBuf::from("media"),
            run_dir: "demo".to_string(),
            media_url: "/media/".to_string(),
            seed: None,
        }
    }
}

impl DemoConfig {
    /// Reject configurations that cannot produce a consistent dataset.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.duration_secs == 0 {
            return Err(CoreError::Configuration(
                "duration_secs must be greater than 0".to_string(),
            ));
        }
        if self.fps == 0 {
            return Err(CoreError::Configuration(
                "fps must be greater than 0".to_string(),
            ));
        }
        if self.duration_secs.checked_mul(self.fps).is_none() {
            return Err(CoreError::Configuration(format!(
                "{} s at {} fps exceeds the maximum frame count of {}",
                self.duration_secs,
                self.fps,
                u32::MAX
            )));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(CoreError::Configuration(format!(
                "Dimensions must not exceed {MAX_DIMENSION}px (got {}x{})",
                self.width, self.height
            )));
        }
        if self.days == 0 {
            return Err(CoreError::Configuration(
                "days must be greater than 0".to_string(),
            ));
        }
        if self.defects_per_category.start() > self.defects_per_category.end() {
            return Err(CoreError::Configuration(format!(
                "defect count range is inverted: {} > {}",
                self.defects_per_category.start(),
                self.defects_per_category.end()
            )));
        }
        // The road band is the middle half of the frame; a defect centre needs
        // at least one admissible column after both edge margins.
        let band = self.road_right() - self.road_left();
        if band <= 2 * ROAD_EDGE_MARGIN {
            return Err(CoreError::Configuration(format!(
                "frame width {} leaves no room inside the road band",
                self.width
            )));
        }
        if self.height == 0 {
            return Err(CoreError::Configuration(
                "height must be greater than 0".to_string(),
            ));
        }
        if self.run_dir.is_empty()
            || self.run_dir.contains(['/', '\\'])
            || self.run_dir == "."
            || self.run_dir == ".."
        {
            return Err(CoreError::Configuration(format!(
                "run_dir must be a single path component, got '{}'",
                self.run_dir
            )));
        }
        Ok(())
    }

    /// Frame count of the shared video, always `duration × fps`.
    ///
    /// [`DemoConfig::validate`] rejects products that do not fit in a `u32`.
    pub fn total_frames(&self) -> u32 {
        self.duration_secs.saturating_mul(self.fps)
    }

    /// Timestamp of frame `index` in seconds (unrounded).
    pub fn frame_time(&self, index: u32) -> f64 {
        index as f64 / self.fps as f64
    }

    /// Left edge of the road band (`width / 4`).
    pub fn road_left(&self) -> u32 {
        self.width / 4
    }

    /// Right edge of the road band (`3 · width / 4`).
    pub fn road_right(&self) -> u32 {
        self.width * 3 / 4
    }

    /// Directory that holds the video and still images of this run.
    pub fn run_path(&self) -> PathBuf {
        self.output_root.join(&self.run_dir)
    }

    /// Path of the shared video file.
    pub fn video_path(&self) -> PathBuf {
        self.run_path().join(VIDEO_FILE_NAME)
    }

    /// Public URL of a file stored in the run directory.
    pub fn media_link(&self, file_name: &str) -> String {
        format!("{}{}/{}", self.media_url, self.run_dir, file_name)
    }

    /// Public URL of the shared video, recorded on every batch.
    pub fn video_link(&self) -> String {
        self.media_link(VIDEO_FILE_NAME)
    }
}
