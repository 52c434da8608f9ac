//! End-to-end demo run.
//!
//! Order of effects: validate the configuration, generate descriptors,
//! create an empty staging directory next to the run directory, open the
//! video sink, render and encode every frame in index order while retaining
//! labeled frames, finish the video, plan the dataset and write the stills.
//! The dataset is then written inside an open transaction, the staging
//! directory is swapped in place of the run directory, and the transaction
//! commits last.
//!
//! Any failure up to and including the commit aborts the sink, puts the
//! previous run directory back and removes the staging directory, leaving the
//! previous run's files and rows untouched. Nothing after the commit can fail
//! the run.

use std::path::{Path, PathBuf};

use chrono::Utc;
use roadsim_core::config::{DemoConfig, VIDEO_FILE_NAME};
use roadsim_core::dataset::plan_dataset;
use roadsim_core::labels::{LabelAggregator, Track};
use roadsim_core::synth::FrameSynthesizer;
use roadsim_core::trajectory::{
    default_categories, generate_descriptors, DefectCategory, DefectDescriptor, RunContext,
};
use roadsim_db::repositories::{DatasetCounts, DatasetRepo};
use roadsim_db::DbPool;
use serde::Serialize;

use crate::encoder::{VideoFormat, VideoSink};
use crate::error::RunError;
use crate::export::export_stills;
use crate::frame_store::FrameStore;

/// What a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Seed the run used; pass it back through the configuration to reproduce.
    pub seed: u64,
    pub descriptors: usize,
    /// Tracks per batch.
    pub tracks: usize,
    pub total_frames: u32,
    pub labeled_frames: usize,
    pub video_path: PathBuf,
    pub stills_written: usize,
    pub records: DatasetCounts,
}

/// Intermediate result of the rendering pass.
struct RenderOutput {
    tracks: Vec<Track>,
    frames: FrameStore,
}

/// Counts produced once the directory and sink are in use.
struct ProduceOutput {
    tracks: usize,
    labeled_frames: usize,
    stills_written: usize,
    records: DatasetCounts,
}

pub struct DemoRun {
    config: DemoConfig,
    categories: Vec<DefectCategory>,
}

impl DemoRun {
    /// A run over the default crack/pothole catalog.
    pub fn new(config: DemoConfig) -> Self {
        Self {
            config,
            categories: default_categories(),
        }
    }

    /// Execute the run, writing the video through `sink`, the stills under
    /// the run directory and the records into `pool`.
    pub async fn execute(
        &self,
        pool: &DbPool,
        sink: &mut dyn VideoSink,
    ) -> Result<RunSummary, RunError> {
        self.config.validate()?;

        let mut ctx = RunContext::from_seed(self.config.seed);
        let descriptors = generate_descriptors(&mut ctx, &self.config, &self.categories)?;
        tracing::info!(
            seed = ctx.seed(),
            descriptors = descriptors.len(),
            days = self.config.days,
            "Generated defect descriptors"
        );

        let dirs = RunDirs::new(&self.config);
        prepare_dir(&dirs.staging).await?;

        let produced = self.produce(pool, sink, &descriptors, &dirs).await;
        if produced.is_err() {
            sink.abort().await;
        }

        match produced {
            Ok(output) => Ok(RunSummary {
                seed: ctx.seed(),
                descriptors: descriptors.len(),
                tracks: output.tracks,
                total_frames: self.config.total_frames(),
                labeled_frames: output.labeled_frames,
                video_path: self.config.video_path(),
                stills_written: output.stills_written,
                records: output.records,
            }),
            Err(e) => {
                if let Err(cleanup) = remove_dir_if_exists(&dirs.staging).await {
                    tracing::warn!(
                        path = %dirs.staging.display(),
                        error = %cleanup,
                        "Failed to remove staging directory after error"
                    );
                }
                Err(e)
            }
        }
    }

    async fn produce(
        &self,
        pool: &DbPool,
        sink: &mut dyn VideoSink,
        descriptors: &[DefectDescriptor],
        dirs: &RunDirs,
    ) -> Result<ProduceOutput, RunError> {
        let video_path = dirs.staging.join(VIDEO_FILE_NAME);
        let rendered = self.render(sink, descriptors, &video_path).await?;

        let now = Utc::now();
        let dataset = plan_dataset(&self.config, &rendered.tracks, now);
        tracing::debug!(
            batches = dataset.batches.len(),
            tracks = dataset.track_count(),
            ground_truth_frames = dataset.ground_truth_count(),
            "Planned dataset"
        );
        let stills = export_stills(&dirs.staging, &dataset, &rendered.frames).await?;

        let mut tx = pool.begin().await?;
        let records = DatasetRepo::replace_in(&mut *tx, &dataset, now).await?;
        let swap = dirs.swap_in().await?;
        if let Err(e) = tx.commit().await {
            dirs.swap_back(swap).await;
            return Err(e.into());
        }
        dirs.discard_previous(swap).await;
        tracing::info!(
            batches = records.batches,
            tracks = records.tracks,
            ground_truth_frames = records.ground_truth_frames,
            "Persisted demo dataset"
        );

        Ok(ProduceOutput {
            tracks: rendered.tracks.len(),
            labeled_frames: rendered.frames.len(),
            stills_written: stills.len(),
            records,
        })
    }

    /// Render every frame into the sink in index order, collecting labels and
    /// retaining the frames that carry any.
    async fn render(
        &self,
        sink: &mut dyn VideoSink,
        descriptors: &[DefectDescriptor],
        video_path: &Path,
    ) -> Result<RenderOutput, RunError> {
        let format = VideoFormat {
            width: self.config.width,
            height: self.config.height,
            fps: self.config.fps,
        };
        sink.open(video_path, format).await?;

        let synth = FrameSynthesizer::new(&self.config, descriptors);
        let mut aggregator = LabelAggregator::new();
        let mut frames = FrameStore::new();
        for frame in synth.frames() {
            sink.append(&frame.image).await?;
            if !frame.labels.is_empty() {
                frames
                    .retain(frame.index, &frame.image)
                    .map_err(|source| RunError::StillEncoding {
                        frame_index: frame.index,
                        source,
                    })?;
            }
            aggregator.push_frame(frame.labels);
        }
        sink.finish().await?;

        let labels = aggregator.label_count();
        let tracks = aggregator.finish();
        tracing::info!(
            frames = synth.total_frames(),
            labeled_frames = frames.len(),
            labels,
            tracks = tracks.len(),
            retained_bytes = frames.retained_bytes(),
            "Rendered video"
        );
        for track in &tracks {
            tracing::debug!(
                track_id = track.track_id,
                label = %track.label,
                start_frame = track.start_frame,
                end_frame = track.end_frame,
                frames = track.frame_count(),
                "Track"
            );
        }
        Ok(RenderOutput { tracks, frames })
    }
}

/// The run directory and the hidden siblings used to replace it.
struct RunDirs {
    run_dir: PathBuf,
    /// Receives the new run's output.
    staging: PathBuf,
    /// Holds the previous run directory while the new one is committed.
    previous: PathBuf,
}

/// Outcome of [`RunDirs::swap_in`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Swap {
    /// A previous run directory was moved aside.
    Replaced,
    /// There was no run directory yet.
    Created,
}

impl RunDirs {
    fn new(config: &DemoConfig) -> Self {
        let hidden = |suffix: &str| {
            config
                .output_root
                .join(format!(".{}.{suffix}", config.run_dir))
        };
        Self {
            run_dir: config.run_path(),
            staging: hidden("partial"),
            previous: hidden("previous"),
        }
    }

    /// Move the current run directory aside and put the staging directory in
    /// its place. On failure the previous run directory is restored.
    async fn swap_in(&self) -> Result<Swap, RunError> {
        remove_dir_if_exists(&self.previous).await?;
        let swap = match tokio::fs::rename(&self.run_dir, &self.previous).await {
            Ok(()) => Swap::Replaced,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Swap::Created,
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = tokio::fs::rename(&self.staging, &self.run_dir).await {
            if swap == Swap::Replaced {
                self.restore_previous().await;
            }
            return Err(e.into());
        }
        tracing::info!(path = %self.run_dir.display(), "Published run directory");
        Ok(swap)
    }

    /// Undo a successful [`RunDirs::swap_in`]: the new output goes back to
    /// the staging directory and the previous run directory is restored.
    async fn swap_back(&self, swap: Swap) {
        if let Err(e) = tokio::fs::rename(&self.run_dir, &self.staging).await {
            tracing::warn!(
                path = %self.run_dir.display(),
                error = %e,
                "Failed to move new output back to staging"
            );
            return;
        }
        if swap == Swap::Replaced {
            self.restore_previous().await;
        }
    }

    async fn restore_previous(&self) {
        if let Err(e) = tokio::fs::rename(&self.previous, &self.run_dir).await {
            tracing::warn!(
                path = %self.previous.display(),
                error = %e,
                "Failed to restore previous run directory"
            );
        }
    }

    /// Drop the previous run directory once the new dataset is committed.
    async fn discard_previous(&self, swap: Swap) {
        if swap == Swap::Created {
            return;
        }
        if let Err(e) = remove_dir_if_exists(&self.previous).await {
            tracing::warn!(
                path = %self.previous.display(),
                error = %e,
                "Failed to remove previous run directory"
            );
        }
    }
}

/// Remove `dir` and everything under it; a missing directory is not an error.
async fn remove_dir_if_exists(dir: &Path) -> Result<(), std::io::Error> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {
            tracing::debug!(path = %dir.display(), "Removed directory");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Remove `dir` if it exists and create it empty.
async fn prepare_dir(dir: &Path) -> Result<(), RunError> {
    remove_dir_if_exists(dir).await?;
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn dirs_in(root: &Path) -> RunDirs {
        RunDirs::new(&DemoConfig {
            output_root: root.to_path_buf(),
            ..DemoConfig::default()
        })
    }

    fn write_file(dir: &Path, name: &str, contents: &[u8]) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn working_dirs_are_hidden_siblings() {
        let dirs = dirs_in(Path::new("/srv/media"));
        assert_eq!(dirs.run_dir, PathBuf::from("/srv/media/demo"));
        assert_eq!(dirs.staging, PathBuf::from("/srv/media/.demo.partial"));
        assert_eq!(dirs.previous, PathBuf::from("/srv/media/.demo.previous"));
    }

    #[tokio::test]
    async fn prepare_dir_empties_existing_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("demo");
        write_file(&dir, "stale.jpg", b"old");

        prepare_dir(&dir).await.unwrap();

        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn prepare_dir_creates_missing_parents() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("media").join("demo");
        prepare_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn swap_in_then_discard_replaces_previous_run() {
        let root = tempfile::tempdir().unwrap();
        let dirs = dirs_in(root.path());
        write_file(&dirs.run_dir, "old.jpg", b"old");
        write_file(&dirs.staging, "new.jpg", b"new");

        let swap = dirs.swap_in().await.unwrap();
        assert_eq!(swap, Swap::Replaced);
        assert!(!dirs.staging.exists());
        assert_eq!(std::fs::read(dirs.run_dir.join("new.jpg")).unwrap(), b"new");
        assert_eq!(std::fs::read(dirs.previous.join("old.jpg")).unwrap(), b"old");

        dirs.discard_previous(swap).await;
        assert!(!dirs.previous.exists());
    }

    #[tokio::test]
    async fn swap_in_without_previous_run() {
        let root = tempfile::tempdir().unwrap();
        let dirs = dirs_in(root.path());
        write_file(&dirs.staging, "new.jpg", b"new");

        assert_eq!(dirs.swap_in().await.unwrap(), Swap::Created);
        assert!(dirs.run_dir.join("new.jpg").exists());
        assert!(!dirs.previous.exists());
    }

    #[tokio::test]
    async fn failed_swap_in_restores_previous_run() {
        let root = tempfile::tempdir().unwrap();
        let dirs = dirs_in(root.path());
        write_file(&dirs.run_dir, "old.jpg", b"old");
        // No staging directory: the second rename fails after the first one
        // moved the previous run aside.

        let result = dirs.swap_in().await;

        assert_matches!(result, Err(RunError::Io(_)));
        assert_eq!(std::fs::read(dirs.run_dir.join("old.jpg")).unwrap(), b"old");
        assert!(!dirs.previous.exists());
    }

    #[tokio::test]
    async fn swap_back_undoes_swap_in() {
        let root = tempfile::tempdir().unwrap();
        let dirs = dirs_in(root.path());
        write_file(&dirs.run_dir, "old.jpg", b"old");
        write_file(&dirs.staging, "new.jpg", b"new");

        let swap = dirs.swap_in().await.unwrap();
        dirs.swap_back(swap).await;

        assert_eq!(std::fs::read(dirs.run_dir.join("old.jpg")).unwrap(), b"old");
        assert!(!dirs.run_dir.join("new.jpg").exists());
        assert!(dirs.staging.join("new.jpg").exists());
        assert!(!dirs.previous.exists());
    }
}
