//! Label aggregator: groups per-frame observations into tracks.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::synth::FrameLabel;
use crate::types::TrackId;

/// Every observation of one defect, ordered by frame index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub track_id: TrackId,
    pub label: String,
    pub start_frame: u32,
    pub end_frame: u32,
    pub start_time: f64,
    pub end_time: f64,
    pub frames: Vec<FrameLabel>,
}

impl Track {
    /// Build a track from the observations of a single track id.
    ///
    /// Returns `None` for an empty observation list; tracks are never empty.
    fn from_labels(track_id: TrackId, mut frames: Vec<FrameLabel>) -> Option<Self> {
        frames.sort_by_key(|l| l.frame_index);
        frames.dedup_by_key(|l| l.frame_index);
        let (label, start_frame, start_time) = frames
            .first()
            .map(|l| (l.label.clone(), l.frame_index, l.time_secs))?;
        let (end_frame, end_time) = frames.last().map(|l| (l.frame_index, l.time_secs))?;
        Some(Self {
            track_id,
            label,
            start_frame,
            end_frame,
            start_time,
            end_time,
            frames,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Collects labels frame by frame and produces tracks ordered by track id.
///
/// Entries only exist for track ids that received a label, so no track comes
/// out empty.
#[derive(Debug, Default)]
pub struct LabelAggregator {
    by_track: BTreeMap<TrackId, Vec<FrameLabel>>,
}

impl LabelAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of one frame's labels.
    pub fn push_frame(&mut self, labels: impl IntoIterator<Item = FrameLabel>) {
        for label in labels {
            self.by_track.entry(label.track_id).or_default().push(label);
        }
    }

    /// Number of labels collected so far.
    pub fn label_count(&self) -> usize {
        self.by_track.values().map(Vec::len).sum()
    }

    pub fn finish(self) -> Vec<Track> {
        self.by_track
            .into_iter()
            .filter_map(|(id, labels)| Track::from_labels(id, labels))
            .collect()
    }
}

/// Group a flat label stream into tracks.
pub fn aggregate(labels: impl IntoIterator<Item = FrameLabel>) -> Vec<Track> {
    let mut aggregator = LabelAggregator::new();
    aggregator.push_frame(labels);
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoConfig;
    use crate::geometry::NormalizedBox;
    use crate::synth::FrameSynthesizer;
    use crate::trajectory::{default_categories, generate_descriptors, RunContext};

    fn label(track_id: TrackId, frame_index: u32) -> FrameLabel {
        FrameLabel {
            track_id,
            label: if track_id % 2 == 0 { "crack" } else { "pothole" }.to_string(),
            frame_index,
            time_secs: frame_index as f64 / 30.0,
            bbox: NormalizedBox {
                x: 0.1,
                y: 0.1,
                width: 0.1,
                height: 0.1,
            },
        }
    }

    #[test]
    fn groups_and_sorts_out_of_order_labels() {
        let tracks = aggregate(vec![
            label(1, 12),
            label(0, 5),
            label(1, 10),
            label(0, 4),
            label(1, 11),
        ]);
        assert_eq!(tracks.len(), 2);

        assert_eq!(tracks[0].track_id, 0);
        assert_eq!(tracks[0].start_frame, 4);
        assert_eq!(tracks[0].end_frame, 5);
        assert_eq!(tracks[0].label, "crack");

        let t1 = &tracks[1];
        let indices: Vec<u32> = t1.frames.iter().map(|l| l.frame_index).collect();
        assert_eq!(indices, vec![10, 11, 12]);
        assert_eq!(t1.start_frame, 10);
        assert_eq!(t1.end_frame, 12);
        assert!((t1.start_time - 10.0 / 30.0).abs() < 1e-12);
        assert!((t1.end_time - 12.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn duplicate_frame_indices_collapse() {
        let tracks = aggregate(vec![label(2, 3), label(2, 3), label(2, 4)]);
        assert_eq!(tracks[0].frame_count(), 2);
    }

    #[test]
    fn empty_input_yields_no_tracks() {
        assert!(aggregate(Vec::new()).is_empty());
    }

    #[test]
    fn synthesized_tracks_are_strictly_increasing() {
        let config = DemoConfig {
            duration_secs: 3,
            fps: 10,
            width: 640,
            height: 360,
            ..DemoConfig::default()
        };
        let mut ctx = RunContext::seeded(21);
        let descriptors = generate_descriptors(&mut ctx, &config, &default_categories()).unwrap();
        let synth = FrameSynthesizer::new(&config, &descriptors);

        let mut aggregator = LabelAggregator::new();
        for index in 0..synth.total_frames() {
            aggregator.push_frame(synth.labels_at(index));
        }
        let total = aggregator.label_count();
        let tracks = aggregator.finish();

        assert_eq!(tracks.iter().map(Track::frame_count).sum::<usize>(), total);
        assert_eq!(tracks.len(), descriptors.len());
        for track in &tracks {
            assert!(!track.frames.is_empty());
            assert!(track.start_frame <= track.end_frame);
            assert!(track
                .frames
                .windows(2)
                .all(|w| w[0].frame_index < w[1].frame_index));
            assert!(track.frames.iter().all(|l| l.track_id == track.track_id));
        }
    }

    #[test]
    fn one_track_per_descriptor_at_one_frame_per_second() {
        let config = DemoConfig {
            fps: 1,
            ..DemoConfig::default()
        };
        let mut ctx = RunContext::seeded(1);
        let descriptors = generate_descriptors(&mut ctx, &config, &default_categories()).unwrap();
        let synth = FrameSynthesizer::new(&config, &descriptors);
        let tracks = aggregate((0..synth.total_frames()).flat_map(|i| synth.labels_at(i)));

        let ids: Vec<TrackId> = tracks.iter().map(|t| t.track_id).collect();
        let expected: Vec<TrackId> = descriptors.iter().map(|d| d.track_id).collect();
        assert_eq!(ids, expected);
    }
}
