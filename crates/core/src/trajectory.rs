//! Trajectory generator: random defect descriptors for each defect category.
//!
//! All randomness and track-id assignment flows through a [`RunContext`], so
//! two runs seeded alike produce identical descriptor sets.

use image::Rgb;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::{DemoConfig, ROAD_EDGE_MARGIN};
use crate::error::CoreError;
use crate::geometry::PixelBox;
use crate::shape::Shape;
use crate::types::TrackId;

/// Distance below the frame bottom where every defect path begins.
pub const PATH_OVERSHOOT: i32 = 150;

/// Bounds on the length of a descriptor's visibility window, in seconds.
pub const MIN_WINDOW_SECS: f64 = 0.5;
pub const MAX_WINDOW_SECS: f64 = 1.5;

/// Draws per descriptor before a configuration is declared unable to show it.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 64;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// One disease category and the look of its defects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefectCategory {
    pub label: String,
    pub shape: Shape,
    pub color: [u8; 3],
}

impl DefectCategory {
    pub fn new(label: impl Into<String>, shape: Shape, color: [u8; 3]) -> Self {
        Self {
            label: label.into(),
            shape,
            color,
        }
    }
}

/// The demo catalog: cracks first, then potholes.
pub fn default_categories() -> Vec<DefectCategory> {
    vec![
        DefectCategory::new(
            "crack",
            Shape::Polyline {
                length: 300,
                thickness: 8,
            },
            [30, 30, 30],
        ),
        DefectCategory::new("pothole", Shape::Circle { diameter: 120 }, [80, 80, 80]),
    ]
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// One simulated defect: what it looks like, when it is on screen, and where.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefectDescriptor {
    pub track_id: TrackId,
    pub label: String,
    pub shape: Shape,
    pub color: [u8; 3],
    pub start_secs: f64,
    pub end_secs: f64,
    /// Fixed horizontal centre.
    pub x: i32,
    /// Vertical centre at `start_secs`.
    pub start_y: i32,
    /// Vertical centre at `end_secs`.
    pub end_y: i32,
}

impl DefectDescriptor {
    /// Whether the descriptor is on screen at `time_secs` (both ends inclusive).
    pub fn is_active_at(&self, time_secs: f64) -> bool {
        self.start_secs <= time_secs && time_secs <= self.end_secs
    }

    /// Fractional progress through the time window, clamped to `[0, 1]`.
    pub fn interpolation_ratio(&self, time_secs: f64) -> f64 {
        let span = self.end_secs - self.start_secs;
        if span <= 0.0 {
            return 0.0;
        }
        ((time_secs - self.start_secs) / span).clamp(0.0, 1.0)
    }

    /// Centre of the defect at `time_secs`, truncated to whole pixels.
    pub fn center_at(&self, time_secs: f64) -> (i32, i32) {
        let r = self.interpolation_ratio(time_secs);
        let cy = self.start_y as f64 + r * (self.end_y - self.start_y) as f64;
        (self.x, cy as i32)
    }

    /// Clipped pixel box at `time_secs`, or `None` when the descriptor is
    /// inactive or its box lies outside the frame.
    pub fn visible_box(&self, time_secs: f64, width: u32, height: u32) -> Option<PixelBox> {
        if !self.is_active_at(time_secs) {
            return None;
        }
        let (cx, cy) = self.center_at(time_secs);
        self.shape.raw_bbox(cx, cy).clip_to_frame(width, height)
    }

    /// First frame of the video in which the descriptor gets a label.
    pub fn first_visible_frame(&self, config: &DemoConfig) -> Option<u32> {
        let last_frame = config.total_frames().checked_sub(1)?;
        let fps = config.fps as f64;
        let first = (self.start_secs * fps).floor().max(0.0) as u32;
        let last = ((self.end_secs * fps).ceil() as u32).min(last_frame);
        (first..=last).find(|&index| {
            self.visible_box(config.frame_time(index), config.width, config.height)
                .is_some()
        })
    }

    pub fn rgb(&self) -> Rgb<u8> {
        Rgb(self.color)
    }
}

// ---------------------------------------------------------------------------
// Run context
// ---------------------------------------------------------------------------

/// Per-run mutable state: the RNG and the global track-id counter.
#[derive(Debug)]
pub struct RunContext {
    rng: StdRng,
    next_track_id: TrackId,
    seed: u64,
}

impl RunContext {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next_track_id: 0,
            seed,
        }
    }

    /// Use `seed` when given, otherwise draw one so the run can still be
    /// reproduced from the logged value.
    pub fn from_seed(seed: Option<u64>) -> Self {
        Self::seeded(seed.unwrap_or_else(|| rand::rng().random()))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn allocate_track_id(&mut self) -> TrackId {
        let id = self.next_track_id;
        self.next_track_id += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generate between `count_range.start()` and `count_range.end()` descriptors
/// for one category.
///
/// Windows start uniformly in `[0, max(0.1, duration − 1))` and last
/// `[0.5, 1.5)` seconds, truncated at the video end. Horizontal centres are
/// drawn from the road band minus [`ROAD_EDGE_MARGIN`] on each side. Every
/// path sweeps from `height + 150` to `−150`.
///
/// A placement is kept only if at least one video frame labels it, so every
/// descriptor becomes a non-empty track. When [`MAX_PLACEMENT_ATTEMPTS`]
/// draws in a row miss every frame, the frame rate is too low for the
/// duration and the configuration is rejected.
pub fn generate_category(
    ctx: &mut RunContext,
    config: &DemoConfig,
    category: &DefectCategory,
) -> Result<Vec<DefectDescriptor>, CoreError> {
    config.validate()?;

    let count = ctx.rng.random_range(config.defects_per_category.clone());
    let mut descriptors = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let descriptor = place_descriptor(ctx, config, category).ok_or_else(|| {
            CoreError::Configuration(format!(
                "no frame of a {} s video at {} fps shows a '{}' defect",
                config.duration_secs, config.fps, category.label
            ))
        })?;
        descriptors.push(DefectDescriptor {
            track_id: ctx.allocate_track_id(),
            ..descriptor
        });
    }
    Ok(descriptors)
}

/// Draw placements until one is visible in some frame. The returned
/// descriptor has no track id yet.
fn place_descriptor(
    ctx: &mut RunContext,
    config: &DemoConfig,
    category: &DefectCategory,
) -> Option<DefectDescriptor> {
    let duration = config.duration_secs as f64;
    let x_min = (config.road_left() + ROAD_EDGE_MARGIN) as i32;
    let x_max = (config.road_right() - ROAD_EDGE_MARGIN) as i32;
    let start_span = (duration - 1.0).max(0.1);

    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let start_secs = ctx.rng.random_range(0.0..start_span);
        let window = ctx.rng.random_range(MIN_WINDOW_SECS..MAX_WINDOW_SECS);
        let end_secs = (start_secs + window).min(duration);
        let x = ctx.rng.random_range(x_min..x_max);

        let descriptor = DefectDescriptor {
            track_id: 0,
            label: category.label.clone(),
            shape: category.shape,
            color: category.color,
            start_secs,
            end_secs,
            x,
            start_y: config.height as i32 + PATH_OVERSHOOT,
            end_y: -PATH_OVERSHOOT,
        };
        if descriptor.first_visible_frame(config).is_some() {
            return Some(descriptor);
        }
    }
    None
}

/// Generate descriptors for every category in order, sharing one track-id
/// sequence across categories.
pub fn generate_descriptors(
    ctx: &mut RunContext,
    config: &DemoConfig,
    categories: &[DefectCategory],
) -> Result<Vec<DefectDescriptor>, CoreError> {
    let mut all = Vec::new();
    for category in categories {
        all.extend(generate_category(ctx, config, category)?);
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashSet;

    fn pothole(x: i32, start_secs: f64, end_secs: f64) -> DefectDescriptor {
        DefectDescriptor {
            track_id: 0,
            label: "pothole".into(),
            shape: Shape::Circle { diameter: 120 },
            color: [80, 80, 80],
            start_secs,
            end_secs,
            x,
            start_y: 1230,
            end_y: -150,
        }
    }

    #[test]
    fn ratio_and_center_at_window_midpoint() {
        let d = pothole(1000, 2.0, 3.0);
        assert!((d.interpolation_ratio(2.5) - 0.5).abs() < 1e-12);
        assert_eq!(d.center_at(2.5), (1000, 540));
    }

    #[test]
    fn ratio_is_clamped_outside_window() {
        let d = pothole(1000, 2.0, 3.0);
        assert_eq!(d.interpolation_ratio(1.0), 0.0);
        assert_eq!(d.interpolation_ratio(9.0), 1.0);
        assert_eq!(d.center_at(1.0), (1000, 1230));
        assert_eq!(d.center_at(9.0), (1000, -150));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let d = pothole(1000, 2.0, 3.0);
        assert!(d.is_active_at(2.0));
        assert!(d.is_active_at(3.0));
        assert!(!d.is_active_at(3.01));
    }

    #[test]
    fn generated_descriptors_respect_bounds() {
        let config = DemoConfig::default();
        let mut ctx = RunContext::seeded(7);
        let all = generate_descriptors(&mut ctx, &config, &default_categories()).unwrap();

        assert!(all.len() >= 4 && all.len() <= 20);
        for d in &all {
            assert!(d.start_secs >= 0.0);
            assert!(d.start_secs < d.end_secs);
            assert!(d.end_secs <= config.duration_secs as f64);
            assert!(d.end_secs - d.start_secs < MAX_WINDOW_SECS);
            assert!(d.x >= 530 && d.x < 1390, "x = {}", d.x);
            assert_eq!(d.start_y, 1230);
            assert_eq!(d.end_y, -150);
        }
    }

    #[test]
    fn track_ids_are_global_and_sequential() {
        let config = DemoConfig::default();
        let mut ctx = RunContext::seeded(11);
        let all = generate_descriptors(&mut ctx, &config, &default_categories()).unwrap();

        let ids: Vec<TrackId> = all.iter().map(|d| d.track_id).collect();
        let expected: Vec<TrackId> = (0..all.len() as TrackId).collect();
        assert_eq!(ids, expected);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());

        // Cracks are generated first, so they hold the lowest ids.
        let first_pothole = all.iter().position(|d| d.label == "pothole").unwrap();
        assert!(all[..first_pothole].iter().all(|d| d.label == "crack"));
        assert!(all[first_pothole..].iter().all(|d| d.label == "pothole"));
    }

    #[test]
    fn same_seed_same_descriptors() {
        let config = DemoConfig::default();
        let a = generate_descriptors(&mut RunContext::seeded(42), &config, &default_categories())
            .unwrap();
        let b = generate_descriptors(&mut RunContext::seeded(42), &config, &default_categories())
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fixed_count_range_is_honoured() {
        let config = DemoConfig {
            defects_per_category: 3..=3,
            ..DemoConfig::default()
        };
        let mut ctx = RunContext::seeded(1);
        let all = generate_descriptors(&mut ctx, &config, &default_categories()).unwrap();
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn one_second_video_still_gets_windows() {
        let config = DemoConfig {
            duration_secs: 1,
            ..DemoConfig::default()
        };
        let mut ctx = RunContext::seeded(3);
        let all = generate_descriptors(&mut ctx, &config, &default_categories()).unwrap();
        for d in &all {
            assert!(d.start_secs < 0.1);
            assert!(d.end_secs <= 1.0);
        }
    }

    #[test]
    fn every_descriptor_is_visible_at_low_frame_rate() {
        let config = DemoConfig {
            fps: 1,
            ..DemoConfig::default()
        };
        for seed in 0..20 {
            let mut ctx = RunContext::seeded(seed);
            let all = generate_descriptors(&mut ctx, &config, &default_categories()).unwrap();
            for d in &all {
                let frame = d.first_visible_frame(&config);
                assert!(frame.is_some(), "seed {seed}: {d:?}");
            }
        }
    }

    #[test]
    fn frame_rate_too_low_for_any_window_is_rejected() {
        // One frame at t = 0, while windows start strictly after it.
        let config = DemoConfig {
            duration_secs: 1,
            fps: 1,
            ..DemoConfig::default()
        };
        let mut ctx = RunContext::seeded(4);
        assert_matches!(
            generate_descriptors(&mut ctx, &config, &default_categories()),
            Err(CoreError::Configuration(msg)) if msg.contains("1 fps")
        );
    }

    #[test]
    fn visible_box_follows_window_and_frame() {
        let d = pothole(1000, 2.0, 3.0);
        assert_eq!(
            d.visible_box(2.5, 1920, 1080),
            Some(PixelBox::new(940, 480, 120, 120))
        );
        // Inactive outside the window, and still below the frame at its start.
        assert_eq!(d.visible_box(1.9, 1920, 1080), None);
        assert_eq!(d.visible_box(2.0, 1920, 1080), None);
    }

    #[test]
    fn first_visible_frame_skips_frames_below_the_image() {
        let config = DemoConfig::default();
        let d = pothole(1000, 2.0, 3.0);
        let first = d.first_visible_frame(&config).unwrap();
        // Frame 60 is the window start with the disc entirely below the frame.
        assert!(first > 60 && first < 75, "first = {first}");
        assert!(d.visible_box(config.frame_time(first - 1), 1920, 1080).is_none());
    }

    #[test]
    fn invalid_config_fails_before_generation() {
        let config = DemoConfig {
            duration_secs: 0,
            ..DemoConfig::default()
        };
        let mut ctx = RunContext::seeded(1);
        assert_matches!(
            generate_descriptors(&mut ctx, &config, &default_categories()),
            Err(CoreError::Configuration(_))
        );
    }
}
