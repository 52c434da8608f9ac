//! Frame synthesizer: renders the road scene and labels every visible defect.
//!
//! Rendering is a pure function of the frame index, so [`FrameSynthesizer`]
//! can hand out as many passes over the frames as a caller needs; only the
//! video encoder downstream is single-pass.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use serde::Serialize;

use crate::config::DemoConfig;
use crate::geometry::NormalizedBox;
use crate::trajectory::DefectDescriptor;
use crate::types::TrackId;

/// Verge colour outside the road band.
pub const GRASS_COLOR: Rgb<u8> = Rgb([34, 139, 34]);

/// Asphalt colour inside the road band.
pub const ROAD_COLOR: Rgb<u8> = Rgb([50, 50, 50]);

/// Centre-line dash colour.
pub const MARKING_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Centre-line pattern: a dash of `DASH_LENGTH` every `DASH_PERIOD` pixels,
/// `DASH_WIDTH` wide, advancing `SCROLL_PER_FRAME` pixels each frame.
pub const DASH_PERIOD: u32 = 80;
pub const DASH_LENGTH: u32 = 40;
pub const DASH_WIDTH: u32 = 10;
pub const SCROLL_PER_FRAME: u32 = 20;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One observation of a defect in one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameLabel {
    pub track_id: TrackId,
    pub label: String,
    pub frame_index: u32,
    /// `frame_index / fps`, rounded to milliseconds.
    pub time_secs: f64,
    pub bbox: NormalizedBox,
}

/// A composited frame together with the labels of the defects drawn on it.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub index: u32,
    pub image: RgbImage,
    pub labels: Vec<FrameLabel>,
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

pub struct FrameSynthesizer<'a> {
    config: &'a DemoConfig,
    descriptors: &'a [DefectDescriptor],
}

impl<'a> FrameSynthesizer<'a> {
    pub fn new(config: &'a DemoConfig, descriptors: &'a [DefectDescriptor]) -> Self {
        Self {
            config,
            descriptors,
        }
    }

    pub fn total_frames(&self) -> u32 {
        self.config.total_frames()
    }

    /// Timestamp of a frame in seconds (unrounded).
    pub fn frame_time(&self, index: u32) -> f64 {
        self.config.frame_time(index)
    }

    /// Labels of every defect visible in frame `index`, in descriptor order.
    ///
    /// Descriptors whose clipped box is empty are not visible and get no label.
    pub fn labels_at(&self, index: u32) -> Vec<FrameLabel> {
        let time = self.frame_time(index);
        let time_secs = round_millis(time);
        let (width, height) = (self.config.width, self.config.height);

        self.descriptors
            .iter()
            .filter_map(|d| {
                let clipped = d.visible_box(time, width, height)?;
                Some(FrameLabel {
                    track_id: d.track_id,
                    label: d.label.clone(),
                    frame_index: index,
                    time_secs,
                    bbox: clipped.normalize(width, height),
                })
            })
            .collect()
    }

    /// Render frame `index`: background, road band, scrolling centre line,
    /// then every active defect in descriptor order.
    pub fn render(&self, index: u32) -> RenderedFrame {
        let mut image = self.render_background(index);
        let time = self.frame_time(index);
        for d in self.descriptors.iter().filter(|d| d.is_active_at(time)) {
            let (cx, cy) = d.center_at(time);
            d.shape.draw(&mut image, cx, cy, d.rgb());
        }
        RenderedFrame {
            index,
            image,
            labels: self.labels_at(index),
        }
    }

    /// Every frame in index order, rendered lazily.
    pub fn frames(&self) -> impl Iterator<Item = RenderedFrame> + '_ {
        (0..self.total_frames()).map(move |index| self.render(index))
    }

    fn render_background(&self, index: u32) -> RgbImage {
        let (width, height) = (self.config.width, self.config.height);
        let mut image = RgbImage::from_pixel(width, height, GRASS_COLOR);

        let road_left = self.config.road_left();
        let road_width = self.config.road_right() - road_left;
        draw_filled_rect_mut(
            &mut image,
            Rect::at(road_left as i32, 0).of_size(road_width, height),
            ROAD_COLOR,
        );

        let phase = (index * SCROLL_PER_FRAME) % DASH_PERIOD;
        let dash_x = (width / 2) as i32 - (DASH_WIDTH / 2) as i32;
        let mut y = -(phase as i32);
        while y < height as i32 {
            let top = y.max(0);
            let bottom = (y + DASH_LENGTH as i32).min(height as i32);
            if bottom > top {
                draw_filled_rect_mut(
                    &mut image,
                    Rect::at(dash_x, top).of_size(DASH_WIDTH, (bottom - top) as u32),
                    MARKING_COLOR,
                );
            }
            y += DASH_PERIOD as i32;
        }
        image
    }
}

fn round_millis(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}
