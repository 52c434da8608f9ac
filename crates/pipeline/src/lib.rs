//! Side-effecting half of the demo generator.
//!
//! [`runner::DemoRun`] drives the pure pieces from `roadsim-core` through a
//! [`encoder::VideoSink`], retains the labeled frames in a
//! [`frame_store::FrameStore`], writes the stills and hands the planned
//! dataset to `roadsim-db` in one transaction.

pub mod encoder;
pub mod error;
pub mod export;
pub mod frame_store;
pub mod runner;

pub use encoder::{EncoderError, FfmpegVideoSink, MemoryVideoSink, VideoFormat, VideoSink};
pub use error::RunError;
pub use runner::{DemoRun, RunSummary};
