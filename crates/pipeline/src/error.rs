//! Run-level error taxonomy.

use std::path::PathBuf;

use roadsim_core::error::CoreError;

use crate::encoder::EncoderError;

/// Every way a demo run can fail. All of them abort the run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] CoreError),

    #[error("Video encoding failed: {0}")]
    Encoding(#[from] EncoderError),

    #[error("Failed to encode still for frame {frame_index}: {source}")]
    StillEncoding {
        frame_index: u32,
        #[source]
        source: image::ImageError,
    },

    #[error("Frame {frame_index} was not retained for export")]
    MissingFrame { frame_index: u32 },

    #[error("Failed to write still image {}: {source}", path.display())]
    ExportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
