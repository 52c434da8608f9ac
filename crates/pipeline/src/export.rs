//! Still-image export.

use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use roadsim_core::dataset::DemoDataset;

use crate::error::RunError;
use crate::frame_store::FrameStore;

/// JPEG quality of exported stills.
pub const STILL_QUALITY: u8 = 90;

/// Encode one frame as a JPEG still.
pub fn encode_still(image: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, STILL_QUALITY).encode_image(image)?;
    Ok(buf)
}

/// Write every still the dataset references into `dir`.
///
/// File names shared by several ground-truth rows are written once. Any write
/// failure aborts the export. Returns the paths written, in dataset order.
pub async fn export_stills(
    dir: &Path,
    dataset: &DemoDataset,
    frames: &FrameStore,
) -> Result<Vec<PathBuf>, RunError> {
    let stills = dataset.still_images();
    let mut written = Vec::with_capacity(stills.len());
    for (file_name, frame_index) in stills {
        let bytes = frames
            .get(frame_index)
            .ok_or(RunError::MissingFrame { frame_index })?;
        let path = dir.join(file_name);
        tokio::fs::write(&path, &bytes[..])
            .await
            .map_err(|source| RunError::ExportIo {
                path: path.clone(),
                source,
            })?;
        written.push(path);
    }
    tracing::debug!(count = written.len(), dir = %dir.display(), "Exported stills");
    Ok(written)
}
