//! Repository layer.
//!
//! Each repository is a zero-sized struct with async methods. Reads accept
//! `&DbPool`; inserts accept `&mut SqliteConnection` so they can run inside
//! a caller's transaction via `&mut *tx`.

pub mod batch_repo;
pub mod dataset_repo;
pub mod ground_truth_repo;
pub mod lookup_repo;
pub mod media_repo;
pub mod report_repo;
pub mod track_repo;

pub use batch_repo::BatchRepo;
pub use dataset_repo::{DatasetCounts, DatasetRepo};
pub use ground_truth_repo::GroundTruthFrameRepo;
pub use lookup_repo::LookupRepo;
pub use media_repo::DiseaseMediaRepo;
pub use report_repo::ReportRepo;
pub use track_repo::DefectTrackRepo;
