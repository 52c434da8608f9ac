//! Row structs and insert DTOs.
//!
//! Each submodule holds a `FromRow` + `Serialize` struct matching the table
//! row and, where rows are created from code, a `Create*` DTO.

pub mod batch;
pub mod ground_truth;
pub mod lookup;
pub mod media;
pub mod report;
pub mod track;
