//! `roadsim-core`: synthetic road-inspection data, without any I/O.
//!
//! Data flows strictly downward:
//! [`trajectory`] → [`synth`] → [`labels`] → [`dataset`].

pub mod config;
pub mod dataset;
pub mod error;
pub mod geometry;
pub mod labels;
pub mod shape;
pub mod synth;
pub mod trajectory;
pub mod types;
