//! Environment configuration for the `generate-demo-data` binary.

pub mod config;
