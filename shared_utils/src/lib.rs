//! Small helpers shared by the ingestor and the pipeline crates.

pub mod config;
pub mod env;
