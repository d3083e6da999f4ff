//! Source adapters for the attendance pipeline.
//!
//! Two independent upstreams feed the pipeline: a list of attractions with
//! annual visitor counts, and a city population lookup. Each has a live
//! adapter that talks to a public API and a bundled snapshot that ships with
//! the crate. [`providers::fallback::WithFallback`] composes the two so callers
//! always get a non-empty result tagged with its [`models::Provenance`].

pub mod config;
pub mod models;
pub mod providers;
