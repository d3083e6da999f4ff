//! Source abstraction for the two upstream datasets.
//!
//! This module defines the [`Source`] trait, a unified interface over anything
//! that can produce a batch of records: the live Wikipedia and Wikidata
//! adapters, and the snapshots bundled with the crate.
//!
//! The trait is async and object-safe through `async_trait`, so strategies can
//! be composed at runtime. [`fallback::WithFallback`] is the decorator that
//! tries a live source first and substitutes the bundled one on failure.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use attendance_ingestor::models::Attraction;
//! use attendance_ingestor::providers::{Source, SourceError};
//!
//! struct Fixed;
//!
//! #[async_trait]
//! impl Source for Fixed {
//!     type Query = ();
//!     type Record = Attraction;
//!
//!     fn name(&self) -> &'static str {
//!         "fixed"
//!     }
//!
//!     async fn fetch(&self, _query: &()) -> Result<Vec<Attraction>, SourceError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod bundled;
pub mod fallback;
pub mod wikidata;
pub mod wikipedia;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::{Attraction, CityPopulation};

/// Trait for fetching one batch of records from an upstream.
///
/// Implementations must not touch persisted state; network I/O is their only
/// side effect.
#[async_trait]
pub trait Source: Send + Sync {
    /// What the caller asks for (`()` for a full list, city names for a lookup).
    type Query: ?Sized + Sync;
    /// Record type produced.
    type Record: Send;

    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Fetches the records answering `query`.
    async fn fetch(&self, query: &Self::Query) -> Result<Vec<Self::Record>, SourceError>;
}

#[async_trait]
impl<S: Source + ?Sized> Source for Box<S> {
    type Query = S::Query;
    type Record = S::Record;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn fetch(&self, query: &Self::Query) -> Result<Vec<Self::Record>, SourceError> {
        (**self).fetch(query).await
    }
}

/// Boxed attraction source, chosen at runtime.
pub type AttractionSource = Box<dyn Source<Query = (), Record = Attraction>>;
/// Boxed population source, chosen at runtime.
pub type PopulationSource = Box<dyn Source<Query = [String], Record = CityPopulation>>;

/// Coarse classification used by callers deciding how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Network failure, timeout, or an upstream refusing the request.
    Unavailable,
    /// The payload did not have the expected shape.
    Parse,
}

/// Errors that can occur while a [`Source`] fetches its records.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceError {
    /// The request did not complete (connection refused, DNS, timeout).
    #[snafu(display("{source_name}: request failed: {source}"))]
    Request {
        source_name: &'static str,
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The upstream answered with a non-success HTTP status.
    #[snafu(display("{source_name}: upstream returned HTTP {status}"))]
    Status {
        source_name: &'static str,
        status: u16,
        backtrace: Backtrace,
    },

    /// The upstream answered with an error payload.
    #[snafu(display("{source_name}: API error: {message}"))]
    Api {
        source_name: &'static str,
        message: String,
        backtrace: Backtrace,
    },

    /// The body was not the JSON we expect.
    #[snafu(display("{source_name}: undecodable response: {source}"))]
    Decode {
        source_name: &'static str,
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// The body decoded but its content drifted from the expected schema.
    #[snafu(display("{source_name}: {message}"))]
    Parse {
        source_name: &'static str,
        message: String,
        backtrace: Backtrace,
    },

    /// The bundled snapshot could not be decoded.
    #[snafu(display("{source_name}: bundled snapshot is corrupt: {source}"))]
    Snapshot {
        source_name: &'static str,
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// The source produced no records at all.
    #[snafu(display("{source_name}: no records"))]
    Empty {
        source_name: &'static str,
        backtrace: Backtrace,
    },
}

impl SourceError {
    /// Unavailable vs parse, for reporting.
    pub fn kind(&self) -> SourceErrorKind {
        match self {
            SourceError::Request { .. } | SourceError::Status { .. } | SourceError::Api { .. } => {
                SourceErrorKind::Unavailable
            }
            SourceError::Decode { .. }
            | SourceError::Parse { .. }
            | SourceError::Snapshot { .. }
            | SourceError::Empty { .. } => SourceErrorKind::Parse,
        }
    }
}

/// Errors that can occur during the creation of a live source.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// Token contains characters that cannot go in a header.
    #[snafu(display("Invalid API token format: {source}"))]
    InvalidToken {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },
}

/// Builds the shared HTTP client for live sources.
pub(crate) fn build_client(
    cfg: &crate::config::SourceConfig,
    bearer: Option<&str>,
) -> Result<reqwest::Client, SourceInitError> {
    use reqwest::header;
    use snafu::ResultExt;

    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );
    if let Some(token) = bearer {
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {token}")).context(InvalidTokenSnafu)?,
        );
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .user_agent(cfg.user_agent.clone())
        .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
        .build()
        .context(ClientBuildSnafu)
}
