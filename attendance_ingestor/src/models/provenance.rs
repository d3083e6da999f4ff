use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a batch of records came from (serde snake_case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Fetched from the upstream API during this run.
    Live,
    /// Loaded from the snapshot bundled with the crate.
    Fallback,
}

impl Provenance {
    /// Stable lowercase code, as persisted.
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Live => "live",
            Provenance::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records plus the provenance of the whole batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<R> {
    /// Never empty when produced by [`WithFallback`](crate::providers::fallback::WithFallback).
    pub records: Vec<R>,
    /// Live or fallback.
    pub provenance: Provenance,
}

impl<R> Fetched<R> {
    /// Tags `records` as live.
    pub fn live(records: Vec<R>) -> Self {
        Self {
            records,
            provenance: Provenance::Live,
        }
    }

    /// Tags `records` as coming from the bundled snapshot.
    pub fn fallback(records: Vec<R>) -> Self {
        Self {
            records,
            provenance: Provenance::Fallback,
        }
    }
}
