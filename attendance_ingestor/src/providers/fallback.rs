//! Live-then-bundled decorator.

use snafu::ensure;
use tracing::{info, warn};

use crate::models::Fetched;
use crate::providers::{EmptySnafu, Source, SourceError};

/// Tries `live` and substitutes `fallback` when it fails or returns nothing.
///
/// Failures of the live source never reach the caller; an error is returned
/// only when the fallback itself is broken.
pub struct WithFallback<L, F> {
    live: L,
    fallback: F,
}

impl<L, F> WithFallback<L, F>
where
    L: Source,
    F: Source<Query = L::Query, Record = L::Record>,
{
    pub fn new(live: L, fallback: F) -> Self {
        Self { live, fallback }
    }

    /// Fetches records tagged with where they came from.
    pub async fn fetch(&self, query: &L::Query) -> Result<Fetched<L::Record>, SourceError> {
        match self.live.fetch(query).await {
            Ok(records) if !records.is_empty() => {
                info!(source = self.live.name(), records = records.len(), "live fetch");
                return Ok(Fetched::live(records));
            }
            Ok(_) => warn!(
                source = self.live.name(),
                "live source returned no records, using bundled snapshot"
            ),
            Err(err) => warn!(
                source = self.live.name(),
                kind = ?err.kind(),
                error = %err,
                "live fetch failed, using bundled snapshot"
            ),
        }

        let source_name = self.fallback.name();
        let records = self.fallback.fetch(query).await?;
        ensure!(!records.is_empty(), EmptySnafu { source_name });
        Ok(Fetched::fallback(records))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::models::Provenance;
    use crate::providers::StatusSnafu;

    struct Fixed(Vec<u32>);

    #[async_trait]
    impl Source for Fixed {
        type Query = ();
        type Record = u32;

        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self, _query: &()) -> Result<Vec<u32>, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct Unavailable;

    #[async_trait]
    impl Source for Unavailable {
        type Query = ();
        type Record = u32;

        fn name(&self) -> &'static str {
            "unavailable"
        }

        async fn fetch(&self, _query: &()) -> Result<Vec<u32>, SourceError> {
            StatusSnafu {
                source_name: self.name(),
                status: 503u16,
            }
            .fail()
        }
    }

    #[tokio::test]
    async fn live_records_are_tagged_live() {
        let src = WithFallback::new(Fixed(vec![1, 2]), Fixed(vec![9]));
        let got = src.fetch(&()).await.unwrap();
        assert_eq!(got.provenance, Provenance::Live);
        assert_eq!(got.records, vec![1, 2]);
    }

    #[tokio::test]
    async fn empty_live_result_falls_back() {
        let src = WithFallback::new(Fixed(vec![]), Fixed(vec![9]));
        let got = src.fetch(&()).await.unwrap();
        assert_eq!(got, Fetched::fallback(vec![9]));
    }

    #[tokio::test]
    async fn failing_live_source_falls_back() {
        let src = WithFallback::new(Unavailable, Fixed(vec![7]));
        let got = src.fetch(&()).await.unwrap();
        assert_eq!(got.provenance, Provenance::Fallback);
        assert_eq!(got.records, vec![7]);
    }

    #[tokio::test]
    async fn broken_fallback_is_surfaced() {
        let src = WithFallback::new(Fixed(vec![]), Fixed(vec![]));
        let err = src.fetch(&()).await.unwrap_err();
        assert!(matches!(err, SourceError::Empty { source_name: "fixed", .. }));
    }
}
