use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use snafu::{ResultExt, ensure};
use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::models::CityPopulation;
use crate::providers::wikidata::response::EntitiesResponse;
use crate::providers::{
    ApiSnafu, DecodeSnafu, EmptySnafu, RequestSnafu, Source, SourceError, SourceInitError,
    StatusSnafu, build_client,
};

/// Looks up city populations on Wikidata by English Wikipedia title.
///
/// Every dated population statement is emitted, so one city usually yields
/// several records; the feature builder keeps the latest.
pub struct WikidataPopulations {
    client: Client,
    api_url: String,
    batch_size: usize,
}

impl WikidataPopulations {
    /// Creates the adapter from the `[sources]` settings.
    ///
    /// The optional `wikidata_token` is sent as a bearer token.
    pub fn new(cfg: &SourceConfig) -> Result<Self, SourceInitError> {
        let token = cfg.wikidata_token.as_ref().map(|t| t.expose_secret());
        Ok(Self {
            client: build_client(cfg, token)?,
            api_url: cfg.wikidata_api_url.clone(),
            batch_size: cfg.effective_batch_size(),
        })
    }

    async fn fetch_batch(
        &self,
        titles: &[&str],
        out: &mut Vec<CityPopulation>,
    ) -> Result<(), SourceError> {
        let source_name = self.name();
        let joined = titles.join("|");
        let query = [
            ("action", "wbgetentities"),
            ("sites", "enwiki"),
            ("titles", joined.as_str()),
            ("props", "claims|sitelinks"),
            ("sitefilter", "enwiki"),
            ("format", "json"),
        ];
        debug!(url = %self.api_url, titles = titles.len(), "requesting entities");

        let response = self
            .client
            .get(&self.api_url)
            .query(&query)
            .send()
            .await
            .context(RequestSnafu { source_name })?;

        let status = response.status();
        ensure!(
            status.is_success(),
            StatusSnafu {
                source_name,
                status: status.as_u16()
            }
        );

        let body = response.text().await.context(RequestSnafu { source_name })?;
        let decoded: EntitiesResponse =
            serde_json::from_str(&body).context(DecodeSnafu { source_name })?;

        if let Some(err) = decoded.error {
            return ApiSnafu {
                source_name,
                message: format!("{}: {}", err.code, err.info),
            }
            .fail();
        }

        for entity in decoded.entities.values() {
            if entity.missing.is_some() {
                continue;
            }
            let Some(title) = entity.enwiki_title() else {
                continue;
            };
            // Report the city as the caller spelled it.
            let Some(city) = titles.iter().find(|t| same_title(t, title)) else {
                debug!(title, "entity does not match a requested title");
                continue;
            };
            out.extend(
                entity
                    .dated_populations()
                    .into_iter()
                    .map(|(population, as_of)| CityPopulation {
                        city: city.to_string(),
                        population,
                        as_of,
                    }),
            );
        }
        Ok(())
    }
}

#[async_trait]
impl Source for WikidataPopulations {
    type Query = [String];
    type Record = CityPopulation;

    fn name(&self) -> &'static str {
        "wikidata"
    }

    async fn fetch(&self, cities: &[String]) -> Result<Vec<CityPopulation>, SourceError> {
        let mut seen = HashSet::new();
        let titles: Vec<&str> = cities
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty() && seen.insert(c.to_lowercase()))
            .collect();

        let mut out = Vec::new();
        for batch in titles.chunks(self.batch_size) {
            self.fetch_batch(batch, &mut out).await?;
        }

        let found: HashSet<&str> = out.iter().map(|p| p.city.as_str()).collect();
        let unmatched = titles.iter().filter(|t| !found.contains(**t)).count();
        if unmatched > 0 {
            warn!(unmatched, "cities without a dated population on Wikidata");
        }

        ensure!(!out.is_empty(), EmptySnafu { source_name: self.name() });
        info!(
            cities = found.len(),
            records = out.len(),
            "fetched population statements"
        );
        Ok(out)
    }
}

/// Wikipedia titles compare case-insensitively on the first letter and treat
/// `_` as a space; comparing fully case-insensitively is close enough here.
fn same_title(requested: &str, returned: &str) -> bool {
    let norm = |s: &str| s.trim().replace('_', " ").to_lowercase();
    norm(requested) == norm(returned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_match_loosely() {
        assert!(same_title("New_York_City", "New York City"));
        assert!(same_title("paris", "Paris"));
        assert!(!same_title("Paris", "Paris, Texas"));
    }
}
