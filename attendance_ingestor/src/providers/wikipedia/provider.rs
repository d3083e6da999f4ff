use async_trait::async_trait;
use reqwest::Client;
use snafu::{OptionExt, ResultExt, ensure};
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::models::Attraction;
use crate::providers::wikipedia::response::ParseResponse;
use crate::providers::wikipedia::wikitext::parse_attractions;
use crate::providers::{
    ApiSnafu, DecodeSnafu, EmptySnafu, ParseSnafu, RequestSnafu, Source, SourceError,
    SourceInitError, StatusSnafu, build_client,
};

/// Fetches the attendance table from Wikipedia and parses it.
pub struct WikipediaAttractions {
    client: Client,
    api_url: String,
    page: String,
}

impl WikipediaAttractions {
    /// Creates the adapter from the `[sources]` settings.
    pub fn new(cfg: &SourceConfig) -> Result<Self, SourceInitError> {
        Ok(Self {
            client: build_client(cfg, None)?,
            api_url: cfg.wikipedia_api_url.clone(),
            page: cfg.attractions_page.clone(),
        })
    }
}

#[async_trait]
impl Source for WikipediaAttractions {
    type Query = ();
    type Record = Attraction;

    fn name(&self) -> &'static str {
        "wikipedia"
    }

    async fn fetch(&self, _query: &()) -> Result<Vec<Attraction>, SourceError> {
        let source_name = self.name();
        let query = [
            ("action", "parse"),
            ("page", self.page.as_str()),
            ("prop", "wikitext"),
            ("redirects", "1"),
            ("format", "json"),
            ("formatversion", "2"),
        ];
        debug!(url = %self.api_url, page = %self.page, "requesting page wikitext");

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
        let decoded: ParseResponse =
            serde_json::from_str(&body).context(DecodeSnafu { source_name })?;

        if let Some(err) = decoded.error {
            return ApiSnafu {
                source_name,
                message: format!("{}: {}", err.code, err.info),
            }
            .fail();
        }

        let page = decoded.parse.context(ParseSnafu {
            source_name,
            message: "response has no `parse` object",
        })?;

        let attractions = parse_attractions(&page.wikitext).context(ParseSnafu {
            source_name,
            message: format!(
                "no table with name, city and visitor columns on page `{}`",
                page.title
            ),
        })?;
        ensure!(!attractions.is_empty(), EmptySnafu { source_name });

        info!(
            page = %page.title,
            rows = attractions.len(),
            "parsed attraction table"
        );
        Ok(attractions)
    }
}
