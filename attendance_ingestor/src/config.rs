//! Settings for the live adapters, threaded into their constructors.

use secrecy::SecretString;
use serde::Deserialize;

/// Default Wikipedia action API endpoint.
pub const WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";
/// Default Wikidata action API endpoint.
pub const WIKIDATA_API_URL: &str = "https://www.wikidata.org/w/api.php";
/// Page holding the attendance table.
pub const ATTRACTIONS_PAGE: &str = "List_of_most-visited_museums";
/// Wikidata caps `wbgetentities` at 50 titles per request.
pub const MAX_BATCH_SIZE: usize = 50;

/// Network settings for the live adapters (the `[sources]` TOML section).
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Wikipedia action API used to read the attendance page.
    pub wikipedia_api_url: String,
    /// Title of the page with the attendance table.
    pub attractions_page: String,
    /// Wikidata action API used for population statements.
    pub wikidata_api_url: String,
    /// User-Agent sent with every request (Wikimedia requires one).
    pub user_agent: String,
    /// Per-request timeout; past it the bundled snapshot is used.
    pub timeout_secs: u64,
    /// Titles per Wikidata request, clamped to `1..=50`.
    pub batch_size: usize,
    /// Optional bearer token for Wikidata. Never read from the file.
    #[serde(skip)]
    pub wikidata_token: Option<SecretString>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            wikipedia_api_url: WIKIPEDIA_API_URL.to_string(),
            attractions_page: ATTRACTIONS_PAGE.to_string(),
            wikidata_api_url: WIKIDATA_API_URL.to_string(),
            user_agent: concat!("attendance_ingestor/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 15,
            batch_size: MAX_BATCH_SIZE,
            wikidata_token: None,
        }
    }
}

impl SourceConfig {
    /// Batch size actually used for Wikidata lookups.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }

    /// Installs the Wikidata bearer token.
    pub fn set_wikidata_token(&mut self, token: String) {
        self.wikidata_token = Some(SecretString::from(token));
    }
}
