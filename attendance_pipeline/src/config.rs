//! Pipeline configuration: a TOML file plus environment overrides.
//!
//! ```toml
//! database_url = "attendance.db"
//! artifacts_dir = "artifacts"
//!
//! [sources]
//! timeout_secs = 10
//! batch_size = 50
//! ```
//!
//! `DATABASE_URL`, `ARTIFACTS_DIR`, `ATTENDANCE_USER_AGENT` and `WIKIDATA_TOKEN`
//! override the file. Nothing else in the crate reads the environment.

use std::path::{Path, PathBuf};

use attendance_ingestor::config::SourceConfig;
use serde::Deserialize;
use shared_utils::config::{ConfigError, load_toml};
use shared_utils::env::env_override;

/// Explicit configuration threaded into repositories and adapters.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// `postgres://…` for PostgreSQL, otherwise a SQLite path.
    pub database_url: String,
    /// Directory holding one JSON artifact per model version.
    pub artifacts_dir: PathBuf,
    /// Live source settings.
    pub sources: SourceConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database_url: "attendance.db".to_string(),
            artifacts_dir: PathBuf::from("artifacts"),
            sources: SourceConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults or `path`, then environment overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(p) => load_toml(p)?,
            None => Self::default(),
        };
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Some(url) = env_override("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(dir) = env_override("ARTIFACTS_DIR") {
            self.artifacts_dir = PathBuf::from(dir);
        }
        if let Some(agent) = env_override("ATTENDANCE_USER_AGENT") {
            self.sources.user_agent = agent;
        }
        if let Some(token) = env_override("WIKIDATA_TOKEN") {
            self.sources.set_wikidata_token(token);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(invalid("database_url", "must not be empty"));
        }
        if self.artifacts_dir.as_os_str().is_empty() {
            return Err(invalid("artifacts_dir", "must not be empty"));
        }
        if self.sources.timeout_secs == 0 {
            return Err(invalid("sources.timeout_secs", "must be at least 1"));
        }
        if self.sources.user_agent.trim().is_empty() {
            return Err(invalid("sources.user_agent", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;

    use super::*;

    const VARS: [&str; 4] = [
        "DATABASE_URL",
        "ARTIFACTS_DIR",
        "ATTENDANCE_USER_AGENT",
        "WIKIDATA_TOKEN",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: tests touching the environment are #[serial].
            unsafe { std::env::remove_var(var) };
        }
    }

    fn write_toml(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn defaults_without_file() {
        clear_env();
        let cfg = PipelineConfig::load(None).unwrap();
        assert_eq!(cfg.database_url, "attendance.db");
        assert_eq!(cfg.artifacts_dir, PathBuf::from("artifacts"));
        assert_eq!(cfg.sources.timeout_secs, 15);
        assert!(cfg.sources.wikidata_token.is_none());
    }

    #[test]
    #[serial]
    fn file_values_then_env_overrides() {
        clear_env();
        let file = write_toml(
            "database_url = \"from-file.db\"\nartifacts_dir = \"models\"\n\n[sources]\ntimeout_secs = 4\n",
        );
        let cfg = PipelineConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.database_url, "from-file.db");
        assert_eq!(cfg.sources.timeout_secs, 4);

        unsafe {
            std::env::set_var("DATABASE_URL", "postgres://localhost/attendance");
            std::env::set_var("WIKIDATA_TOKEN", "  tok  ");
        }
        let cfg = PipelineConfig::load(Some(file.path())).unwrap();
        clear_env();

        assert_eq!(cfg.database_url, "postgres://localhost/attendance");
        assert_eq!(cfg.artifacts_dir, PathBuf::from("models"));
        assert!(cfg.sources.wikidata_token.is_some());
    }

    #[test]
    #[serial]
    fn unknown_keys_and_bad_values_are_rejected() {
        clear_env();
        let typo = write_toml("databse_url = \"x.db\"\n");
        assert!(matches!(
            PipelineConfig::load(Some(typo.path())),
            Err(ConfigError::Parse { .. })
        ));

        let zero = write_toml("[sources]\ntimeout_secs = 0\n");
        assert!(matches!(
            PipelineConfig::load(Some(zero.path())),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
