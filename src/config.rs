/// Runtime configuration.
///
/// Settings come from `popstat.toml` (or the file named by `--config` /
/// `POPSTAT_CONFIG`). A missing file means defaults. After the file is read,
/// `.env` is loaded and `POPSTAT_API_URL` overrides the endpoint.

use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::ingest::ssb::{DEFAULT_REGION_FILTER, SSB_TABLE_URL};
use crate::logging::LogLevel;
use crate::municipalities::REGION_NAME;

pub const DEFAULT_CONFIG_PATH: &str = "./popstat.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PopstatConfig {
    pub api: ApiConfig,
    pub region: RegionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub region_filter: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// County name used for the total row and export file names.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            url: SSB_TABLE_URL.to_string(),
            timeout_secs: 30,
            region_filter: DEFAULT_REGION_FILTER.to_string(),
        }
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        RegionConfig {
            name: REGION_NAME.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: None,
            timestamps: false,
        }
    }
}

impl PopstatConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn log_level(&self) -> LogLevel {
        self.logging.level.parse().unwrap_or(LogLevel::Info)
    }

    /// Label of the aggregate row, e.g. `Totalt Rogaland`.
    pub fn total_label(&self) -> String {
        format!("Totalt {}", self.region.name)
    }
}

/// Parse configuration from TOML text.
pub fn parse_config(text: &str) -> Result<PopstatConfig, Box<dyn Error>> {
    let config: PopstatConfig = toml::from_str(text)?;
    if config.api.url.trim().is_empty() {
        return Err("api.url must not be empty".into());
    }
    if config.api.timeout_secs == 0 {
        return Err("api.timeout_secs must be positive".into());
    }
    Ok(config)
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<PopstatConfig, Box<dyn Error>> {
    let mut config = if path.exists() {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        parse_config(&text).map_err(|e| format!("invalid config {}: {}", path.display(), e))?
    } else {
        PopstatConfig::default()
    };

    dotenv::dotenv().ok();
    if let Ok(url) = std::env::var("POPSTAT_API_URL") {
        if !url.trim().is_empty() {
            config.api.url = url;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = parse_config("").expect("empty TOML is valid");
        assert_eq!(config, PopstatConfig::default());
        assert_eq!(config.api.url, SSB_TABLE_URL);
        assert_eq!(config.api.region_filter, "agg:KommSummer");
        assert_eq!(config.total_label(), "Totalt Rogaland");
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = parse_config(
            r#"
            [api]
            timeout_secs = 5

            [logging]
            level = "debug"
            file = "popstat.log"
            "#,
        )
        .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.api.url, SSB_TABLE_URL);
        assert_eq!(config.log_level(), LogLevel::Debug);
        assert_eq!(config.logging.file.as_deref(), Some("popstat.log"));
        assert_eq!(config.region.name, "Rogaland");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(parse_config("[api]\ntimeout_secs = 0").is_err());
        assert!(parse_config("[api]\nurl = \"  \"").is_err());
        assert!(parse_config("[api]\ntimeout_secs = \"soon\"").is_err());
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        let config = parse_config("[logging]\nlevel = \"chatty\"").unwrap();
        assert_eq!(config.log_level(), LogLevel::Info);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config(Path::new("/nonexistent/popstat.toml")).unwrap();
        assert_eq!(config.api.timeout_secs, 30);
    }
}
