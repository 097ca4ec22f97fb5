//! Dashboard configuration loaded from TOML.
//!
//! ```toml
//! [child]
//! name = "Eleonore"
//! birth_date = "2025-05-14"
//!
//! [reference]
//! standard = "who"
//!
//! [source]
//! backend_url = "https://eleonore-backend.onrender.com"
//! ```
//!
//! Relative paths are resolved against the config file's directory.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use growthlab_core::{GrowthStandard, ReferenceSet, TableError};

/// Environment variable that overrides `source.backend_url`.
pub const BACKEND_URL_ENV: &str = "GROWTHLAB_BACKEND_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("reference tables: {0}")]
    Tables(#[from] TableError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub child: ChildConfig,
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub source: SourceConfig,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub birth_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default)]
    pub standard: GrowthStandard,
    /// Custom table file (.toml or .json) replacing the built-in set.
    #[serde(default)]
    pub tables: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub backend_url: Option<String>,
    #[serde(default)]
    pub growth_file: Option<PathBuf>,
    #[serde(default)]
    pub nutrition_file: Option<PathBuf>,
}

impl DashboardConfig {
    /// A config with only a birth date; everything else defaults.
    pub fn for_birth_date(birth_date: NaiveDate) -> Self {
        Self {
            child: ChildConfig {
                name: None,
                birth_date,
            },
            reference: ReferenceConfig::default(),
            source: SourceConfig::default(),
            base_dir: None,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.source.backend_url {
            validate_url(url)?;
        }
        if let Some(name) = &self.child.name {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("child.name must not be blank".into()));
            }
        }
        Ok(())
    }

    /// Resolve a path from the config against the config file's directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Backend URL, with the environment override applied.
    pub fn backend_url(&self) -> Result<Option<String>, ConfigError> {
        let env = std::env::var(BACKEND_URL_ENV).ok();
        resolve_backend_url(env, self.source.backend_url.as_deref())
    }

    /// The reference tables this config selects: a custom file or the built-in set.
    pub fn reference_set(&self) -> Result<ReferenceSet, ConfigError> {
        let set = match &self.reference.tables {
            Some(path) => ReferenceSet::from_file(&self.resolve(path))?,
            None => ReferenceSet::builtin(self.reference.standard)?,
        };
        if set.standard != self.reference.standard {
            log::warn!(
                "reference.standard is {} but the table file declares {}; using the file",
                self.reference.standard,
                set.standard
            );
        }
        Ok(set)
    }
}

fn validate_url(url: &str) -> Result<(), ConfigError> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "backend_url must start with http:// or https:// (got '{url}')"
        )))
    }
}

/// A non-empty environment value wins over the configured URL.
pub fn resolve_backend_url(
    env: Option<String>,
    configured: Option<&str>,
) -> Result<Option<String>, ConfigError> {
    let chosen = env
        .filter(|v| !v.trim().is_empty())
        .or_else(|| configured.map(str::to_string));
    match chosen {
        Some(url) => {
            validate_url(&url)?;
            Ok(Some(url.trim().trim_end_matches('/').to_string()))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[child]
name = "Eleonore"
birth_date = "2025-05-14"

[reference]
standard = "cdc"

[source]
backend_url = "https://eleonore-backend.onrender.com/"
growth_file = "growth.csv"
"#;

    #[test]
    fn parses_full_config() {
        let config = DashboardConfig::from_toml(FULL).unwrap();
        assert_eq!(config.child.name.as_deref(), Some("Eleonore"));
        assert_eq!(
            config.child.birth_date,
            NaiveDate::from_ymd_opt(2025, 5, 14).unwrap()
        );
        assert_eq!(config.reference.standard, GrowthStandard::Cdc);
        assert_eq!(config.source.growth_file, Some(PathBuf::from("growth.csv")));
        assert_eq!(config.source.nutrition_file, None);
    }

    #[test]
    fn sections_other_than_child_are_optional() {
        let config = DashboardConfig::from_toml("[child]\nbirth_date = \"2025-05-14\"\n").unwrap();
        assert_eq!(config.reference.standard, GrowthStandard::Who);
        assert!(config.reference.tables.is_none());
        assert!(config.source.backend_url.is_none());
    }

    #[test]
    fn oms_is_accepted_as_standard() {
        let text = "[child]\nbirth_date = \"2025-05-14\"\n[reference]\nstandard = \"oms\"\n";
        let config = DashboardConfig::from_toml(text).unwrap();
        assert_eq!(config.reference.standard, GrowthStandard::Who);
    }

    #[test]
    fn missing_birth_date_is_parse_error() {
        let err = DashboardConfig::from_toml("[child]\nname = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn rejects_non_http_backend() {
        let text = "[child]\nbirth_date = \"2025-05-14\"\n[source]\nbackend_url = \"ftp://x\"\n";
        let err = DashboardConfig::from_toml(text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }

    #[test]
    fn env_override_wins_and_is_normalized() {
        let url = resolve_backend_url(
            Some("http://localhost:5000/".into()),
            Some("https://eleonore-backend.onrender.com"),
        )
        .unwrap();
        assert_eq!(url.as_deref(), Some("http://localhost:5000"));
    }

    #[test]
    fn blank_env_falls_back_to_config() {
        let url = resolve_backend_url(Some("  ".into()), Some("https://example.org/")).unwrap();
        assert_eq!(url.as_deref(), Some("https://example.org"));
        assert_eq!(resolve_backend_url(None, None).unwrap(), None);
    }

    #[test]
    fn relative_paths_resolve_against_base_dir() {
        let mut config = DashboardConfig::from_toml(FULL).unwrap();
        config.base_dir = Some(PathBuf::from("/srv/dashboard"));
        assert_eq!(
            config.resolve(Path::new("growth.csv")),
            PathBuf::from("/srv/dashboard/growth.csv")
        );
        assert_eq!(
            config.resolve(Path::new("/abs/growth.csv")),
            PathBuf::from("/abs/growth.csv")
        );
    }

    #[test]
    fn builtin_reference_set_follows_standard() {
        let config = DashboardConfig::from_toml(FULL).unwrap();
        let set = config.reference_set().unwrap();
        assert_eq!(set.standard, GrowthStandard::Cdc);
    }
}
