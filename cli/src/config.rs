use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::read_to_string;
use twig_types::TypeRegistry;

/// Root type name used when no types file is given.
pub const DEFAULT_ROOT: &str = "root";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read types file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse types file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct ConfigToml {
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub path: Option<PathBuf>,
    pub registry: TypeRegistry,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: None,
            registry: TypeRegistry::new([DEFAULT_ROOT]),
        }
    }
}

impl Config {
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let path = if path.is_dir() {
            path.join("twig.toml")
        } else {
            path.to_owned()
        };
        let string = read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_owned(),
                source,
            })?;
        Self::parse(&path, &string)
    }

    /// The first type listed names the root, and so gets code 1.
    pub fn parse(path: &Path, string: &str) -> Result<Self, ConfigError> {
        let ConfigToml { types } = toml::from_str(string).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        tracing::debug!(path = %path.display(), count = types.len(), "loaded types");
        Ok(Config {
            path: Some(path.to_owned()),
            registry: TypeRegistry::new(types),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_in_order() {
        let config = Config::parse(
            Path::new("twig.toml"),
            r#"types = ["doc", "word", "space"]"#,
        )
        .unwrap();
        assert_eq!(config.registry.code_for_name("doc"), Some(1));
        assert_eq!(config.registry.name_for_code(3), Some("space"));
        assert_eq!(config.path.as_deref(), Some(Path::new("twig.toml")));
    }

    #[test]
    fn missing_types_key_is_empty() {
        let config = Config::parse(Path::new("twig.toml"), "").unwrap();
        assert!(config.registry.is_empty());
    }

    #[test]
    fn bad_toml_reports_path() {
        let err = Config::parse(Path::new("bad.toml"), "types = [1,").unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn default_names_root() {
        let config = Config::default();
        assert_eq!(config.registry.name_for_code(1), Some(DEFAULT_ROOT));
        assert!(config.path.is_none());
    }
}
