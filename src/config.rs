//! Validation settings, read from an optional `hed.toml`.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The file name looked up next to the input when no `--config` is given.
pub const FILE_NAME: &str = "hed.toml";

/// The camel case pattern used when none is configured.
pub const DEFAULT_CAMEL_CASE_PATTERN: &str = "^[a-z]+(?:[A-Z][a-z0-9]*)+$";

/// Settings that tune the rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Whether to warn about tag segments that are neither capitalized nor
    /// camel case.
    pub check_capitalization: bool,

    /// Segments matching this pattern pass the capitalization check.
    camel_case_pattern: String,

    /// Whether leaf tags that are not placeholders accept arbitrary
    /// descendants, as if they carried `extensionAllowed`.
    pub leaf_extension_allowed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            check_capitalization: true,
            camel_case_pattern: default_camel_case_pattern(),
            leaf_extension_allowed: false,
        }
    }
}

/// Errors raised while loading, saving or applying a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("failed to access config file '{path}'")]
    Io {
        /// The config file.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid configuration.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// The configuration could not be serialized.
    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),
    /// The camel case pattern is not a valid regular expression.
    #[error("invalid camel case pattern '{pattern}'")]
    Pattern {
        /// The rejected pattern.
        pattern: String,
        /// The regex error.
        #[source]
        source: regex::Error,
    },
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, if the TOML content is
    /// invalid, or if the camel case pattern does not compile.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.camel_case()?;
        Ok(config)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// The camel case pattern as written.
    #[must_use]
    pub fn camel_case_pattern(&self) -> &str {
        &self.camel_case_pattern
    }

    /// Replaces the camel case pattern.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the configuration unchanged, if the pattern
    /// does not compile.
    pub fn set_camel_case_pattern(&mut self, pattern: String) -> Result<(), ConfigError> {
        compile_pattern(&pattern)?;
        self.camel_case_pattern = pattern;
        Ok(())
    }

    /// Compiles the camel case pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regular expression.
    pub fn camel_case(&self) -> Result<Regex, ConfigError> {
        compile_pattern(&self.camel_case_pattern)
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn default_camel_case_pattern() -> String {
    DEFAULT_CAMEL_CASE_PATTERN.to_string()
}

const fn default_true() -> bool {
    true
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_true")]
        check_capitalization: bool,

        #[serde(default = "default_camel_case_pattern")]
        camel_case_pattern: String,

        #[serde(default)]
        leaf_extension_allowed: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                check_capitalization,
                camel_case_pattern,
                leaf_extension_allowed,
            } => Self {
                check_capitalization,
                camel_case_pattern,
                leaf_extension_allowed,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            check_capitalization: config.check_capitalization,
            camel_case_pattern: config.camel_case_pattern,
            leaf_extension_allowed: config.leaf_extension_allowed,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\ncheck_capitalization = false\ncamel_case_pattern = \"^x\"\nleaf_extension_allowed = true\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert!(!config.check_capitalization);
        assert_eq!(config.camel_case_pattern(), "^x");
        assert!(config.leaf_extension_allowed);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(matches!(error, ConfigError::Io { .. }));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\ncheck_capitalization = \"yes\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn load_rejects_invalid_pattern() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\ncamel_case_pattern = \"[a-z\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::Pattern { .. }));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(FILE_NAME);

        let mut config = Config::default();
        config.leaf_extension_allowed = true;
        config.set_camel_case_pattern("^[a-z]+$".into()).unwrap();
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn default_pattern_accepts_camel_case() {
        let pattern = Config::default().camel_case().unwrap();
        assert!(pattern.is_match("camelCase"));
        assert!(pattern.is_match("eegChannel2"));
        assert!(!pattern.is_match("lowercase"));
        assert!(!pattern.is_match("Capitalized"));
    }

    #[test]
    fn invalid_pattern_is_not_applied() {
        let mut config = Config::default();
        assert!(config.set_camel_case_pattern("(".into()).is_err());
        assert_eq!(config, Config::default());
    }
}
