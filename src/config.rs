use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

fn default_alphabet() -> String {
    "01".to_string()
}

fn default_max_length_to_check() -> usize {
    10
}

fn default_max_examples() -> usize {
    5
}

fn default_search_bound() -> usize {
    32
}

/// Grading parameters. Missing fields in a config file take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingConfig {
    /// Every character of this string is an input symbol.
    #[serde(default = "default_alphabet")]
    pub alphabet: String,
    /// Longest word listed as a false positive or false negative.
    #[serde(default = "default_max_length_to_check")]
    pub max_length_to_check: usize,
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,
    /// Longest input tried when searching for a counterexample.
    #[serde(default = "default_search_bound")]
    pub search_bound: usize,
}

impl Default for GradingConfig {
    fn default() -> Self {
        GradingConfig {
            alphabet: default_alphabet(),
            max_length_to_check: default_max_length_to_check(),
            max_examples: default_max_examples(),
            search_bound: default_search_bound(),
        }
    }
}

impl GradingConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn alphabet(&self) -> BTreeSet<char> {
        self.alphabet.chars().filter(|c| !c.is_whitespace()).collect()
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GradingConfig::default();
        assert_eq!(config.alphabet(), ['0', '1'].into_iter().collect());
        assert_eq!(config.max_length_to_check, 10);
        assert_eq!(config.max_examples, 5);
        assert_eq!(config.search_bound, 32);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = GradingConfig::from_json(r#"{"alphabet": "ab", "max_examples": 3}"#).unwrap();
        assert_eq!(config.alphabet(), ['a', 'b'].into_iter().collect());
        assert_eq!(config.max_examples, 3);
        assert_eq!(config.max_length_to_check, 10);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(GradingConfig::load("does/not/exist.json").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("fagrade_config_test.json");
        std::fs::write(&path, r#"{"search_bound": 12}"#).unwrap();
        let config = GradingConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.search_bound, 12);
        assert_eq!(config.alphabet, "01");
    }
}
