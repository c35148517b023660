use std::path::{Path, PathBuf};

use serde::Deserialize;
use sitesearch::{Field, HighlightOptions};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How queries are matched against blocks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchOptions {
    /// Highest accepted match error, 0.0 (exact) to 1.0 (anything).
    pub threshold: f64,
    /// Matched runs shorter than this are not reported.
    pub min_match_char_length: usize,
    pub ignore_case: bool,
    /// Enables `'`, `=`, `^`, `$` and `!` query operators.
    pub extended: bool,
    pub title_weight: f64,
    pub content_weight: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            threshold: 0.2,
            min_match_char_length: 2,
            ignore_case: true,
            extended: true,
            title_weight: 2.0,
            content_weight: 1.0,
        }
    }
}

impl MatchOptions {
    pub fn weight(&self, field: Field) -> f64 {
        match field {
            Field::Title => self.title_weight,
            Field::Content => self.content_weight,
        }
    }

    pub fn total_weight(&self) -> f64 {
        Field::ALL.iter().map(|f| self.weight(*f)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnippetOptions {
    pub context: usize,
    pub max_excerpts: usize,
}

impl Default for SnippetOptions {
    fn default() -> Self {
        let defaults = HighlightOptions::default();
        SnippetOptions {
            context: defaults.context,
            max_excerpts: defaults.max_excerpts,
        }
    }
}

impl SnippetOptions {
    pub fn to_highlight_options(&self) -> HighlightOptions {
        HighlightOptions {
            context: self.context,
            max_excerpts: self.max_excerpts,
            ..HighlightOptions::default()
        }
    }
}

/// Contents of `search.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    #[serde(rename = "match")]
    pub matching: MatchOptions,
    pub snippet: SnippetOptions,
}

impl SearchConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SearchConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(source) => Self::from_toml_str(&source),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.matching;
        if !(0.0..=1.0).contains(&m.threshold) {
            return Err(ConfigError::Invalid(format!(
                "match.threshold must be between 0 and 1, got {}",
                m.threshold
            )));
        }
        if m.min_match_char_length == 0 {
            return Err(ConfigError::Invalid(
                "match.min_match_char_length must be at least 1".into(),
            ));
        }
        if m.title_weight <= 0.0 || m.content_weight <= 0.0 {
            return Err(ConfigError::Invalid("match weights must be positive".into()));
        }
        if self.snippet.max_excerpts == 0 {
            return Err(ConfigError::Invalid(
                "snippet.max_excerpts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = SearchConfig::from_toml_str("").unwrap();
        assert_eq!(config, SearchConfig::default());
        assert_eq!(config.matching.threshold, 0.2);
        assert_eq!(config.matching.min_match_char_length, 2);
        assert_eq!(config.snippet.context, 15);
        assert_eq!(config.snippet.max_excerpts, 4);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SearchConfig::from_toml_str(
            "[match]\nthreshold = 0.4\n\n[snippet]\ncontext = 30\n",
        )
        .unwrap();
        assert_eq!(config.matching.threshold, 0.4);
        assert_eq!(config.matching.title_weight, 2.0);
        assert_eq!(config.snippet.context, 30);
        assert_eq!(config.snippet.max_excerpts, 4);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = SearchConfig::from_toml_str("[match]\nthreshold = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("threshold"));
        assert!(SearchConfig::from_toml_str("[snippet]\nmax_excerpts = 0\n").is_err());
        assert!(SearchConfig::from_toml_str("[match]\ntitle_weight = 0.0\n").is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = SearchConfig::from_toml_str("[match]\nfuzziness = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SearchConfig::load(&dir.path().join("search.toml")).unwrap();
        assert_eq!(config, SearchConfig::default());
    }

    #[test]
    fn weights_by_field() {
        let options = MatchOptions::default();
        assert_eq!(options.weight(Field::Title), 2.0);
        assert_eq!(options.weight(Field::Content), 1.0);
        assert_eq!(options.total_weight(), 3.0);
    }
}
