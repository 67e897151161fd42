//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Nested keys in env vars use `__`, e.g. `APP_PIPELINE__MIN_SCORE=3.5`.
//! The `[pipeline]` table is extracted into a typed [`PipelineConfig`].

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`Config::load`] but looks for the TOML files under `dir`.
    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.pipeline()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// String value for `key`, or `default` when the key is absent.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get::<String>(key).unwrap_or_else(|_| default.to_string())
    }

    /// Typed `[pipeline]` section. Missing section or fields fall back to defaults.
    pub fn pipeline(&self) -> Result<PipelineConfig> {
        let figment = Figment::from(Serialized::defaults(PipelineConfig::default()))
            .merge(Serialized::defaults(self.pipeline_table()?));
        let config: PipelineConfig = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn pipeline_table(&self) -> Result<figment::value::Dict> {
        match self.figment.extract_inner::<figment::value::Dict>("pipeline") {
            Ok(dict) => Ok(dict),
            Err(e) if e.missing() => Ok(figment::value::Dict::new()),
            Err(e) => Err(Error::InvalidConfig(e.to_string())),
        }
    }
}

/// Similarity metric fixed at index build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Squared euclidean distance, smaller is closer.
    #[default]
    L2,
    /// Cosine similarity, larger is closer.
    Cosine,
}

/// Which language a surviving span has to be written in.
///
/// Parsed from a string: `off`, `question` (alias `on`), or an ISO 639-3
/// code such as `por` for a fixed target language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum LanguageFilter {
    Off,
    #[default]
    MatchQuestion,
    Fixed(String),
}

impl From<String> for LanguageFilter {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "off" | "false" | "none" => Self::Off,
            "on" | "true" | "question" => Self::MatchQuestion,
            code => Self::Fixed(code.to_string()),
        }
    }
}

impl From<LanguageFilter> for String {
    fn from(value: LanguageFilter) -> Self {
        match value {
            LanguageFilter::Off => "off".to_string(),
            LanguageFilter::MatchQuestion => "question".to_string(),
            LanguageFilter::Fixed(code) => code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Retrieval width.
    pub k: usize,
    pub min_score: f32,
    pub max_sequence_length: usize,
    pub language_filter: LanguageFilter,
    pub embed_batch_size: usize,
    pub metric: Metric,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 150,
            k: 8,
            min_score: 2.9,
            max_sequence_length: 512,
            language_filter: LanguageFilter::MatchQuestion,
            embed_batch_size: 32,
            metric: Metric::L2,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.max_sequence_length < 4 {
            return Err(Error::InvalidConfig("max_sequence_length must leave room for special tokens".into()));
        }
        if !self.min_score.is_finite() {
            return Err(Error::InvalidConfig("min_score must be finite".into()));
        }
        if self.embed_batch_size == 0 {
            return Err(Error::InvalidConfig("embed_batch_size must be positive".into()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::{Format, Toml};

    fn config_from(toml: &str) -> Config {
        Config::from_figment(Figment::new().merge(Toml::string(toml)))
    }

    #[test]
    fn missing_pipeline_section_uses_defaults() {
        let config = config_from("[data]\ndocs_dir = \"docs\"\n");
        assert_eq!(config.pipeline().unwrap(), PipelineConfig::default());
        assert_eq!(config.get_or("data.docs_dir", "x"), "docs");
        assert_eq!(config.get_or("data.index_dir", "idx"), "idx");
    }

    #[test]
    fn partial_pipeline_section_overrides_only_given_fields() {
        let config = config_from("[pipeline]\nk = 3\nlanguage_filter = \"por\"\nmetric = \"cosine\"\n");
        let pipeline = config.pipeline().unwrap();
        assert_eq!(pipeline.k, 3);
        assert_eq!(pipeline.language_filter, LanguageFilter::Fixed("por".into()));
        assert_eq!(pipeline.metric, Metric::Cosine);
        assert_eq!(pipeline.chunk_size, 1000);
    }

    #[test]
    fn overlap_not_smaller_than_size_is_rejected() {
        let config = config_from("[pipeline]\nchunk_size = 100\nchunk_overlap = 100\n");
        assert!(matches!(config.pipeline(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn language_filter_parsing() {
        assert_eq!(LanguageFilter::from("off".to_string()), LanguageFilter::Off);
        assert_eq!(LanguageFilter::from("ON".to_string()), LanguageFilter::MatchQuestion);
        assert_eq!(LanguageFilter::from(" eng ".to_string()), LanguageFilter::Fixed("eng".into()));
        assert_eq!(String::from(LanguageFilter::MatchQuestion), "question");
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/srv/docqa");
        assert_eq!(resolve_with_base(base, "index"), PathBuf::from("/srv/docqa/index"));
        assert_eq!(resolve_with_base(base, "/abs/index"), PathBuf::from("/abs/index"));
    }
}
