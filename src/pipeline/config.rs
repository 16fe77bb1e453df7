//! Harness configuration.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! `HARNESS_*` environment variables, then command-line flags.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::batch::{BatchConfig, Scheduling};
use crate::error::ConfigError;
use crate::fixture::pools::HOBBIES;
use crate::fixture::DEFAULT_HOBBY_COUNT;
use crate::llm::GenerateOptions;
use crate::scoring::{MetricKind, RubricConfig, LEGACY_BASE_THRESHOLD};
use crate::storage::DEFAULT_RESULTS_ROOT;

/// Named rubric configurations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RubricPreset {
    #[default]
    Basic,
    Extended,
}

impl RubricPreset {
    pub fn config(&self) -> RubricConfig {
        match self {
            RubricPreset::Basic => RubricConfig::basic(),
            RubricPreset::Extended => RubricConfig::extended(),
        }
    }
}

impl fmt::Display for RubricPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RubricPreset::Basic => write!(f, "basic"),
            RubricPreset::Extended => write!(f, "extended"),
        }
    }
}

impl FromStr for RubricPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match RubricConfig::from_preset(s) {
            Some(config) if config == RubricConfig::extended() => Ok(RubricPreset::Extended),
            Some(_) => Ok(RubricPreset::Basic),
            None => Err(format!("unknown rubric '{s}' (expected basic or extended)")),
        }
    }
}

/// Configuration for a generation and evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Fixtures per condition.
    pub count: u32,
    /// Tasks per wave, or tasks in flight for pool scheduling.
    pub concurrency: usize,
    /// Backend model; `None` uses the backend default.
    pub model: Option<String>,
    /// Results root before rubric and model suffixes are applied.
    pub output: PathBuf,
    pub rubric: RubricPreset,
    pub scheduling: Scheduling,
    /// Per-task deadline in seconds.
    pub timeout_secs: u64,
    /// Extra attempts for transient generation failures.
    pub retries: u32,
    /// Fixture RNG seed.
    pub seed: Option<u64>,
    /// Hobbies per fixture.
    pub hobbies: usize,
    pub metric: MetricKind,
    /// Use the historical threshold of 21 for the basic rubric.
    pub legacy_threshold: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            concurrency: 100,
            model: None,
            output: PathBuf::from(DEFAULT_RESULTS_ROOT),
            rubric: RubricPreset::Basic,
            scheduling: Scheduling::Waves,
            timeout_secs: 300,
            retries: 0,
            seed: None,
            hobbies: DEFAULT_HOBBY_COUNT,
            metric: MetricKind::Rubric,
            legacy_threshold: false,
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `HARNESS_COUNT`: Fixtures per condition (default: 1000)
    /// - `HARNESS_CONCURRENCY`: Concurrency limit (default: 100)
    /// - `HARNESS_MODEL`: Backend model
    /// - `HARNESS_OUTPUT`: Results root (default: ./results)
    /// - `HARNESS_RUBRIC`: `basic` or `extended`
    /// - `HARNESS_SCHEDULING`: `waves` or `pool`
    /// - `HARNESS_TIMEOUT_SECS`: Per-task timeout (default: 300)
    /// - `HARNESS_RETRIES`: Retries for transient failures (default: 0)
    /// - `HARNESS_SEED`: Fixture RNG seed
    /// - `HARNESS_HOBBIES`: Hobbies per fixture (default: 2)
    /// - `HARNESS_METRIC`: `rubric`, `text-length` or `moral`
    /// - `HARNESS_LEGACY_THRESHOLD`: Use threshold 21 for the basic rubric
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::default().with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `HARNESS_*` environment overrides on top of this configuration.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("HARNESS_COUNT") {
            self.count = parse_env_value(&val, "HARNESS_COUNT")?;
        }
        if let Some(val) = lookup("HARNESS_CONCURRENCY") {
            self.concurrency = parse_env_value(&val, "HARNESS_CONCURRENCY")?;
        }
        if let Some(val) = lookup("HARNESS_MODEL") {
            self.model = Some(val);
        }
        if let Some(val) = lookup("HARNESS_OUTPUT") {
            self.output = PathBuf::from(val);
        }
        if let Some(val) = lookup("HARNESS_RUBRIC") {
            self.rubric = parse_env_value(&val, "HARNESS_RUBRIC")?;
        }
        if let Some(val) = lookup("HARNESS_SCHEDULING") {
            self.scheduling = parse_env_value(&val, "HARNESS_SCHEDULING")?;
        }
        if let Some(val) = lookup("HARNESS_TIMEOUT_SECS") {
            self.timeout_secs = parse_env_value(&val, "HARNESS_TIMEOUT_SECS")?;
        }
        if let Some(val) = lookup("HARNESS_RETRIES") {
            self.retries = parse_env_value(&val, "HARNESS_RETRIES")?;
        }
        if let Some(val) = lookup("HARNESS_SEED") {
            self.seed = Some(parse_env_value(&val, "HARNESS_SEED")?);
        }
        if let Some(val) = lookup("HARNESS_HOBBIES") {
            self.hobbies = parse_env_value(&val, "HARNESS_HOBBIES")?;
        }
        if let Some(val) = lookup("HARNESS_METRIC") {
            self.metric = parse_env_value(&val, "HARNESS_METRIC")?;
        }
        if let Some(val) = lookup("HARNESS_LEGACY_THRESHOLD") {
            self.legacy_threshold = parse_env_bool(&val, "HARNESS_LEGACY_THRESHOLD")?;
        }
        Ok(self)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::ValidationFailed(
                "count must be greater than 0".to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(ConfigError::ValidationFailed(
                "concurrency must be greater than 0".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.hobbies == 0 || self.hobbies > HOBBIES.len() {
            return Err(ConfigError::ValidationFailed(format!(
                "hobbies must be between 1 and {}",
                HOBBIES.len()
            )));
        }

        if matches!(self.model.as_deref(), Some(m) if m.trim().is_empty()) {
            return Err(ConfigError::ValidationFailed(
                "model cannot be empty".to_string(),
            ));
        }

        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "output cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn rubric_config(&self) -> RubricConfig {
        self.rubric.config()
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Explicit perfect-score threshold, if one overrides the analytic maximum.
    pub fn perfect_threshold(&self) -> Option<u32> {
        (self.legacy_threshold && self.rubric == RubricPreset::Basic)
            .then_some(LEGACY_BASE_THRESHOLD)
    }

    /// Orchestrator settings derived from this configuration.
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig::default()
            .with_count(self.count)
            .with_concurrency(self.concurrency)
            .with_scheduling(self.scheduling)
            .with_task_timeout(self.task_timeout())
            .with_max_retries(self.retries)
            .with_options(GenerateOptions {
                model: self.model.clone(),
            })
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_rubric(mut self, rubric: RubricPreset) -> Self {
        self.rubric = rubric;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_hobbies(mut self, hobbies: usize) -> Self {
        self.hobbies = hobbies;
        self
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.count, 1000);
        assert_eq!(config.concurrency, 100);
        assert_eq!(config.model, None);
        assert_eq!(config.output, PathBuf::from("./results"));
        assert_eq!(config.rubric, RubricPreset::Basic);
        assert_eq!(config.scheduling, Scheduling::Waves);
        assert_eq!(config.task_timeout(), Duration::from_secs(300));
        assert_eq!(config.retries, 0);
        assert_eq!(config.hobbies, 2);
        assert_eq!(config.metric, MetricKind::Rubric);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = HarnessConfig::default()
            .with_overrides(lookup(&[
                ("HARNESS_COUNT", "20"),
                ("HARNESS_CONCURRENCY", "5"),
                ("HARNESS_MODEL", "openai/gpt-4o"),
                ("HARNESS_RUBRIC", "extended"),
                ("HARNESS_SCHEDULING", "pool"),
                ("HARNESS_SEED", "42"),
                ("HARNESS_METRIC", "text-length"),
                ("HARNESS_LEGACY_THRESHOLD", "yes"),
            ]))
            .expect("overrides");

        assert_eq!(config.count, 20);
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.model.as_deref(), Some("openai/gpt-4o"));
        assert_eq!(config.rubric, RubricPreset::Extended);
        assert_eq!(config.scheduling, Scheduling::Pool);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.metric, MetricKind::TextLength);
        assert!(config.legacy_threshold);
    }

    #[test]
    fn test_invalid_override() {
        let err = HarnessConfig::default()
            .with_overrides(lookup(&[("HARNESS_COUNT", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("HARNESS_COUNT"));

        let err = HarnessConfig::default()
            .with_overrides(lookup(&[("HARNESS_RUBRIC", "fancy")]))
            .unwrap_err();
        assert!(err.to_string().contains("HARNESS_RUBRIC"));
    }

    #[test]
    fn test_validation() {
        let config = HarnessConfig::default().with_count(0);
        assert!(config.validate().unwrap_err().to_string().contains("count"));

        let config = HarnessConfig::default().with_concurrency(0);
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("concurrency"));

        let config = HarnessConfig::default().with_timeout_secs(0);
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("timeout_secs"));

        let config = HarnessConfig::default().with_hobbies(0);
        assert!(config.validate().unwrap_err().to_string().contains("hobbies"));

        let config = HarnessConfig::default().with_model("  ");
        assert!(config.validate().unwrap_err().to_string().contains("model"));
    }

    #[test]
    fn test_perfect_threshold() {
        let config = HarnessConfig::default();
        assert_eq!(config.perfect_threshold(), None);

        let legacy = HarnessConfig {
            legacy_threshold: true,
            ..HarnessConfig::default()
        };
        assert_eq!(legacy.perfect_threshold(), Some(21));

        let extended = legacy.with_rubric(RubricPreset::Extended);
        assert_eq!(extended.perfect_threshold(), None);
    }

    #[test]
    fn test_batch_config() {
        let batch = HarnessConfig::default()
            .with_count(7)
            .with_concurrency(3)
            .with_model("gpt-4o")
            .batch_config();
        assert_eq!(batch.count, 7);
        assert_eq!(batch.concurrency, 3);
        assert_eq!(batch.task_timeout, Duration::from_secs(300));
        assert_eq!(batch.options.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            "count: 50\nrubric: extended\nscheduling: pool\noutput: ./out\nmetric: moral"
        )
        .expect("write");

        let config = HarnessConfig::from_yaml_file(file.path()).expect("load");
        assert_eq!(config.count, 50);
        assert_eq!(config.rubric, RubricPreset::Extended);
        assert_eq!(config.scheduling, Scheduling::Pool);
        assert_eq!(config.output, PathBuf::from("./out"));
        assert_eq!(config.metric, MetricKind::Moral);
        assert_eq!(config.concurrency, 100);
    }

    #[test]
    fn test_from_yaml_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "count: 0").expect("write");
        assert!(matches!(
            HarnessConfig::from_yaml_file(file.path()),
            Err(ConfigError::ValidationFailed(_))
        ));

        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "count: [1, 2]").expect("write");
        assert!(matches!(
            HarnessConfig::from_yaml_file(file.path()),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_rubric_preset_parsing() {
        assert_eq!("basic".parse::<RubricPreset>(), Ok(RubricPreset::Basic));
        assert_eq!("more-complex".parse::<RubricPreset>(), Ok(RubricPreset::Extended));
        assert!("other".parse::<RubricPreset>().is_err());
        assert_eq!(RubricPreset::Extended.to_string(), "extended");
    }

    #[test]
    fn test_parse_env_bool() {
        assert!(parse_env_bool("true", "test").unwrap());
        assert!(parse_env_bool("ON", "test").unwrap());
        assert!(!parse_env_bool("0", "test").unwrap());
        assert!(parse_env_bool("maybe", "test").is_err());
    }
}
