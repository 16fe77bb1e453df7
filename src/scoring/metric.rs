//! Swappable per-document metrics.
//!
//! The rubric is the primary metric. Text length and the moral bonus are
//! alternative signals that reuse the same evaluation loop.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::StoryDocument;
use super::rubric::{self, RubricConfig, DAYS_IN_WEEK};

/// A per-document measurement aggregated by the evaluator.
pub trait Metric: Send + Sync {
    /// Short name used in reports.
    fn name(&self) -> &'static str;

    /// Measures one document.
    fn measure(&self, doc: &StoryDocument, subject_name: &str) -> u64;

    /// Score below which a document is reported as imperfect, if the metric has one.
    fn perfect_threshold(&self) -> Option<u64>;
}

/// Structural rubric score.
#[derive(Debug, Clone)]
pub struct RubricMetric {
    config: RubricConfig,
    threshold: u64,
}

impl RubricMetric {
    /// Uses the analytic maximum of `config` as the perfect threshold.
    pub fn new(config: RubricConfig) -> Self {
        Self {
            threshold: u64::from(config.max_score()),
            config,
        }
    }

    /// Overrides the perfect threshold, e.g. to compare with historical reports.
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = u64::from(threshold);
        self
    }

    pub fn config(&self) -> &RubricConfig {
        &self.config
    }
}

impl Metric for RubricMetric {
    fn name(&self) -> &'static str {
        "rubric"
    }

    fn measure(&self, doc: &StoryDocument, subject_name: &str) -> u64 {
        u64::from(rubric::score_document(doc, subject_name, &self.config))
    }

    fn perfect_threshold(&self) -> Option<u64> {
        Some(self.threshold)
    }
}

/// Characters in the first seven day texts plus ending and moral.
///
/// Lengths are counted in UTF-16 code units so totals line up with earlier
/// result sets. Only counted when a story is present.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLengthMetric;

impl Metric for TextLengthMetric {
    fn name(&self) -> &'static str {
        "text-length"
    }

    fn measure(&self, doc: &StoryDocument, _subject_name: &str) -> u64 {
        if !doc.has_story() {
            return 0;
        }

        let days: u64 = doc
            .story_entries()
            .unwrap_or_default()
            .iter()
            .take(DAYS_IN_WEEK)
            .filter_map(|day| day.text_str())
            .map(utf16_len)
            .sum();

        days + text_len(doc.ending.as_ref()) + text_len(doc.moral.as_ref())
    }

    fn perfect_threshold(&self) -> Option<u64> {
        None
    }
}

/// 1 when the optional moral is present.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoralMetric;

impl Metric for MoralMetric {
    fn name(&self) -> &'static str {
        "moral"
    }

    fn measure(&self, doc: &StoryDocument, _subject_name: &str) -> u64 {
        u64::from(doc.has_moral())
    }

    fn perfect_threshold(&self) -> Option<u64> {
        None
    }
}

fn text_len(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::String(s)) => utf16_len(s),
        _ => 0,
    }
}

fn utf16_len(s: &str) -> u64 {
    s.encode_utf16().count() as u64
}

/// Metric selector used by configuration and the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricKind {
    #[default]
    Rubric,
    TextLength,
    Moral,
}

impl MetricKind {
    /// Builds the metric. `threshold` only applies to the rubric.
    pub fn build(&self, config: RubricConfig, threshold: Option<u32>) -> Box<dyn Metric> {
        match self {
            MetricKind::Rubric => {
                let metric = RubricMetric::new(config);
                match threshold {
                    Some(t) => Box::new(metric.with_threshold(t)),
                    None => Box::new(metric),
                }
            }
            MetricKind::TextLength => Box::new(TextLengthMetric),
            MetricKind::Moral => Box::new(MoralMetric),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::Rubric => "rubric",
            MetricKind::TextLength => "text-length",
            MetricKind::Moral => "moral",
        };
        f.write_str(name)
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rubric" => Ok(MetricKind::Rubric),
            "text-length" | "length" => Ok(MetricKind::TextLength),
            "moral" => Ok(MetricKind::Moral),
            other => Err(format!(
                "unknown metric '{other}' (expected rubric, text-length or moral)"
            )),
        }
    }
}
