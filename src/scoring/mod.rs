//! Deterministic structural scoring of generated story documents.
//!
//! Scoring never fails: missing, `null` or mistyped fields simply contribute
//! nothing. The primary metric is the [`rubric`]; [`metric`] provides it
//! behind the [`Metric`] trait together with alternative measurements.

pub mod document;
pub mod metric;
pub mod rubric;

pub use document::{is_truthy, DayEntry, StoryDocument};
pub use metric::{Metric, MetricKind, MoralMetric, RubricMetric, TextLengthMetric};
pub use rubric::{
    breakdown, score, score_document, RubricConfig, ScoreBreakdown, DAYS_IN_WEEK,
    LEGACY_BASE_THRESHOLD,
};
