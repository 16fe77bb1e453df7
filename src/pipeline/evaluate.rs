//! Evaluation of persisted artifacts.
//!
//! Scores every result of both conditions and averages the scores over the
//! requested test count. Missing or unparseable results are logged and
//! contribute zero; only a prompt without a recoverable subject name (or an
//! unreadable prompt) aborts the evaluation.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::EvaluationError;
use crate::fixture::{extract_subject_name, Condition};
use crate::scoring::{Metric, StoryDocument};
use crate::storage::{ArtifactKind, ArtifactStore};

/// Aggregate for one condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionSummary {
    pub condition: Condition,
    pub test_count: u32,
    pub total: u64,
    /// `total / test_count`.
    pub average: f64,
    /// Sequence numbers scoring below the perfect threshold.
    pub imperfect: Vec<u32>,
    /// Sequence numbers whose result is not valid JSON.
    pub parse_failures: Vec<u32>,
    /// Sequence numbers without a result artifact.
    pub missing: Vec<u32>,
}

impl ConditionSummary {
    fn new(condition: Condition, test_count: u32) -> Self {
        Self {
            condition,
            test_count,
            total: 0,
            average: 0.0,
            imperfect: Vec::new(),
            parse_failures: Vec::new(),
            missing: Vec::new(),
        }
    }

    fn finish(mut self) -> Self {
        self.average = if self.test_count == 0 {
            0.0
        } else {
            self.total as f64 / f64::from(self.test_count)
        };
        self
    }
}

/// Result of evaluating both conditions.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub metric: String,
    pub threshold: Option<u64>,
    pub polite: ConditionSummary,
    pub impolite: ConditionSummary,
    pub generated_at: DateTime<Utc>,
}

impl EvaluationReport {
    pub fn summary(&self, condition: Condition) -> &ConditionSummary {
        match condition {
            Condition::Polite => &self.polite,
            Condition::Impolite => &self.impolite,
        }
    }

    pub fn polite_average(&self) -> f64 {
        self.polite.average
    }

    pub fn impolite_average(&self) -> f64 {
        self.impolite.average
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Polite score Ø:   {}", self.polite.average)?;
        write!(f, "Impolite score Ø: {}", self.impolite.average)
    }
}

/// Scores stored artifacts with a [`Metric`].
pub struct Evaluator {
    store: Arc<dyn ArtifactStore>,
    metric: Box<dyn Metric>,
}

impl Evaluator {
    pub fn new(store: Arc<dyn ArtifactStore>, metric: Box<dyn Metric>) -> Self {
        Self { store, metric }
    }

    pub fn metric(&self) -> &dyn Metric {
        self.metric.as_ref()
    }

    /// Evaluates sequence numbers `1..=test_count` of both conditions.
    ///
    /// # Errors
    ///
    /// Returns `EvaluationError::NamePatternMissing` if a prompt does not
    /// name its subject, or `EvaluationError::Store` if a prompt cannot be
    /// read.
    pub async fn evaluate(&self, test_count: u32) -> Result<EvaluationReport, EvaluationError> {
        let impolite = self.evaluate_condition(Condition::Impolite, test_count).await?;
        let polite = self.evaluate_condition(Condition::Polite, test_count).await?;

        Ok(EvaluationReport {
            metric: self.metric.name().to_string(),
            threshold: self.metric.perfect_threshold(),
            polite,
            impolite,
            generated_at: Utc::now(),
        })
    }

    /// Evaluates one condition.
    pub async fn evaluate_condition(
        &self,
        condition: Condition,
        test_count: u32,
    ) -> Result<ConditionSummary, EvaluationError> {
        let mut summary = ConditionSummary::new(condition, test_count);
        let threshold = self.metric.perfect_threshold();

        for sequence in 1..=test_count {
            if !self
                .store
                .exists(condition, sequence, ArtifactKind::Result)
                .await?
            {
                warn!(%condition, sequence, "Result missing, counting as 0");
                summary.missing.push(sequence);
                continue;
            }

            let prompt = self
                .store
                .read(condition, sequence, ArtifactKind::Prompt)
                .await?;
            let subject_name = extract_subject_name(&prompt)
                .ok_or(EvaluationError::NamePatternMissing { condition, sequence })?;

            let raw = self
                .store
                .read(condition, sequence, ArtifactKind::Result)
                .await?;
            let document = match StoryDocument::parse(&raw) {
                Ok(document) => document,
                Err(err) => {
                    warn!(%condition, sequence, error = %err, "Error parsing result JSON");
                    summary.parse_failures.push(sequence);
                    continue;
                }
            };

            let score = self.metric.measure(&document, &subject_name);
            if threshold.is_some_and(|t| score < t) {
                info!(%condition, sequence, score, "Imperfect score");
                summary.imperfect.push(sequence);
            }
            summary.total += score;
        }

        let summary = summary.finish();
        info!(
            %condition,
            metric = self.metric.name(),
            total = summary.total,
            average = summary.average,
            imperfect = summary.imperfect.len(),
            parse_failures = summary.parse_failures.len(),
            missing = summary.missing.len(),
            "Condition evaluated"
        );
        Ok(summary)
    }
}
