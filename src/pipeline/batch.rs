//! Batch orchestrator.
//!
//! Schedules one generation task per `(sequence, condition)` pair, persists
//! the prompt before calling the backend and the result only after a
//! parseable reply. A task whose result already exists is skipped, so an
//! interrupted batch can be resumed by running it again.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FixtureError, GenerationError, StoreError};
use crate::fixture::{render_prompt, Condition, Fixture, FixtureGenerator};
use crate::llm::{GenerateOptions, StoryGenerator};
use crate::storage::{ArtifactKind, ArtifactStore};

/// How tasks are dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheduling {
    /// Fixed-size waves; each wave completes before the next starts.
    #[default]
    Waves,
    /// Up to `concurrency` tasks in flight at any time.
    Pool,
}

impl fmt::Display for Scheduling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheduling::Waves => write!(f, "waves"),
            Scheduling::Pool => write!(f, "pool"),
        }
    }
}

impl FromStr for Scheduling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "waves" | "wave" => Ok(Scheduling::Waves),
            "pool" => Ok(Scheduling::Pool),
            other => Err(format!("unknown scheduling '{other}' (expected waves or pool)")),
        }
    }
}

/// Settings for one batch.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Fixtures per condition.
    pub count: u32,
    pub concurrency: usize,
    pub scheduling: Scheduling,
    /// Deadline for one generation attempt.
    pub task_timeout: Duration,
    /// Extra attempts for transient failures.
    pub max_retries: u32,
    /// First backoff delay; doubled per retry.
    pub retry_base_delay: Duration,
    pub options: GenerateOptions,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            concurrency: 100,
            scheduling: Scheduling::Waves,
            task_timeout: Duration::from_secs(300),
            max_retries: 0,
            retry_base_delay: Duration::from_secs(1),
            options: GenerateOptions::default(),
        }
    }
}

impl BatchConfig {
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_scheduling(mut self, scheduling: Scheduling) -> Self {
        self.scheduling = scheduling;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Backoff before retry number `attempt` (0-based).
    fn retry_delay(&self, attempt: u32) -> Duration {
        self.retry_base_delay
            .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }
}

/// What happened to one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOutcome {
    Generated,
    Skipped,
    Failed,
}

/// Per-condition task counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConditionCounts {
    pub generated: u32,
    pub skipped: u32,
    pub failed: u32,
    /// Sequence numbers of failed tasks, ascending.
    pub failed_sequences: Vec<u32>,
}

impl ConditionCounts {
    fn record(&mut self, sequence: u32, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Generated => self.generated += 1,
            TaskOutcome::Skipped => self.skipped += 1,
            TaskOutcome::Failed => {
                self.failed += 1;
                self.failed_sequences.push(sequence);
            }
        }
    }
}

/// Summary of a finished batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    /// Seed of the fixture generator, for reproducing the run.
    pub seed: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub polite: ConditionCounts,
    pub impolite: ConditionCounts,
}

impl BatchReport {
    fn new(seed: u64) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            seed,
            started_at: now,
            finished_at: now,
            polite: ConditionCounts::default(),
            impolite: ConditionCounts::default(),
        }
    }

    pub fn counts(&self, condition: Condition) -> &ConditionCounts {
        match condition {
            Condition::Polite => &self.polite,
            Condition::Impolite => &self.impolite,
        }
    }

    fn counts_mut(&mut self, condition: Condition) -> &mut ConditionCounts {
        match condition {
            Condition::Polite => &mut self.polite,
            Condition::Impolite => &mut self.impolite,
        }
    }

    fn record(&mut self, condition: Condition, sequence: u32, outcome: TaskOutcome) {
        self.counts_mut(condition).record(sequence, outcome);
    }

    pub fn total_generated(&self) -> u32 {
        self.polite.generated + self.impolite.generated
    }

    pub fn total_skipped(&self) -> u32 {
        self.polite.skipped + self.impolite.skipped
    }

    pub fn total_failed(&self) -> u32 {
        self.polite.failed + self.impolite.failed
    }
}

/// A fixture together with its rendered prompt.
#[derive(Debug, Clone)]
struct PlannedTask {
    fixture: Fixture,
    prompt: String,
}

/// Runs generation batches against an artifact store.
pub struct BatchRunner {
    generator: StoryGenerator,
    store: Arc<dyn ArtifactStore>,
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(generator: StoryGenerator, store: Arc<dyn ArtifactStore>, config: BatchConfig) -> Self {
        Self {
            generator,
            store,
            config,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Generates missing artifacts for sequence numbers `1..=count`.
    ///
    /// Individual task failures are recorded in the report and never abort
    /// the batch.
    ///
    /// # Errors
    ///
    /// Returns `FixtureError` if fixtures or prompts cannot be built.
    pub async fn run_batch(
        &self,
        fixtures: &mut FixtureGenerator,
    ) -> Result<BatchReport, FixtureError> {
        let start = Instant::now();
        let mut report = BatchReport::new(fixtures.seed());
        let concurrency = self.config.concurrency.max(1);

        let tasks = self.plan(fixtures)?;
        info!(
            run_id = %report.run_id,
            seed = report.seed,
            tasks = tasks.len(),
            concurrency,
            scheduling = %self.config.scheduling,
            "Starting batch"
        );

        let outcomes = match self.config.scheduling {
            Scheduling::Waves => self.run_waves(&tasks, concurrency).await,
            Scheduling::Pool => self.run_pool(&tasks, concurrency).await,
        };

        for (task, outcome) in tasks.iter().zip(outcomes) {
            report.record(task.fixture.condition, task.fixture.sequence, outcome);
        }
        report.polite.failed_sequences.sort_unstable();
        report.impolite.failed_sequences.sort_unstable();
        report.finished_at = Utc::now();

        info!(
            run_id = %report.run_id,
            generated = report.total_generated(),
            skipped = report.total_skipped(),
            failed = report.total_failed(),
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Batch finished"
        );

        Ok(report)
    }

    /// Draws one fixture per task, impolite before polite for each sequence.
    ///
    /// Fixtures are drawn for skipped tasks too, so a seeded run assigns the
    /// same fixture to a sequence number whether or not it is resumed.
    fn plan(&self, fixtures: &mut FixtureGenerator) -> Result<Vec<PlannedTask>, FixtureError> {
        let mut tasks = Vec::with_capacity(self.config.count as usize * Condition::ALL.len());
        for sequence in 1..=self.config.count {
            for condition in Condition::ALL {
                let fixture = fixtures.next_fixture(sequence, condition)?;
                let prompt = render_prompt(&fixture)?;
                tasks.push(PlannedTask { fixture, prompt });
            }
        }
        Ok(tasks)
    }

    async fn run_waves(&self, tasks: &[PlannedTask], wave_size: usize) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::with_capacity(tasks.len());
        for (wave, chunk) in tasks.chunks(wave_size).enumerate() {
            debug!(wave = wave + 1, size = chunk.len(), "Dispatching wave");
            let results = join_all(chunk.iter().map(|task| self.run_task(task))).await;
            outcomes.extend(results);
        }
        outcomes
    }

    async fn run_pool(&self, tasks: &[PlannedTask], limit: usize) -> Vec<TaskOutcome> {
        let semaphore = Arc::new(Semaphore::new(limit));
        let futures = tasks.iter().map(|task| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                match semaphore.acquire().await {
                    Ok(_permit) => self.run_task(task).await,
                    Err(err) => {
                        warn!(error = %err, "Task pool closed");
                        TaskOutcome::Failed
                    }
                }
            }
        });
        join_all(futures).await
    }

    async fn run_task(&self, task: &PlannedTask) -> TaskOutcome {
        let condition = task.fixture.condition;
        let sequence = task.fixture.sequence;

        match self
            .store
            .exists(condition, sequence, ArtifactKind::Result)
            .await
        {
            Ok(true) => {
                debug!(%condition, sequence, "Result exists, skipping");
                return TaskOutcome::Skipped;
            }
            Ok(false) => {}
            Err(err) => {
                warn!(%condition, sequence, error = %err, "Failed to check result artifact");
                return TaskOutcome::Failed;
            }
        }

        if let Err(err) = self
            .store
            .write(condition, sequence, ArtifactKind::Prompt, &task.prompt)
            .await
        {
            warn!(%condition, sequence, error = %err, "Failed to write prompt artifact");
            return TaskOutcome::Failed;
        }

        let document = match self.generate_with_retry(&task.prompt).await {
            Ok(document) => document,
            Err(err) => {
                warn!(%condition, sequence, error = %err, "Generation failed");
                return TaskOutcome::Failed;
            }
        };

        match self.persist_result(condition, sequence, &document).await {
            Ok(()) => {
                debug!(%condition, sequence, "Result stored");
                TaskOutcome::Generated
            }
            Err(err) => {
                warn!(%condition, sequence, error = %err, "Failed to write result artifact");
                TaskOutcome::Failed
            }
        }
    }

    async fn persist_result(
        &self,
        condition: Condition,
        sequence: u32,
        document: &Value,
    ) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(document)?;
        self.store
            .write(condition, sequence, ArtifactKind::Result, &text)
            .await?;
        Ok(())
    }

    /// One generation under the per-task timeout, retried while transient.
    async fn generate_with_retry(&self, prompt: &str) -> Result<Value, GenerationError> {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(
                self.config.task_timeout,
                self.generator.generate(prompt, &self.config.options),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout(self.config.task_timeout)),
            };

            match result {
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_delay(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient error, will retry"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
