//! Generation and evaluation pipeline.
//!
//! - **Config**: [`HarnessConfig`] layered from defaults, YAML, environment and flags
//! - **Batch**: [`BatchRunner`] generates prompt and result artifacts for both conditions
//! - **Evaluate**: [`Evaluator`] scores stored artifacts and averages per condition
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use politeness_bench::fixture::FixtureGenerator;
//! use politeness_bench::llm::{LiteLlmClient, StoryGenerator};
//! use politeness_bench::pipeline::{BatchRunner, Evaluator, HarnessConfig};
//! use politeness_bench::storage::FsArtifactStore;
//!
//! let config = HarnessConfig::default().with_count(20);
//! let store = Arc::new(FsArtifactStore::for_layout(&config.output, &config.rubric_config(), None));
//! let generator = StoryGenerator::new(Arc::new(LiteLlmClient::from_env()?));
//!
//! let mut fixtures = FixtureGenerator::new(config.seed, config.hobbies)?;
//! let batch = BatchRunner::new(generator, store.clone(), config.batch_config())
//!     .run_batch(&mut fixtures)
//!     .await?;
//!
//! let metric = config.metric.build(config.rubric_config(), config.perfect_threshold());
//! let report = Evaluator::new(store, metric).evaluate(config.count).await?;
//! println!("{report}");
//! ```

pub mod batch;
pub mod config;
pub mod evaluate;

pub use batch::{
    BatchConfig, BatchReport, BatchRunner, ConditionCounts, Scheduling, TaskOutcome,
};
pub use config::{HarnessConfig, RubricPreset};
pub use evaluate::{ConditionSummary, EvaluationReport, Evaluator};
