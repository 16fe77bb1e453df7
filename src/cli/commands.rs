//! CLI command definitions for politeness-bench.
//!
//! `run` generates missing artifacts and then evaluates them; `generate` and
//! `evaluate` run one phase each. Invoking the binary without a subcommand is
//! the same as `run`.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tracing::info;

use crate::error::LlmError;
use crate::fixture::FixtureGenerator;
use crate::llm::{LiteLlmClient, LlmProvider, StoryGenerator};
use crate::pipeline::{
    BatchReport, BatchRunner, EvaluationReport, Evaluator, HarnessConfig, RubricPreset,
    Scheduling,
};
use crate::scoring::MetricKind;
use crate::storage::FsArtifactStore;

const OPENROUTER_KEY_VAR: &str = "OPENROUTER_API_KEY";
const LITELLM_MODEL_VAR: &str = "LITELLM_DEFAULT_MODEL";

/// Measures whether polite or impolite phrasing changes the structure of generated JSON.
#[derive(Parser, Debug)]
#[command(name = "politeness-bench")]
#[command(about = "Compare structured LLM output for polite and impolite prompts")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
#[command(
    long_about = "politeness-bench renders the same story request in a polite and an impolite phrasing, \
collects the generated JSON documents and scores their structure.\n\nExample usage:\n  \
politeness-bench run --count 100 --concurrency 20 --model openai/gpt-4o"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Arguments for the implicit `run` command.
    #[command(flatten)]
    pub run: RunArgs,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Generate missing artifacts, then evaluate them.
    Run(RunArgs),

    /// Generate prompt and result artifacts for both conditions.
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// Score stored artifacts and print the average per condition.
    #[command(alias = "eval")]
    Evaluate(EvaluateArgs),
}

/// Options shared by every command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Fixtures per condition [default: 1000].
    #[arg(short = 'n', long)]
    pub count: Option<u32>,

    /// Backend model; also selects the artifact directory suffix.
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Results root [default: ./results].
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Rubric: basic or extended [default: basic].
    #[arg(long)]
    pub rubric: Option<RubricPreset>,

    /// YAML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output JSON to stdout instead of console lines.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Options for the generation phase.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GenerationArgs {
    /// Tasks per wave, or tasks in flight with pool scheduling [default: 100].
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// OpenRouter API key (can also be set via OPENROUTER_API_KEY or LITELLM_API_KEY env var).
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Scheduling: waves or pool [default: waves].
    #[arg(long)]
    pub scheduling: Option<Scheduling>,

    /// Per-task timeout in seconds [default: 300].
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Retries for transient failures [default: 0].
    #[arg(long)]
    pub retries: Option<u32>,

    /// Seed for reproducible fixtures.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Hobbies per fixture [default: 2].
    #[arg(long)]
    pub hobbies: Option<usize>,
}

/// Options for the evaluation phase.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ScoringArgs {
    /// Metric: rubric, text-length or moral [default: rubric].
    #[arg(long)]
    pub metric: Option<MetricKind>,

    /// Report basic-rubric scores below 21 as imperfect instead of below 22.
    #[arg(long)]
    pub legacy_threshold: bool,
}

/// Arguments for `politeness-bench run`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub generation: GenerationArgs,

    #[command(flatten)]
    pub scoring: ScoringArgs,
}

/// Arguments for `politeness-bench generate`.
#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub generation: GenerationArgs,
}

/// Arguments for `politeness-bench evaluate`.
#[derive(clap::Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub scoring: ScoringArgs,
}

/// JSON output of the `run` command.
#[derive(Debug, Serialize)]
struct RunOutput {
    batch: BatchReport,
    evaluation: EvaluationReport,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Run(args)) => run_run_command(args).await,
        Some(Commands::Generate(args)) => run_generate_command(args).await,
        Some(Commands::Evaluate(args)) => run_evaluate_command(args).await,
        None => run_run_command(cli.run).await,
    }
}

async fn run_run_command(args: RunArgs) -> anyhow::Result<()> {
    let mut config = resolve_config(&args.common, Some(&args.generation), Some(&args.scoring))?;
    pin_backend_model(&mut config, args.generation.api_key.is_some());

    info!("Generating tests...");
    let batch = generate(&config, args.generation.api_key.clone()).await?;

    info!("Evaluating tests...");
    let evaluation = evaluate(&config).await?;

    if args.common.json {
        let output = RunOutput { batch, evaluation };
        print_json(&output)?;
    } else {
        print_batch(&batch);
        println!("{evaluation}");
    }

    info!("Done.");
    Ok(())
}

async fn run_generate_command(args: GenerateArgs) -> anyhow::Result<()> {
    let mut config = resolve_config(&args.common, Some(&args.generation), None)?;
    pin_backend_model(&mut config, args.generation.api_key.is_some());
    let batch = generate(&config, args.generation.api_key.clone()).await?;

    if args.common.json {
        print_json(&batch)?;
    } else {
        print_batch(&batch);
    }
    Ok(())
}

async fn run_evaluate_command(args: EvaluateArgs) -> anyhow::Result<()> {
    let mut config = resolve_config(&args.common, None, Some(&args.scoring))?;
    pin_backend_model(&mut config, env::var_os(OPENROUTER_KEY_VAR).is_some());
    let evaluation = evaluate(&config).await?;

    if args.common.json {
        print_json(&evaluation)?;
    } else {
        println!("{evaluation}");
    }
    Ok(())
}

/// Layers defaults, the YAML file, `HARNESS_*` variables and flags.
fn resolve_config(
    common: &CommonArgs,
    generation: Option<&GenerationArgs>,
    scoring: Option<&ScoringArgs>,
) -> anyhow::Result<HarnessConfig> {
    let base = match &common.config {
        Some(path) => HarnessConfig::from_yaml_file(path).map_err(|e| {
            anyhow::anyhow!("Failed to load config file {}: {}", path.display(), e)
        })?,
        None => HarnessConfig::default(),
    };
    let mut config = base.with_env()?;

    if let Some(count) = common.count {
        config.count = count;
    }
    if let Some(model) = &common.model {
        config.model = Some(model.clone());
    }
    if let Some(output) = &common.output {
        config.output = output.clone();
    }
    if let Some(rubric) = common.rubric {
        config.rubric = rubric;
    }

    if let Some(args) = generation {
        if let Some(concurrency) = args.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(scheduling) = args.scheduling {
            config.scheduling = scheduling;
        }
        if let Some(secs) = args.timeout_secs {
            config.timeout_secs = secs;
        }
        if let Some(retries) = args.retries {
            config.retries = retries;
        }
        if args.seed.is_some() {
            config.seed = args.seed;
        }
        if let Some(hobbies) = args.hobbies {
            config.hobbies = hobbies;
        }
    }

    if let Some(args) = scoring {
        if let Some(metric) = args.metric {
            config.metric = metric;
        }
        if args.legacy_threshold {
            config.legacy_threshold = true;
        }
    }

    config.validate()?;
    Ok(config)
}

/// Fixes the model a run talks to so the artifact directory matches it.
///
/// Without `--model`, the OpenRouter client falls back to the historical
/// default while the environment client uses `LITELLM_DEFAULT_MODEL`.
fn pin_backend_model(config: &mut HarnessConfig, openrouter: bool) {
    let env_default = env::var(LITELLM_MODEL_VAR).ok();
    if let Some(model) = backend_model(config.model.as_deref(), openrouter, env_default.as_deref()) {
        if config.model.is_none() {
            info!(model = %model, "Using model from {}", LITELLM_MODEL_VAR);
        }
        config.model = Some(model);
    }
}

fn backend_model(
    explicit: Option<&str>,
    openrouter: bool,
    env_default: Option<&str>,
) -> Option<String> {
    match (explicit, openrouter) {
        (Some(model), _) => Some(model.to_string()),
        (None, true) => None,
        (None, false) => env_default
            .filter(|model| !model.trim().is_empty())
            .map(str::to_string),
    }
}

fn artifact_store(config: &HarnessConfig) -> Arc<FsArtifactStore> {
    let store = FsArtifactStore::for_layout(
        &config.output,
        &config.rubric_config(),
        config.model.as_deref(),
    );
    info!(root = %store.root().display(), "Using artifact directory");
    Arc::new(store)
}

async fn generate(config: &HarnessConfig, api_key: Option<String>) -> anyhow::Result<BatchReport> {
    let provider = build_llm_client(api_key, config.model.clone())?;
    let runner = BatchRunner::new(
        StoryGenerator::new(provider),
        artifact_store(config),
        config.batch_config(),
    );

    let mut fixtures = FixtureGenerator::new(config.seed, config.hobbies)?;
    info!(seed = fixtures.seed(), count = config.count, "Fixture generator ready");

    Ok(runner.run_batch(&mut fixtures).await?)
}

async fn evaluate(config: &HarnessConfig) -> anyhow::Result<EvaluationReport> {
    let metric = config
        .metric
        .build(config.rubric_config(), config.perfect_threshold());
    let evaluator = Evaluator::new(artifact_store(config), metric);
    Ok(evaluator.evaluate(config.count).await?)
}

fn build_llm_client(
    api_key: Option<String>,
    model: Option<String>,
) -> anyhow::Result<Arc<dyn LlmProvider>> {
    if let Some(key) = api_key {
        let client = LiteLlmClient::openrouter(key, model);
        info!(
            model = %client.default_model(),
            api_key = client.api_key_masked().as_deref().unwrap_or(""),
            "Using OpenRouter with specified API key"
        );
        Ok(Arc::new(client))
    } else {
        info!("Using LiteLLM client from environment");
        Ok(Arc::new(LiteLlmClient::from_env().map_err(client_setup_error)?))
    }
}

fn client_setup_error(err: LlmError) -> anyhow::Error {
    anyhow::anyhow!(
        "Failed to initialize LLM client: {}. \
         Please provide --api-key (or OPENROUTER_API_KEY), or set LITELLM_API_BASE \
         (with LITELLM_API_KEY if the endpoint needs one).",
        err
    )
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json_output = serde_json::to_string_pretty(value)
        .map_err(|e| anyhow::anyhow!("Failed to serialize JSON output: {}", e))?;
    println!("{}", json_output);
    Ok(())
}

fn print_batch(batch: &BatchReport) {
    println!("Run {} (seed {})", batch.run_id, batch.seed);
    for (name, counts) in [("Impolite", &batch.impolite), ("Polite", &batch.polite)] {
        println!(
            "{name:<9} generated: {}, skipped: {}, failed: {}",
            counts.generated, counts.skipped, counts.failed
        );
        if !counts.failed_sequences.is_empty() {
            println!("{:<9} failed tests: {:?}", "", counts.failed_sequences);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        // Verify CLI definition is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bare_invocation_is_run() {
        let cli = Cli::try_parse_from(["politeness-bench"]).expect("should parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
        assert_eq!(cli.run.common.count, None);
        assert!(!cli.run.common.json);
    }

    #[test]
    fn test_top_level_run_flags() {
        let cli = Cli::try_parse_from(["politeness-bench", "-n", "10", "--rubric", "extended"])
            .expect("should parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.run.common.count, Some(10));
        assert_eq!(cli.run.common.rubric, Some(RubricPreset::Extended));
    }

    #[test]
    fn test_run_command_with_all_options() {
        let args = vec![
            "politeness-bench",
            "run",
            "--count",
            "20",
            "--concurrency",
            "5",
            "--model",
            "openai/gpt-4o",
            "--api-key",
            "sk-test",
            "--output",
            "./out",
            "--rubric",
            "extended",
            "--scheduling",
            "pool",
            "--timeout-secs",
            "60",
            "--retries",
            "2",
            "--seed",
            "7",
            "--hobbies",
            "3",
            "--metric",
            "text-length",
            "--legacy-threshold",
            "--json",
            "--config",
            "harness.yaml",
            "--log-level",
            "debug",
        ];
        let cli = Cli::try_parse_from(args).expect("should parse");
        assert_eq!(cli.log_level, "debug");

        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.common.count, Some(20));
                assert_eq!(args.common.model.as_deref(), Some("openai/gpt-4o"));
                assert_eq!(args.common.output, Some(PathBuf::from("./out")));
                assert_eq!(args.common.rubric, Some(RubricPreset::Extended));
                assert_eq!(args.common.config, Some(PathBuf::from("harness.yaml")));
                assert!(args.common.json);
                assert_eq!(args.generation.concurrency, Some(5));
                assert_eq!(args.generation.api_key.as_deref(), Some("sk-test"));
                assert_eq!(args.generation.scheduling, Some(Scheduling::Pool));
                assert_eq!(args.generation.timeout_secs, Some(60));
                assert_eq!(args.generation.retries, Some(2));
                assert_eq!(args.generation.seed, Some(7));
                assert_eq!(args.generation.hobbies, Some(3));
                assert_eq!(args.scoring.metric, Some(MetricKind::TextLength));
                assert!(args.scoring.legacy_threshold);
            }
            other => panic!("Expected Run command, got {:?}", other),
        }
    }

    #[test]
    fn test_evaluate_alias() {
        let cli = Cli::try_parse_from(["politeness-bench", "eval", "-n", "3", "--metric", "moral"])
            .expect("should parse with alias");
        match cli.command {
            Some(Commands::Evaluate(args)) => {
                assert_eq!(args.common.count, Some(3));
                assert_eq!(args.scoring.metric, Some(MetricKind::Moral));
            }
            other => panic!("Expected Evaluate command, got {:?}", other),
        }
    }

    #[test]
    fn test_generate_rejects_scoring_flags() {
        let result = Cli::try_parse_from(["politeness-bench", "generate", "--metric", "moral"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Cli::try_parse_from(["politeness-bench", "run", "--rubric", "fancy"]).is_err());
        assert!(
            Cli::try_parse_from(["politeness-bench", "run", "--scheduling", "threads"]).is_err()
        );
        assert!(Cli::try_parse_from(["politeness-bench", "run", "--count", "-1"]).is_err());
    }

    #[test]
    fn test_resolve_config_applies_flags() {
        let common = CommonArgs {
            count: Some(12),
            model: Some("gpt-4o".to_string()),
            output: Some(PathBuf::from("./elsewhere")),
            rubric: Some(RubricPreset::Extended),
            ..CommonArgs::default()
        };
        let generation = GenerationArgs {
            concurrency: Some(4),
            retries: Some(1),
            seed: Some(99),
            ..GenerationArgs::default()
        };
        let scoring = ScoringArgs {
            metric: Some(MetricKind::Moral),
            legacy_threshold: false,
        };

        let config = resolve_config(&common, Some(&generation), Some(&scoring)).expect("config");
        assert_eq!(config.count, 12);
        assert_eq!(config.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.output, PathBuf::from("./elsewhere"));
        assert_eq!(config.rubric, RubricPreset::Extended);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.retries, 1);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.metric, MetricKind::Moral);
    }

    #[test]
    fn test_backend_model_follows_client_selection() {
        // Explicit --model always wins.
        assert_eq!(
            backend_model(Some("openai/gpt-4o"), false, Some("mistral/large")).as_deref(),
            Some("openai/gpt-4o")
        );
        // OpenRouter ignores LITELLM_DEFAULT_MODEL.
        assert_eq!(backend_model(None, true, Some("mistral/large")), None);
        // The environment client writes under its own model's directory.
        assert_eq!(
            backend_model(None, false, Some("mistral/large")).as_deref(),
            Some("mistral/large")
        );
        assert_eq!(backend_model(None, false, Some("  ")), None);
        assert_eq!(backend_model(None, false, None), None);
    }

    #[test]
    fn test_pinned_model_selects_artifact_directory() {
        let config = HarnessConfig {
            model: backend_model(None, false, Some("mistral/large")),
            ..HarnessConfig::default()
        };
        let store = artifact_store(&config);
        let root = store.root().to_string_lossy().into_owned();
        assert!(root.ends_with("results-mistral_large"), "{root}");
    }

    #[test]
    fn test_client_setup_error_names_api_base() {
        let message = client_setup_error(LlmError::MissingApiBase).to_string();
        assert!(message.contains("LITELLM_API_BASE"), "{message}");
        assert!(message.contains("--api-key"), "{message}");
    }

    #[test]
    fn test_resolve_config_rejects_invalid() {
        let common = CommonArgs {
            count: Some(0),
            ..CommonArgs::default()
        };
        assert!(resolve_config(&common, None, None).is_err());
    }

    #[test]
    fn test_resolve_config_missing_file() {
        let common = CommonArgs {
            config: Some(PathBuf::from("/nonexistent/harness.yaml")),
            ..CommonArgs::default()
        };
        let err = resolve_config(&common, None, None).unwrap_err();
        assert!(err.to_string().contains("Failed to load config file"));
    }
}
