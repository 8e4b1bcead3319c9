//! Command Execution Logic
//!
//! Builds the engine from CLI options and runs each subcommand.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};
use tracing::{info, warn};

use scrivener_rs::providers::{
    EmbeddingCapability, FastEmbedProvider, GeminiClient, GeminiConfig, HashingEmbedder,
};
use scrivener_rs::{ChangeStatus, ComparisonMethod, ScrivenerConfig, StyleEngine, StyleProfile};

use crate::cli::args::{
    AnalyzeArgs, Cli, CompareArgs, InitConfigArgs, MethodArg, TransferArgs, ValidateConfigArgs,
};
use crate::cli::output::{display_analysis, display_comparison, display_transfer, render_structured};

/// Options shared by every engine-backed command.
pub struct EngineOptions {
    /// Configuration file
    pub config: Option<PathBuf>,
    /// Use the hashing embedder
    pub offline: bool,
}

impl EngineOptions {
    /// Collect the global options of `cli`.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            config: cli.config.clone(),
            offline: cli.offline,
        }
    }
}

/// Profile one document
pub async fn analyze_command(args: AnalyzeArgs, options: &EngineOptions) -> anyhow::Result<()> {
    let engine = build_engine(options)?;
    let text = read_document(&args.file).await?;
    let name = args.name.unwrap_or_else(|| file_stem(&args.file));

    let analysis = with_spinner("Profiling writing style...", engine.analyze_style(&text, &name)).await?;
    info!("{}", analysis.summary_line());

    match render_structured(&analysis, args.format)? {
        Some(rendered) => println!("{rendered}"),
        None => display_analysis(&analysis, args.units),
    }
    Ok(())
}

/// Compare two documents
pub async fn compare_command(args: CompareArgs, options: &EngineOptions) -> anyhow::Result<()> {
    let engine = build_engine(options)?;
    let (first, second) = tokio::try_join!(read_document(&args.first), read_document(&args.second))?;

    let mut comparison =
        with_spinner("Comparing writing styles...", engine.compare_styles(&first, &second)).await?;
    let method = comparison_method(args.method, &args.weights);
    comparison.report = engine.compare_profiles_with(
        &comparison.first.profile,
        &comparison.second.profile,
        &method,
    )?;

    match render_structured(&comparison, args.format)? {
        Some(rendered) => println!("{rendered}"),
        None => display_comparison(&comparison),
    }
    Ok(())
}

/// Rewrite a document toward a target style
pub async fn transfer_command(args: TransferArgs, options: &EngineOptions) -> anyhow::Result<()> {
    let engine = build_engine(options)?;
    let source = read_document(&args.source).await?;
    let target = load_target(&engine, &args.target).await?;

    let session = with_spinner(
        "Rewriting toward the target style...",
        engine.start_transfer(&source, &target, args.strategy.into()),
    )
    .await?;

    match render_structured(&session.outcome.changes, args.format)? {
        Some(rendered) => println!("{rendered}"),
        None => display_transfer(&session),
    }

    let decision = if args.accept_all {
        Some(ChangeStatus::Accepted)
    } else if args.reject_all {
        Some(ChangeStatus::Rejected)
    } else {
        None
    };
    let Some(status) = decision else {
        println!();
        println!(
            "{}",
            "💡 Pass --accept-all or --reject-all to export the result".dimmed()
        );
        return Ok(());
    };

    engine.decide_all(session.session_id(), status)?;
    let exported = engine.export_session(session.session_id())?;
    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &exported.text)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} {} ({} changes applied)",
                "✅ Exported to:".bright_green().bold(),
                path.display().to_string().cyan(),
                exported.applied.len()
            );
        }
        None => {
            println!();
            println!("{}", exported.text);
        }
    }
    Ok(())
}

/// Print default configuration in YAML format
pub async fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default scrivener configuration".dimmed());
    println!("{}", "# Save this to a file and customize as needed".dimmed());
    println!("{}", "# Usage: scrivener --config your-config.yml analyze <file>".dimmed());
    println!();

    let yaml_output = serde_yaml::to_string(&ScrivenerConfig::default())?;
    println!("{yaml_output}");

    Ok(())
}

/// Initialize a configuration file with defaults
pub async fn init_config(args: InitConfigArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "Configuration file already exists: {} (use --force to overwrite)",
            args.output.display()
        );
    }

    ScrivenerConfig::default().to_yaml_file(&args.output)?;

    println!(
        "{} {}",
        "✅ Configuration saved to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );
    println!();
    println!("{}", "🔧 Key settings you can customize:".bright_blue().bold());

    #[derive(Tabled)]
    struct CustomizationRow {
        setting: &'static str,
        description: &'static str,
    }

    let rows = vec![
        CustomizationRow {
            setting: "fusion.weights",
            description: "Category weights behind every style score (sum to 1.0)",
        },
        CustomizationRow {
            setting: "transfer.comparison_method",
            description: "cosine, euclidean or weighted profile similarity",
        },
        CustomizationRow {
            setting: "transfer.gradual_steps",
            description: "Rewrites performed by the gradual strategy",
        },
        CustomizationRow {
            setting: "review.inactivity_window_secs",
            description: "Idle time before a review session expires",
        },
    ];

    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{table}");

    Ok(())
}

/// Validate a Scrivener configuration file
pub async fn validate_config(args: ValidateConfigArgs, verbose: bool) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "🔍 Validating configuration:".bright_blue().bold(),
        args.file.display().to_string().cyan()
    );
    println!();

    let config = load_configuration(Some(&args.file))
        .with_context(|| format!("Configuration validation failed: {}", args.file.display()))?;
    println!("{}", "✅ Configuration file is valid!".bright_green().bold());

    if verbose {
        println!();

        #[derive(Tabled)]
        struct DetailRow {
            setting: &'static str,
            value: String,
        }

        let weights = &config.fusion.weights;
        let rows = vec![
            DetailRow {
                setting: "Comparison method",
                value: config.transfer.comparison_method.as_str().to_string(),
            },
            DetailRow {
                setting: "Gradual steps",
                value: config.transfer.gradual_steps.to_string(),
            },
            DetailRow {
                setting: "Max semantic units",
                value: config.identifier.max_units.to_string(),
            },
            DetailRow {
                setting: "Novelty percentile",
                value: config.behavior.novelty_percentile.to_string(),
            },
            DetailRow {
                setting: "Max failure ratio",
                value: config.behavior.max_failure_ratio.to_string(),
            },
            DetailRow {
                setting: "Clustering / distance / novelty weights",
                value: format!(
                    "{:.2} / {:.2} / {:.2}",
                    weights.clustering, weights.distance, weights.novelty
                ),
            },
            DetailRow {
                setting: "Review window (s)",
                value: config.review.inactivity_window_secs.to_string(),
            },
        ];

        let mut table = Table::new(rows);
        table.with(TableStyle::rounded());
        println!("{table}");
    }

    Ok(())
}

/// Load configuration from file or use defaults
pub fn load_configuration(path: Option<&Path>) -> anyhow::Result<ScrivenerConfig> {
    let config = match path {
        Some(path) => ScrivenerConfig::from_yaml_file(path)?,
        None => ScrivenerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn build_engine(options: &EngineOptions) -> anyhow::Result<StyleEngine> {
    let config = load_configuration(options.config.as_deref())?;

    let gemini = GeminiConfig::from_env_with(&config.providers.gemini)?;
    let llm = Arc::new(GeminiClient::new(gemini));

    let embedder: Arc<dyn EmbeddingCapability> = if options.offline {
        info!("Using offline hashing embedder");
        Arc::new(HashingEmbedder::default())
    } else {
        Arc::new(FastEmbedProvider::new(config.providers.embedding_model, true)?)
    };

    Ok(StyleEngine::new(config, llm, embedder)?)
}

/// Target profile from a saved JSON profile or by profiling a document.
async fn load_target(engine: &StyleEngine, path: &Path) -> anyhow::Result<StyleProfile> {
    let content = read_document(path).await?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        return serde_json::from_str(&content)
            .with_context(|| format!("Invalid style profile: {}", path.display()));
    }

    let analysis =
        with_spinner("Profiling target style...", engine.analyze_style(&content, &file_stem(path))).await?;
    info!(label = %analysis.profile.label(), "Target profile built from document");
    Ok(analysis.profile)
}

/// Run `future` behind a terminal spinner.
async fn with_spinner<T>(message: &'static str, future: impl Future<Output = T>) -> T {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    let output = future.await;
    pb.finish_and_clear();
    output
}

fn comparison_method(method: MethodArg, weights: &[f64]) -> ComparisonMethod {
    match method {
        MethodArg::Cosine => ComparisonMethod::Cosine,
        MethodArg::Euclidean => ComparisonMethod::Euclidean,
        MethodArg::Weighted => {
            if weights.is_empty() {
                warn!("No --weights given; using uniform weights");
            }
            let weights = if weights.is_empty() {
                vec![1.0; 6]
            } else {
                weights.to_vec()
            };
            ComparisonMethod::Weighted { weights }
        }
    }
}

async fn read_document(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "document".to_string(), |stem| stem.to_string_lossy().into_owned())
}
