//! Command-line interface for the advisor analysis pipeline

use advisor_analysis::{AdvisorConfig, CacheManager, Orchestrator, RestDataProvider};
use advisor_core::{AnalysisResult, AnalysisSource, InvestorStyle};
use advisor_llm::providers::GeminiProvider;
use anyhow::Context;
use clap::{Parser, ValueEnum};
use comfy_table::Table;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "advisor")]
#[command(about = "Style-aware fundamental stock analysis", long_about = None)]
struct Args {
    /// Ticker symbol to analyze (e.g. AAPL)
    ticker: String,

    /// Investor style: growth, value or dividend
    #[arg(short, long, default_value = "growth")]
    style: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Root directory for the persistent cache
    #[arg(long, default_value = "cache")]
    cache_dir: PathBuf,

    /// Base URL of the fundamentals data service
    /// (falls back to the ADVISOR_DATA_URL environment variable)
    #[arg(long)]
    data_url: Option<String>,

    /// Override the narrative completion model
    #[arg(long)]
    model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    let style: InvestorStyle = args
        .style
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let mut builder = AdvisorConfig::builder().cache_dir(&args.cache_dir);
    if let Some(model) = &args.model {
        builder = builder.model(model);
    }
    let config = Arc::new(builder.build().context("invalid configuration")?);

    let cache = Arc::new(CacheManager::new(
        &config.cache_dir,
        config.raw_ttl,
        config.result_ttl,
    ));
    let data_url = args
        .data_url
        .clone()
        .or_else(|| std::env::var("ADVISOR_DATA_URL").ok())
        .context("set --data-url or the ADVISOR_DATA_URL environment variable")?;
    let provider = Arc::new(
        RestDataProvider::new(&data_url, config.fetch_timeout)
            .context("failed to build data provider client")?,
    );
    let llm = Arc::new(GeminiProvider::from_env().context("failed to configure Gemini")?);

    let orchestrator = Orchestrator::new(provider, llm, cache, Arc::clone(&config));

    info!(ticker = %args.ticker, %style, "starting analysis");

    match orchestrator.analyze(&args.ticker, style).await {
        Ok(result) => {
            print_result(&result, args.format)?;
            Ok(())
        }
        Err(err) => {
            let api = err.to_api_error();
            eprintln!("{}", serde_json::to_string_pretty(&api)?);
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber with default configuration
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn print_result(result: &AnalysisResult, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Table => {
            println!(
                "{} — {} ({:.0}% confidence, {} narrative)",
                result.ticker,
                result.action,
                result.confidence * 100.0,
                match result.source {
                    AnalysisSource::Llm => "model",
                    AnalysisSource::RuleBased => "rule-based",
                },
            );
            println!();

            let mut table = Table::new();
            table.set_header(vec!["Metric", "Value", "Sub-score", "Weight"]);
            for entry in &result.score.breakdown {
                table.add_row(vec![
                    entry.metric.label().to_string(),
                    entry
                        .value
                        .map_or_else(|| "N/A".to_string(), |v| format!("{v:.4}")),
                    format!("{:.2}", entry.sub_score),
                    format!("{:.2}", entry.weight),
                ]);
            }
            println!("{table}");
            println!();
            println!("{}", result.reason);
        }
    }
    Ok(())
}
