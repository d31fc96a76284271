//! truthgate diagnostic CLI
//!
//! Runs individual pipeline stages, or the whole pipeline, against a single
//! query and prints the resulting structures as JSON with timing.
//!
//! Usage:
//!   cargo run -p demo -- classify "What is the current price of Bitcoin?"
//!   cargo run -p demo -- fingerprint "What's the weather in Paris?"
//!   cargo run -p demo -- select "What is the price of gold per ounce?"
//!   cargo run -p demo -- lookup "latest headlines about the port strike" --force-refresh
//!   cargo run -p demo -- enforce "Refunds take 30 days." --confidence 0.3 --mode business
//!   cargo run -p demo -- ask "How many euros is 100 dollars right now?"

mod generator;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use truthgate_contracts::{
    cache::SourceClass,
    config::TruthgateConfig,
    doctrine::{ClaimKind, OperatingMode, ResponseMetadata},
    error::TruthgateResult,
    truth::TruthType,
};
use truthgate_core::{config::load_config_file, traits::Clock, SystemClock};
use truthgate_runtime::{LookupOptions, TruthPipeline};

use generator::TemplateGenerator;

// ── CLI definition ────────────────────────────────────────────────────────────

/// truthgate: truth classification, freshness-aware lookup and doctrine enforcement.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "truthgate diagnostic CLI",
    long_about = "Runs truthgate pipeline stages against a query and prints the\n\
                  classification, source selection, lookup and enforcement results."
)]
struct Cli {
    /// Configuration TOML; built-in defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a query's truth volatility and decide whether to look it up.
    Classify { query: String },
    /// Show the cache fingerprint and TTL for a query.
    Fingerprint { query: String },
    /// Show which sources would be consulted for a query.
    Select { query: String },
    /// Run the lookup stage (cache, fetch, degradation).
    Lookup {
        query: String,
        #[arg(long)]
        force_refresh: bool,
        #[arg(long)]
        internal_answer: Option<String>,
        #[arg(long)]
        internal_confidence: Option<f64>,
    },
    /// Run the doctrine gates over a response text.
    Enforce {
        text: String,
        #[arg(long)]
        confidence: Option<f64>,
        #[arg(long)]
        truth_type: Option<TruthType>,
        #[arg(long, default_value = "standard")]
        mode: String,
        /// Treat the text as externally verified just now.
        #[arg(long)]
        external: bool,
        /// Treat the text as a business-policy claim.
        #[arg(long)]
        business_policy: bool,
        #[arg(long)]
        degraded: bool,
    },
    /// Run the whole pipeline with a template generator.
    Ask {
        query: String,
        #[arg(long, default_value = "standard")]
        mode: String,
        #[arg(long)]
        internal_answer: Option<String>,
        #[arg(long)]
        internal_confidence: Option<f64>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // A missing .env is fine; key-gated sources are simply skipped.
    dotenvy::dotenv().ok();

    // Set RUST_LOG=debug for per-source and per-gate output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let started = Instant::now();
    if let Err(e) = run(cli).await {
        eprintln!("truthgate error: {}", e);
        std::process::exit(1);
    }
    println!("elapsed: {} ms", started.elapsed().as_millis());
}

// ── Command dispatch ──────────────────────────────────────────────────────────

async fn run(cli: Cli) -> TruthgateResult<()> {
    let config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => TruthgateConfig::default(),
    };
    let pipeline = TruthPipeline::new(config)?;

    match cli.command {
        Command::Classify { query } => {
            let classification = pipeline.classifier().classify(&query);
            print_json(&classification)?;
        }

        Command::Fingerprint { query } => {
            let classification = pipeline.classifier().classify(&query);
            let ttl = pipeline.cache().ttl_for(classification.truth_type);
            print_json(&serde_json::json!({
                "query": query,
                "fingerprint": pipeline.cache().fingerprint(&query),
                "truth_type": classification.truth_type,
                "ttl_secs": ttl.as_secs(),
            }))?;
        }

        Command::Select { query } => {
            let classification = pipeline.classifier().classify(&query);
            let selection = pipeline.selector().select_sources_for_query(
                &query,
                classification.truth_type,
                &classification.high_stakes,
            );
            print_json(&selection)?;
        }

        Command::Lookup {
            query,
            force_refresh,
            internal_answer,
            internal_confidence,
        } => {
            let options = LookupOptions {
                internal_confidence,
                internal_answer,
                force_refresh,
            };
            let response = pipeline.lookup(&query, &options).await;
            print_json(&response)?;
            if let Some(disclosure) = response.disclosure() {
                println!("\ndisclosure: {disclosure}");
            }
        }

        Command::Enforce {
            text,
            confidence,
            truth_type,
            mode,
            external,
            business_policy,
            degraded,
        } => {
            let metadata = ResponseMetadata {
                truth_type,
                confidence,
                source_class: Some(if external {
                    SourceClass::External
                } else {
                    SourceClass::Internal
                }),
                verified_at: external.then(|| SystemClock.now()),
                external_verification: external,
                degraded,
                claim_kind: if business_policy {
                    ClaimKind::BusinessPolicy
                } else {
                    ClaimKind::General
                },
                ..ResponseMetadata::default()
            };
            let outcome = pipeline.enforce(&text, &metadata, &OperatingMode::new(mode));
            print_json(&outcome)?;
            println!("\n{}", outcome.final_text(&text));
        }

        Command::Ask {
            query,
            mode,
            internal_answer,
            internal_confidence,
        } => {
            let options = LookupOptions {
                internal_confidence,
                internal_answer,
                force_refresh: false,
            };
            let response = pipeline
                .respond(&query, &options, &OperatingMode::new(mode), &TemplateGenerator)
                .await;
            print_json(&response)?;
            println!("\n{}", response.text);
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> TruthgateResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
