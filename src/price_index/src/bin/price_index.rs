use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use price_index::weights::{
    NormalizationReport, WeightTable, normalize_weights, parse_weights_path,
};
use price_index::{AnalysisOptions, Item, analyze, load_weights_path};

const WEIGHTS_ENV: &str = "PRICE_INDEX_WEIGHTS";

#[derive(Parser)]
#[command(version, about = "Composite price index CLI")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Build item series, trends and both indices from a JSON item list.
    Analyze(AnalyzeArgs),
    Weights(WeightsCmd),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// JSON array of items; `-` reads stdin.
    #[arg(long, value_name = "FILE")]
    items: String,
    /// Category weight table (TOML). Falls back to $PRICE_INDEX_WEIGHTS, then the bundled table.
    #[arg(long, value_name = "FILE")]
    weights: Option<PathBuf>,
    #[arg(long, default_value_t = 7)]
    trend_days: u32,
    /// Exponential smoothing factor in (0, 1].
    #[arg(long)]
    smoothing: Option<f64>,
    /// Base day (YYYY-MM-DD) for the weighted index.
    #[arg(long, value_parser = parse_base_day)]
    base_day: Option<NaiveDate>,
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct WeightsCmd {
    #[command(subcommand)]
    sub: WeightsSub,
}

#[derive(Subcommand)]
enum WeightsSub {
    /// Parse and normalize a weight table, printing the result.
    Check {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WeightsCheck {
    table: WeightTable,
    report: NormalizationReport,
}

fn parse_base_day(s: &str) -> Result<NaiveDate> {
    price_index::day::parse_day(s)
}

fn read_items(src: &str) -> Result<Vec<Item>> {
    let text = if src == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read items from stdin")?;
        buf
    } else {
        std::fs::read_to_string(src).with_context(|| format!("read items file {src}"))?
    };
    serde_json::from_str(&text).context("parse items JSON")
}

fn resolve_weights(explicit: Option<&Path>) -> Result<WeightTable> {
    if let Some(path) = explicit {
        return load_weights_path(path);
    }
    if let Some(path) = shared_utils::env::env_path(WEIGHTS_ENV) {
        info!(path = %path.display(), "weight table from {WEIGHTS_ENV}");
        return load_weights_path(&path);
    }
    WeightTable::builtin()
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Analyze(args) => {
            let items = read_items(&args.items)?;
            let table = resolve_weights(args.weights.as_deref())?;
            let opts = AnalysisOptions {
                trend_days: args.trend_days,
                smoothing: args.smoothing,
                base_day: args.base_day,
                summary_days: None,
            };

            let analysis = analyze(&items, &table, &opts)?;
            info!(
                items = analysis.items.len(),
                days = analysis.calendar.len(),
                "analysis finished"
            );
            print_json(&analysis, args.pretty)?;
        }
        Cmd::Weights(WeightsCmd {
            sub: WeightsSub::Check { file },
        }) => {
            let mut table = parse_weights_path(&file)?;
            let report = normalize_weights(&mut table)?;
            print_json(&WeightsCheck { table, report }, true)?;
        }
    }

    Ok(())
}
