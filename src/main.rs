use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tripleflow::tripleflow_core::QueryLimits;
use tripleflow::{run, Config, ResultFormat, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "tripleflow")]
#[command(about = "Tripleflow - run RDF triple pattern queries over a dataset", long_about = None)]
struct Args {
    /// Dataset file (one `s p o [g] .` statement per line)
    dataset: PathBuf,

    /// Query plan file (JSON)
    plan: PathBuf,

    /// Result format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    format: Option<ResultFormat>,

    /// Output file (if not specified, writes to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum number of result rows
    #[arg(short, long)]
    limit: Option<usize>,

    /// Directory holding tripleflow.toml and .env
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// First triple pattern column to execute
    #[arg(long)]
    start_column: Option<usize>,

    /// Last triple pattern column to execute
    #[arg(long)]
    end_column: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.config_dir)?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let row_limit = args.limit.unwrap_or(config.row_limit);
    if row_limit == 0 {
        anyhow::bail!("--limit must be greater than 0");
    }

    let options = RunOptions {
        dataset: args.dataset,
        plan: args.plan,
        format: args.format.unwrap_or(config.format),
        output: args.output,
        limits: QueryLimits::with_max_rows(row_limit),
        start_column: args.start_column,
        end_column: args.end_column,
    };

    let summary = match run(&options) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            std::process::exit(1);
        }
    };

    for error in &summary.errors {
        eprintln!("{} {}", "!".yellow(), error);
    }
    tracing::debug!("Done, {} rows", summary.rows);
    Ok(())
}
