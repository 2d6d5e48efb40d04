use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use spendlens_core::{find_recurring_transactions, AnalysisResult, RecurringGroup, Transaction};
use spendlens_finance::{
    analyze_spending, generate_report, Categorizer, ModelBackend, ModelClient,
};
use spendlens_ingest::{parse_bank_csv, read_transactions_json, write_transactions_json};
use std::io::stderr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

mod config;

#[derive(Parser, Debug)]
#[command(name = "spendlens", version, about = "Private spending analysis with a local LLM")]
struct Cli {
    /// Model tag to use (overrides config)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Model server base URL (overrides config)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log filter, e.g. "debug" or "spendlens_finance=trace" (default: RUST_LOG or info)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Config file (default: ~/.spendlens/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean a bank CSV export into a JSON transaction list (no model calls)
    Preprocess {
        csv: PathBuf,

        #[arg(short, long, default_value = "cleaned_transactions.json")]
        output: PathBuf,
    },

    /// Categorize a CSV or JSON transaction list with the local model
    Categorize {
        input: PathBuf,

        #[arg(short, long, default_value = "categorized_transactions.json")]
        output: PathBuf,

        /// Transactions per model request (default from config)
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Categorize (if needed), analyze, and write a report
    Analyze {
        input: PathBuf,

        /// Report directory (default from config)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        #[arg(long)]
        batch_size: Option<usize>,

        /// Print the analysis as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Manage ~/.spendlens/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file if none exists
    Init,
    /// Print the effective configuration
    Show,
}

#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    analysis: &'a AnalysisResult,
    recurring: &'a [RecurringGroup],
    report: &'a Path,
    chart: Option<&'a Path>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    let Cli {
        model,
        base_url,
        config: config_flag,
        command,
        ..
    } = cli;
    // Only commands that talk to the model or manage config read the file.
    let settings = move || -> Result<(PathBuf, config::Config)> {
        let path = match config_flag {
            Some(p) => p,
            None => config::config_path()?,
        };
        let cfg = config::load_config(&path)?.with_overrides(model, base_url);
        Ok((path, cfg))
    };

    match command {
        Command::Preprocess { csv, output } => {
            let txns = parse_bank_csv(&csv)?;
            write_transactions_json(&output, &txns)?;
            println!(
                "Processed {} transactions. Output written to {}",
                txns.len(),
                output.display()
            );
        }

        Command::Categorize {
            input,
            output,
            batch_size,
        } => {
            let (_, cfg) = settings()?;
            let txns = load_transactions(&input)?;
            let client = cfg.model.build_client();
            let batch_size = batch_size.unwrap_or(cfg.model.batch_size);

            let txns = categorize_missing(&client, txns, batch_size, print_progress);
            write_transactions_json(&output, &txns)?;
            println!(
                "Categorized {} transactions. Output written to {}",
                txns.len(),
                output.display()
            );
        }

        Command::Analyze {
            input,
            output_dir,
            batch_size,
            json,
        } => {
            let (_, cfg) = settings()?;
            let txns = load_transactions(&input)?;
            let client = cfg.model.build_client();
            let batch_size = batch_size.unwrap_or(cfg.model.batch_size);
            let output_dir = output_dir.unwrap_or(cfg.report.output_dir);

            let txns = categorize_missing(&client, txns, batch_size, print_progress);
            let analysis = analyze_spending(&txns, &client);
            let recurring = find_recurring_transactions(&txns);
            let paths = generate_report(
                &analysis,
                &recurring,
                &output_dir,
                chrono::Local::now().naive_local(),
            )?;

            if json {
                let out = AnalyzeOutput {
                    analysis: &analysis,
                    recurring: &recurring,
                    report: &paths.report,
                    chart: paths.chart.as_deref(),
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Report generated: {}", paths.report.display());
                if let Some(chart) = &paths.chart {
                    println!("Chart generated: {}", chart.display());
                }
            }
        }

        Command::Config { command } => {
            let (path, cfg) = settings()?;
            match command {
                ConfigCommand::Init => config::init_config(&path)?,
                ConfigCommand::Show => {
                    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
                }
            }
        }
    }

    Ok(())
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(l) => EnvFilter::try_new(l).with_context(|| format!("invalid log level '{l}'"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    // stdout carries --json output, so logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(stderr))
        .init();
    Ok(())
}

/// `.csv` inputs are cleaned on the fly; anything else is read as JSON.
fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    if !path.exists() {
        bail!("input not found: {}", path.display());
    }

    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let txns = if is_csv {
        parse_bank_csv(path)?
    } else {
        read_transactions_json(path)?
    };
    info!(count = txns.len(), input = %path.display(), "loaded transactions");
    Ok(txns)
}

fn print_progress(processed: usize, total: usize) {
    eprintln!("Processed {processed}/{total} transactions...");
}

/// Send only uncategorized transactions to the model, keeping input order.
fn categorize_missing<B: ModelBackend>(
    client: &ModelClient<B>,
    mut txns: Vec<Transaction>,
    batch_size: usize,
    on_progress: impl FnMut(usize, usize),
) -> Vec<Transaction> {
    let pending: Vec<usize> = txns
        .iter()
        .enumerate()
        .filter(|(_, t)| t.category.is_none())
        .map(|(i, _)| i)
        .collect();
    if pending.is_empty() {
        return txns;
    }

    let todo: Vec<Transaction> = pending.iter().map(|&i| txns[i].clone()).collect();
    let done = Categorizer::new(client).categorize_batch_with_progress(todo, batch_size, on_progress);

    for (i, txn) in pending.into_iter().zip(done) {
        txns[i] = txn;
    }
    txns
}
