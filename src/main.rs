use anyhow::Result;
use clap::{Parser, Subcommand};

use logtriage::config::TriageConfig;

#[derive(Parser)]
#[command(
    name = "logtriage",
    about = "Access-log traffic anomaly triage",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the triage pipeline over a log file and print the report
    Analyze {
        /// Path to the access log file
        #[arg(long)]
        log: String,

        /// Path to a ground-truth file (one timestamp per line)
        #[arg(long)]
        ground_truth: Option<String>,

        /// Path to a TOML config file (overrides the layered lookup)
        #[arg(long)]
        config: Option<String>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Start the daemon (JSON API serving triage reports)
    Serve {
        /// Bind address
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,

        /// Path to the access log file to serve reports for
        #[arg(long)]
        log: String,

        /// Path to a TOML config file (overrides the layered lookup)
        #[arg(long)]
        config: Option<String>,
    },
}

fn load_config(path: Option<&str>) -> Result<TriageConfig> {
    match path {
        Some(p) => TriageConfig::load(std::path::Path::new(p)),
        None => Ok(TriageConfig::load_or_default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            log,
            ground_truth,
            config,
            json,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            if ground_truth.is_some() {
                cfg.evaluation.ground_truth_file = ground_truth;
            }

            tracing::info!(%log, "Running triage analysis");
            let report = logtriage::report::run_pipeline(&log, &cfg)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Serve { bind, log, config } => {
            let cfg = load_config(config.as_deref())?;
            tracing::info!(%bind, "Starting LogTriage daemon");
            logtriage::serve(&bind, &log, cfg).await?;
        }
    }

    Ok(())
}

fn print_report(report: &logtriage::report::TrafficReport) {
    println!("\n=== LogTriage Report ===");
    println!("Total events:    {}", report.total_events);
    println!("Malformed lines: {}", report.malformed_lines);

    println!("\nRequests by method:");
    for (method, count) in &report.method_counts {
        println!("  {:<8} {}", method, count);
    }

    println!("\nRequests by status code:");
    for (status, count) in &report.status_counts {
        println!("  {:<8} {}", status, count);
    }

    println!("\nTop addresses:");
    for (address, count) in &report.address_counts {
        println!("  {:<20} {}", address, count);
    }

    println!("\nStrategy results:");
    println!("{:<20} | {:<10} | Anomalous buckets", "Strategy", "Accuracy");
    println!("{:-<20}-|-{:-<10}-|-{:-<20}", "", "", "");
    for outcome in &report.strategies {
        let accuracy = match outcome.accuracy {
            Some(a) => format!("{:.3}", a),
            None => "n/a".to_string(),
        };
        println!(
            "{:<20} | {:<10} | {}",
            outcome.strategy.to_string(),
            accuracy,
            outcome.anomaly_timestamps.len()
        );
        if let Some(reason) = &outcome.unavailable {
            println!("{:<20} | {:<10} |   -> {}", "", "", reason);
        }
    }
    println!();
}
