use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand};
use std::error::Error;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use serenity_scribe::config;
use serenity_scribe::ingest::read_events;
use serenity_scribe::report::SerenityReporter;
use serenity_scribe::scribe::Scribe;

/// Serenity Scribe - Serenity JSON reports from BDD test-runner event logs
#[derive(Parser, Debug)]
#[command(
    name = "serenity-scribe",
    about = "Folds BDD test-runner event logs into per-scenario Serenity JSON reports",
    after_help = "ENVIRONMENT VARIABLES:\n\
        SERENITY_SCRIBE_OUTPUT_DIR   Root directory for report files\n\
        SERENITY_SCRIBE_STRICT       Fail on malformed event sequences (true/false)\n\
        SERENITY_SCRIBE_PRETTY       Pretty-print report files (true/false)\n\
        RUST_LOG                     Log filter (default: warn)"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write one report file per scenario found in an event log
    Report {
        /// Event log (JSON Lines or a JSON array)
        #[arg(short, long)]
        events: PathBuf,

        /// Output directory
        #[arg(short, long, env = config::ENV_OUTPUT_DIR, default_value = config::DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        /// Fail on malformed event sequences instead of skipping offending events
        #[arg(long, env = config::ENV_STRICT, value_parser = BoolishValueParser::new())]
        strict: bool,

        /// Pretty-print report files
        #[arg(long, env = config::ENV_PRETTY, value_parser = BoolishValueParser::new())]
        pretty: bool,
    },

    /// Print the reports of an event log to stdout as a JSON array
    Inspect {
        /// Event log (JSON Lines or a JSON array)
        #[arg(short, long)]
        events: PathBuf,

        /// Fail on malformed event sequences instead of skipping offending events
        #[arg(long, env = config::ENV_STRICT, value_parser = BoolishValueParser::new())]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match args.command {
        Some(Commands::Report {
            events,
            output,
            strict,
            pretty,
        }) => {
            let reporter = SerenityReporter::new().strict(strict);
            let reports = reporter.render(read_events(&events).await?).await?;

            let scribe = Scribe::new(&output).pretty(pretty);
            let written = scribe.write_all(&reports).await?;

            println!("Wrote {} report(s) to {}", written.len(), output.display());
            for path in &written {
                println!("  {}", path.display());
            }
        }

        Some(Commands::Inspect { events, strict }) => {
            let reporter = SerenityReporter::new().strict(strict);
            let reports = reporter.report_on(read_events(&events).await?).await?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }

        None => {
            println!("Serenity Scribe - Serenity JSON reports from BDD test-runner event logs");
            println!();
            println!("Usage: serenity-scribe <COMMAND>");
            println!();
            println!("Commands:");
            println!("  report   Write one report file per scenario found in an event log");
            println!("  inspect  Print the reports of an event log to stdout");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}
