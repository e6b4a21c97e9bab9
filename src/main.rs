use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod error;
mod iq;
mod models;
mod report;
mod source;
mod stats;

use crate::iq::ScoringConfig;
use crate::models::ScoreRun;

#[derive(Parser)]
#[command(name = "flooriq-iq")]
#[command(about = "Equipment utilization IQ scoring for the gym floor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ScoringArgs {
    /// CSV or JSON file of utilization records
    #[arg(long)]
    input: PathBuf,
    /// Hours the facility is open per reporting period
    #[arg(long, env = "FLOORIQ_PERIOD_HOURS", default_value_t = iq::DEFAULT_PERIOD_HOURS)]
    period_hours: f64,
    /// Members a category needs before it gets its own baseline
    #[arg(long, env = "FLOORIQ_MIN_CATEGORY_SAMPLES", default_value_t = iq::DEFAULT_MIN_CATEGORY_SAMPLES)]
    min_category_samples: usize,
}

impl ScoringArgs {
    fn run(&self) -> anyhow::Result<ScoreRun> {
        let config = ScoringConfig::new(self.period_hours, self.min_category_samples)?;
        let records = source::load_records(&self.input)?;
        iq::score_all(&records, &config).context("failed to score utilization records")
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print equipment ranked by IQ
    Score {
        #[command(flatten)]
        scoring: ScoringArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        scoring: ScoringArgs,
        /// Any date inside the reporting week (defaults to today)
        #[arg(long)]
        week_of: Option<NaiveDate>,
        #[arg(long, default_value_t = 5)]
        limit: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Print the facility IQ summary as JSON
    Summary {
        #[command(flatten)]
        scoring: ScoringArgs,
        #[arg(long)]
        week_of: Option<NaiveDate>,
    },
    /// Print every scored record as JSON
    Equipment {
        #[command(flatten)]
        scoring: ScoringArgs,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Score { scoring, limit } => {
            let run = scoring.run()?;

            if run.records.is_empty() {
                println!("No equipment found in {}.", scoring.input.display());
                return Ok(());
            }

            println!(
                "Facility IQ {} ({}) across {} machines",
                run.facility.score,
                run.facility.band,
                run.records.len()
            );
            println!("Top equipment by IQ:");
            for item in report::ranked_by_iq(&run).iter().take(limit) {
                println!(
                    "- {} ({}) IQ {} ({:+} pts, {:?}) at {:.2} min/hr",
                    item.record.name.as_deref().unwrap_or(&item.record.id),
                    item.record.category,
                    item.iq,
                    item.delta_iq,
                    item.trend,
                    item.current_rate
                );
            }
        }
        Commands::Report {
            scoring,
            week_of,
            limit,
            out,
        } => {
            let run = scoring.run()?;
            let week = report::week_label(week_of.unwrap_or_else(|| Local::now().date_naive()));
            let output = report::build_report(&run, &week, limit);
            std::fs::write(&out, output)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Summary { scoring, week_of } => {
            let run = scoring.run()?;
            let week = report::week_label(week_of.unwrap_or_else(|| Local::now().date_naive()));
            println!(
                "{}",
                serde_json::to_string_pretty(&report::summary_payload(&run, &week))?
            );
        }
        Commands::Equipment { scoring } => {
            let run = scoring.run()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&report::equipment_payload(&run))?
            );
        }
    }

    Ok(())
}
