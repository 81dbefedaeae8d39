//! PGx Command-Line Tool
//!
//! Pharmacogenomic dose and risk assessment from JSON requests.
//!
//! Usage:
//!   pgx assess <request.json>
//!   pgx batch <requests.json> [--sequential]
//!   pgx hla <drug> --hla-b HLA-B*5701
//!   pgx pk <drug> --dose <mg> [--level <x>]...
//!   pgx catalog [<subject>]
//!
//! Logs go to stderr (`RUST_LOG` overrides the default `pgx=info`).

mod cli_tools;

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pgx")]
#[command(version)]
#[command(about = "Pharmacogenomic dosing and risk stratification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Output file (stdout if not specified)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Extra population PK priors (JSON object keyed by drug name)
    #[arg(long, global = true)]
    pk_priors: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess one request (JSON file, or - for stdin)
    Assess {
        request: PathBuf,
    },

    /// Assess a JSON array of requests
    #[cfg(feature = "parallel")]
    Batch {
        requests: PathBuf,

        /// Disable parallel processing
        #[arg(long)]
        sequential: bool,
    },

    /// Screen HLA typing against a drug
    Hla {
        drug: String,

        #[arg(long = "hla-a", value_delimiter = ',')]
        hla_a: Vec<String>,

        #[arg(long = "hla-b", value_delimiter = ',')]
        hla_b: Vec<String>,

        #[arg(long = "hla-drb1", value_delimiter = ',')]
        hla_drb1: Vec<String>,
    },

    /// Bayesian PK estimate for a drug with a population prior
    Pk {
        drug: String,

        /// Current dose
        #[arg(short, long)]
        dose: f64,

        /// Measured level, oldest first (repeatable)
        #[arg(short, long = "level")]
        levels: Vec<f64>,

        #[arg(long, default_value = "50")]
        age: f64,

        #[arg(long, default_value = "70")]
        weight: f64,

        #[arg(long, default_value = "1.0")]
        creatinine: f64,
    },

    /// Show reference tables (optionally one enzyme or transporter)
    Catalog {
        subject: Option<String>,
    },
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("pgx=info".parse()?))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let engine = cli_tools::build_engine(cli.pk_priors.as_deref())?;
    let out = cli_tools::Output::new(cli.format, cli.output);

    match cli.command {
        Commands::Assess { request } => cli_tools::assess(&engine, &request, &out),
        #[cfg(feature = "parallel")]
        Commands::Batch {
            requests,
            sequential,
        } => cli_tools::batch(&engine, &requests, !sequential, &out),
        Commands::Hla {
            drug,
            hla_a,
            hla_b,
            hla_drb1,
        } => {
            let alleles = pgx_core::AlleleSet {
                hla_a,
                hla_b,
                hla_drb1,
            };
            cli_tools::hla(&engine, &drug, &alleles, &out)
        }
        Commands::Pk {
            drug,
            dose,
            levels,
            age,
            weight,
            creatinine,
        } => {
            let covariates = pgx_core::PatientCovariates {
                age,
                weight,
                creatinine,
                ..Default::default()
            };
            cli_tools::pk(&engine, &drug, dose, &covariates, &levels, &out)
        }
        Commands::Catalog { subject } => cli_tools::catalog(&engine, subject.as_deref(), &out),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("{} Failed to initialize logging: {}", "Error:".red().bold(), e);
    }

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
