#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ocean_engine::config::load_config_from_path;
use ocean_engine::parity::{load_cases_jsonl, run_parity_cases, TRAIT_TOLERANCE};
use ocean_engine::simulation::{export_parity_cases, run_synthetic_suite};
use ocean_engine::{EngineConfig, ScoringEngine, ScoringRequest};

#[derive(Parser)]
#[command(name = "ocean", version, about = "Big Five scoring engine CLI")]
struct Cli {
    /// Engine config JSON (question bank, persona catalog, matching parameters)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a request JSON (`{"answers": {...}}`)
    Score {
        #[arg(long)]
        request: PathBuf,
        /// Output path (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Emit the full scoring report instead of the response
        #[arg(long, conflicts_with = "record")]
        report: bool,
        /// Emit the persisted-record shape (raw answers + result + metadata)
        #[arg(long)]
        record: bool,
    },
    /// Inspect the question bank
    Bank {
        #[command(subcommand)]
        command: BankCommands,
    },
    /// Inspect the persona catalog
    Personas {
        #[command(subcommand)]
        command: PersonaCommands,
    },
    /// Check reference responses from another engine (JSONL of parity cases)
    Parity {
        #[arg(long)]
        cases: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = TRAIT_TOLERANCE)]
        tolerance: f64,
    },
    /// Write this engine's responses to the synthetic cases as parity fixtures
    ParityExport {
        #[arg(long)]
        out: PathBuf,
    },
    /// Run the synthetic respondent suite
    Eval {
        #[arg(long)]
        case: Option<String>,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum BankCommands {
    /// Write the bank as JSON
    Export {
        #[arg(long)]
        out: PathBuf,
    },
    /// Per-trait item counts and weights
    Stats,
}

#[derive(Subcommand)]
enum PersonaCommands {
    List,
    Show {
        #[arg(long)]
        id: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config_from_path(path)?,
        None => EngineConfig::default(),
    };
    let engine = ScoringEngine::from_config(&config)?;

    match cli.command {
        Commands::Score {
            request,
            out,
            report,
            record,
        } => {
            let req: ScoringRequest = read_json(&request)?;
            let json = if report {
                serde_json::to_string_pretty(&engine.score(&req.answers)?)?
            } else if record {
                serde_json::to_string_pretty(&engine.record(&req.answers, chrono::Utc::now())?)?
            } else {
                serde_json::to_string_pretty(&engine.respond(&req)?)?
            };
            emit(out.as_ref(), &json)?;
        }
        Commands::Bank { command } => match command {
            BankCommands::Export { out } => {
                write_json(&out, &engine.bank().to_file(None))?;
            }
            BankCommands::Stats => {
                println!("{}", serde_json::to_string_pretty(&engine.bank().stats())?);
            }
        },
        Commands::Personas { command } => match command {
            PersonaCommands::List => {
                for p in engine.catalog().all() {
                    let marker = if p.is_diagnostic() { " (diagnostic)" } else { "" };
                    println!("{}\t{}{marker}", p.id, p.title);
                }
            }
            PersonaCommands::Show { id } => match engine.catalog().get(&id) {
                Some(p) => println!("{}", serde_json::to_string_pretty(p)?),
                None => {
                    let available: Vec<&str> =
                        engine.catalog().all().iter().map(|p| p.id.as_str()).collect();
                    return Err(format!(
                        "unknown persona '{id}'; available personas: {}",
                        available.join(", ")
                    )
                    .into());
                }
            },
        },
        Commands::Parity {
            cases,
            out,
            tolerance,
        } => {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err("--tolerance must be finite and >= 0".into());
            }
            let cases = load_cases_jsonl(&cases)?;
            let reports = run_parity_cases(&engine, &cases, tolerance);
            write_jsonl(&out, &reports)?;
            let failed = reports.iter().filter(|r| !r.passed).count();
            println!(
                "{} cases; {} passed; {} failed",
                reports.len(),
                reports.len() - failed,
                failed
            );
            if failed > 0 {
                return Err(format!("{failed} parity case(s) failed").into());
            }
        }
        Commands::ParityExport { out } => {
            let cases = export_parity_cases(&engine)?;
            write_jsonl(&out, &cases)?;
        }
        Commands::Eval { case, out } => {
            let results = run_synthetic_suite(&engine, case.as_deref())?;
            if results.is_empty() {
                return Err("no synthetic case matched --case".into());
            }
            write_jsonl(&out, &results)?;
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(
    path: &PathBuf,
) -> Result<T, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_json<T: serde::Serialize>(path: &PathBuf, value: &T) -> Result<(), io::Error> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    std::fs::write(path, json)
}

fn write_jsonl<T: serde::Serialize>(path: &PathBuf, values: &[T]) -> Result<(), io::Error> {
    let mut file = File::create(path)?;
    for value in values {
        let line = serde_json::to_string(value).map_err(io::Error::other)?;
        writeln!(file, "{line}")?;
    }
    Ok(())
}

fn emit(out: Option<&PathBuf>, json: &str) -> Result<(), io::Error> {
    match out {
        Some(path) => std::fs::write(path, json),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}")
        }
    }
}
