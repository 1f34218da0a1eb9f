use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use notafix::batch;
use notafix::config;

/// Batch renamer and field rewriter for Brazilian fiscal XML documents.
#[derive(Debug, Parser)]
#[command(name = "notafix", version, about)]
struct Cli {
    /// Path to the company configuration file.
    #[arg(long, default_value = "companies.json")]
    config: PathBuf,

    /// Name of the company profile to run.
    #[arg(long)]
    company: String,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let companies = match config::load_companies(&cli.config) {
        Ok(companies) => companies,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let company = match config::select_company(&companies, &cli.company) {
        Ok(company) => company,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match batch::run(company) {
        Ok(summary) => {
            println!(
                "done: {} renamed, {} skipped, {} edited, {} errors",
                summary.renamed, summary.skipped, summary.edited, summary.errors
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
