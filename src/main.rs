mod classifier;
mod cli;
mod copilot;
mod error;
mod filter;
mod fmt;
mod intent;
mod kpi;
mod models;
mod month;
mod narrator;
mod router;
mod settings;
mod store;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let data_dir = settings::resolve_data_dir(cli.data_dir.as_deref());

    let result = match cli.command {
        Commands::Kpi {
            kind,
            period_start,
            period_end,
            month,
            entity,
            json,
        } => {
            let raw = cli::kpi::intent_from_flags(kind, period_start, period_end, month, entity);
            cli::kpi::run(&data_dir, raw, json)
        }
        Commands::Intent { intent, json } => {
            cli::kpi::intent_from_input(&intent).and_then(|raw| cli::kpi::run(&data_dir, raw, json))
        }
        Commands::Ask { question, json } => cli::ask::run(&data_dir, &question, json),
        Commands::Schema => serde_json::to_string_pretty(&intent::intent_schema())
            .map(|s| println!("{s}"))
            .map_err(error::CopilotError::from),
        Commands::Status => cli::status::run(&data_dir),
        Commands::Init { dir } => cli::init::run(&dir),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
