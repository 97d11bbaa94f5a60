pub mod ask;
pub mod init;
pub mod kpi;
pub mod render;
pub mod status;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(
    name = "cfo-copilot",
    version,
    about = "Answer CFO questions about monthly actuals, budget and cash."
)]
pub struct Cli {
    /// Directory holding actuals_m.csv, budget_m.csv, cash_m.csv (and optional fx_m.csv)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,
    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute one KPI from flags.
    Kpi {
        /// revenue_vs_budget, gross_margin_pct, opex_breakdown, ebitda_proxy or cash_runway
        kind: String,
        /// Start month: YYYY-MM (inclusive)
        #[arg(long = "from")]
        period_start: Option<String>,
        /// End month: YYYY-MM (inclusive)
        #[arg(long = "to")]
        period_end: Option<String>,
        /// Single month: YYYY-MM (overrides --from/--to)
        #[arg(long)]
        month: Option<String>,
        /// Entity / business unit (case-insensitive)
        #[arg(long)]
        entity: Option<String>,
        /// Print rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Execute a classifier intent given as JSON, or @path to a JSON file.
    Intent {
        intent: String,
        #[arg(long)]
        json: bool,
    },
    /// Answer a question with the offline keyword classifier and template narrator.
    Ask {
        question: String,
        #[arg(long)]
        json: bool,
    },
    /// Print the JSON schema intent classifiers must produce.
    Schema,
    /// Show the data directory and loaded tables.
    Status,
    /// Save the default data directory.
    Init {
        /// Path to the normalized CSV exports
        dir: String,
    },
    /// Print shell completions.
    Completions { shell: Shell },
}
