use std::path::PathBuf;

use colored::Colorize;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};
use crate::store::ACTUALS_FILE;

pub fn run(dir: &str) -> Result<()> {
    let mut settings = load_settings();
    settings.data_dir = shellexpand_path(dir);
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    println!("Data directory set to {}", resolved.display());
    if !resolved.join(ACTUALS_FILE).exists() {
        println!(
            "{}",
            format!("Warning: {ACTUALS_FILE} not found there yet.").yellow()
        );
    }
    Ok(())
}
