//! Config check command handler.

use anyhow::{Context, Result};

use tgrelay::config::validate::{validate_config, validate_values, DiagnosticLevel};
use tgrelay::config::Config;

use super::ConfigAction;

/// Validate configuration file and the effective settings.
pub(crate) async fn cmd_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Check => {
            let config_path = Config::path();
            println!("Config file: {}", config_path.display());

            let mut diagnostics = Vec::new();
            if config_path.exists() {
                let content = std::fs::read_to_string(&config_path)
                    .context("Failed to read config file")?;
                match serde_json::from_str::<serde_json::Value>(&content) {
                    Ok(raw) => diagnostics.extend(validate_config(&raw)),
                    Err(e) => {
                        println!("[ERROR] Invalid JSON: {}", e);
                        return Ok(());
                    }
                }
            } else {
                println!("[OK] No config file found (using defaults)");
            }

            // Effective values include TGRELAY_* overrides.
            let effective = Config::load().with_context(|| "Failed to load configuration")?;
            diagnostics.extend(validate_values(&effective));

            for diag in &diagnostics {
                println!("{}", diag);
            }

            let errors = diagnostics
                .iter()
                .filter(|d| d.level == DiagnosticLevel::Error)
                .count();
            let warnings = diagnostics
                .iter()
                .filter(|d| d.level == DiagnosticLevel::Warn)
                .count();

            println!("Storage dir: {}", effective.storage_dir().display());
            if errors == 0 && warnings == 0 {
                println!("\nConfiguration looks good!");
            } else {
                println!("\nFound {} error(s), {} warning(s)", errors, warnings);
            }
        }
    }
    Ok(())
}
