use clap::Parser;
use std::path::PathBuf;

/// Common CLI arguments shared across all binaries
#[derive(Parser, Debug, Clone, Default)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Enable quiet mode (minimal output)")]
    pub quiet: bool,
}

/// Utility functions for CLI operations
pub mod utils {
    use super::*;
    use crate::config::{Configuration, LoggingConfig};
    use anyhow::{Context, Result};
    use tracing_subscriber::EnvFilter;

    /// Filter directive derived from CLI flags, falling back to the configured level
    pub fn log_level<'a>(args: &CommonArgs, logging: &'a LoggingConfig) -> &'a str {
        if args.quiet {
            "warn"
        } else if args.verbose {
            "debug"
        } else {
            logging.level.as_str()
        }
    }

    /// Initialize logging based on CLI arguments.
    ///
    /// Explicit `--verbose`/`--quiet` win over RUST_LOG, which wins over the
    /// configured level.
    pub fn init_logging(args: &CommonArgs, logging: &LoggingConfig) {
        let level = log_level(args, logging);
        let filter = if args.quiet || args.verbose {
            EnvFilter::new(level)
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Load configuration with optional override from CLI
    pub fn load_config(config_path: Option<&PathBuf>) -> Result<Configuration> {
        match config_path {
            Some(path) => Configuration::load_from_path(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display())),
            None => Configuration::load().context("Failed to load configuration"),
        }
    }

    /// Display configuration in human-readable or JSON format
    pub fn display_config(config: &Configuration, json: bool) -> Result<()> {
        if json {
            let json = serde_json::to_string_pretty(config)
                .context("Failed to serialize configuration to JSON")?;
            println!("{json}");
        } else {
            println!("Shelflife Configuration:");
            println!("========================");
            println!("Log level: {}", config.logging.level);
            println!("Manifest path: {}", config.store.manifest_path.display());
            println!("Default keep count: {}", config.retention.keep_count);
            println!("Default keep period: {:?}", config.retention.keep_period);
            println!("Dry run: {}", config.retention.dry_run);

            let mut applications: Vec<_> = config.retention.applications.iter().collect();
            applications.sort_by(|a, b| a.0.cmp(b.0));
            for (application, overrides) in applications {
                println!(
                    "Override {application}: keep_count={:?} keep_period={:?}",
                    overrides.keep_count, overrides.keep_period
                );
            }
        }
        Ok(())
    }

    /// Validate configuration and report any issues
    pub fn validate_config(config: &Configuration) -> Result<()> {
        tracing::info!("Validating configuration...");

        if config.store.manifest_path.as_os_str().is_empty() {
            anyhow::bail!("Manifest path cannot be empty");
        }

        config
            .retention
            .validate()
            .context("Invalid retention configuration")?;

        tracing::info!("Configuration validation passed");
        Ok(())
    }

    /// Standard version information
    pub fn version_info() -> String {
        format!(
            "{} {} ({})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_RUST_VERSION")
        )
    }
}
