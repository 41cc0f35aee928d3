use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::RegisterVersion;
use common::cli::{CommonArgs, utils};
use common::config::Configuration;
use retention::{
    ManifestVersionStore, RetentionEnforcer, RetentionError, RetentionMetrics, RetentionPolicy,
    VersionManager, VersionStore,
};

/// Shelflife: retention and pruning for application versions
#[derive(Parser, Debug)]
#[command(name = "shelflife", version, about)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Policy flags; either one replaces the configured policy for the run.
#[derive(clap::Args, Debug, Clone, Default)]
struct PolicyArgs {
    /// Number of most recent versions always kept
    #[arg(long)]
    keep_count: Option<usize>,

    /// Versions past the count floor older than this are deleted (e.g. 720h, 30days)
    #[arg(long, value_parser = humantime::parse_duration)]
    keep_period: Option<Duration>,
}

impl PolicyArgs {
    fn explicit(&self) -> Option<RetentionPolicy> {
        if self.keep_count.is_none() && self.keep_period.is_none() {
            return None;
        }
        Some(RetentionPolicy::new(
            self.keep_count.unwrap_or(0),
            self.keep_period.unwrap_or(Duration::ZERO),
        ))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show which versions a prune would delete
    Plan {
        application: String,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Delete the versions the retention policy no longer keeps
    Prune {
        application: String,
        #[command(flatten)]
        policy: PolicyArgs,
        /// Delete for real even when the configuration enables dry-run
        #[arg(long)]
        execute: bool,
    },
    /// List registered versions of an application, newest first
    List { application: String },
    /// Register a new version
    Register {
        application: String,
        label: String,
        #[arg(long)]
        description: Option<String>,
        /// Bucket holding the source bundle
        #[arg(long, requires = "key")]
        bucket: Option<String>,
        /// Object key of the source bundle
        #[arg(long, requires = "bucket")]
        key: Option<String>,
    },
    /// Show a single version
    Describe { application: String, label: String },
    /// Replace the description of a version
    UpdateDescription {
        application: String,
        label: String,
        description: String,
    },
    /// Delete a version, pruning the application when a policy is configured
    Delete { application: String, label: String },
    /// Show current configuration and exit
    Config {
        #[arg(long, help = "Show configuration in JSON format")]
        json: bool,
    },
    /// Validate configuration and exit
    Validate,
    /// Show version information and exit
    Version,
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn build_manager(config: &Configuration, dry_run: bool) -> Result<VersionManager> {
    let store: Arc<dyn VersionStore> =
        Arc::new(ManifestVersionStore::new(&config.store.manifest_path));
    let enforcer = RetentionEnforcer::new(
        store.clone(),
        config.retention.clone(),
        RetentionMetrics::new(),
    )
    .context("Failed to initialize retention enforcer")?
    .with_dry_run(dry_run);
    Ok(VersionManager::new(store, enforcer))
}

impl Cli {
    async fn run(self) -> Result<()> {
        let config = utils::load_config(self.common.config.as_ref())?;
        utils::init_logging(&self.common, &config.logging);

        match self.command {
            Commands::Config { json } => utils::display_config(&config, json),
            Commands::Validate => utils::validate_config(&config),
            Commands::Version => {
                println!("{}", utils::version_info());
                Ok(())
            }
            command => run_command(command, &config).await,
        }
    }
}

async fn run_command(command: Commands, config: &Configuration) -> Result<()> {
    let dry_run = match &command {
        Commands::Prune { execute, .. } => config.retention.dry_run && !execute,
        _ => config.retention.dry_run,
    };
    let manager = build_manager(config, dry_run)?;
    let enforcer = manager.enforcer();

    match command {
        Commands::Plan {
            application,
            policy,
        } => {
            let policy = policy
                .explicit()
                .unwrap_or_else(|| enforcer.policy_resolver().resolve(&application).policy);
            let selected = enforcer.plan(&application, &policy).await?;
            print_json(&serde_json::json!({
                "application": application,
                "policy": policy,
                "selected": selected,
            }))?;
        }
        Commands::Prune {
            application,
            policy,
            ..
        } => {
            let report = match policy.explicit() {
                Some(policy) => enforcer.enforce_with_policy(&application, policy).await?,
                None => enforcer.enforce(&application).await?,
            };
            print_json(&report)?;
        }
        Commands::List { application } => {
            print_json(&manager.list(&application).await?)?;
        }
        Commands::Register {
            application,
            label,
            description,
            bucket,
            key,
        } => {
            let mut request = RegisterVersion::new(&application, &label);
            if let Some(description) = description {
                request = request.with_description(description);
            }
            if let (Some(bucket), Some(key)) = (bucket, key) {
                request = request.with_source_bundle(bucket, key);
            }
            print_json(&manager.register(request).await?)?;
        }
        Commands::Describe { application, label } => {
            let Some(version) = manager.describe(&application, &label).await? else {
                anyhow::bail!("Version '{label}' of application '{application}' not found");
            };
            print_json(&version)?;
        }
        Commands::UpdateDescription {
            application,
            label,
            description,
        } => {
            let version = manager
                .update_description(&application, &label, &description)
                .await?;
            print_json(&version)?;
        }
        Commands::Delete { application, label } => {
            print_json(&manager.delete(&application, &label).await?)?;
        }
        Commands::Config { .. } | Commands::Validate | Commands::Version => {}
    }

    enforcer.metrics().log_summary();
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        if let Some(store_error) = e
            .downcast_ref::<RetentionError>()
            .and_then(RetentionError::store_error)
        {
            eprintln!("  store error kind: {}", store_error.kind());
        }
        std::process::exit(1);
    }
}
