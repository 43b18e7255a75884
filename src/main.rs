use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use specs_sync::config::{Config, APP_VERSION};
use specs_sync::db::SpecStore;
use specs_sync::google::GoogleClient;
use specs_sync::pipeline::reject::{RejectConfig, RejectService};
use specs_sync::pipeline::sync::{SyncConfig, SyncService};

mod cli;
use cli::{Cli, Command, RejectArgs, SyncArgs};

const HTTP_TIMEOUT_SECS: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("invalid configuration")?;
    specs_sync::init_tracing(&config);

    tracing::info!(
        version = APP_VERSION,
        env = config.app_env.as_str(),
        database = %config.database_path.display(),
        "specs-sync starting"
    );

    let store = Arc::new(
        SpecStore::open(&config.database_path)
            .with_context(|| format!("cannot open {}", config.database_path.display()))?,
    );

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            shutdown.cancel();
        }
    });

    match cli.command {
        Command::Sync(args) => run_sync(&config, store, args, &token).await,
        Command::Reject(args) => run_reject(&config, store, args, &token).await,
        Command::Specs(args) => print_json(&store.list(&args.into_query())?),
        Command::Authors => print_json(&store.authors()?),
        Command::Teams => print_json(&store.teams()?),
    }
}

async fn connect(config: &Config) -> Result<Arc<GoogleClient>> {
    let client = GoogleClient::new(config.access_token()?, HTTP_TIMEOUT_SECS)?;
    client
        .verify()
        .await
        .context("Google API connectivity check failed")?;
    Ok(Arc::new(client))
}

async fn run_sync(
    config: &Config,
    store: Arc<SpecStore>,
    args: SyncArgs,
    token: &CancellationToken,
) -> Result<()> {
    let sync_config = SyncConfig::from_config(config)?;
    let client = connect(config).await?;
    let service = SyncService::new(client, store, sync_config);

    // The first traversal after start-up always re-extracts.
    let mut force = true;
    loop {
        match service.run(token, force || args.force).await {
            Ok(report) if args.once => print_json(&report)?,
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "Spec sync failed"),
        }
        force = false;

        if args.once || !wait(token, config.sync_interval).await {
            return Ok(());
        }
    }
}

async fn run_reject(
    config: &Config,
    store: Arc<SpecStore>,
    args: RejectArgs,
    token: &CancellationToken,
) -> Result<()> {
    let client = connect(config).await?;
    let reject_config = RejectConfig {
        dry_run: args.dry_run,
        ..RejectConfig::from_config(config)
    };
    let service = RejectService::new(client, store, reject_config);

    if let Some(doc_id) = args.doc_id.as_deref() {
        let outcome = service.reject_by_doc_id(doc_id).await?;
        return print_json(&outcome);
    }

    let once = args.once || args.dry_run;
    loop {
        match service.reject_all_stale(token).await {
            Ok(report) if once => print_json(&report)?,
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "Stale spec rejection failed"),
        }

        if once || !wait(token, config.reject_interval).await {
            return Ok(());
        }
    }
}

/// Sleep for `interval`. Returns false if cancelled first.
async fn wait(token: &CancellationToken, interval: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(interval) => true,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
