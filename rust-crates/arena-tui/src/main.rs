use arena_client::{
    config::{
        Args,
        LookupKind,
    },
    http::ReqwestTransport,
    sui_client::SuiClient,
    walrus_client::WalrusClient,
    wallets::{
        list_wallets,
        resolve_wallet_dir,
    },
};
use clap::Parser;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::{
    fmt::Debug,
    path::Path,
    sync::OnceLock,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

mod client;
mod ui;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Logs go to a daily file; the terminal belongs to the UI.
fn init_tracing(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .wrap_err_with(|| format!("failed to create log dir {}", log_dir.display()))?;
    let appender = rolling::daily(log_dir, "arena-tui.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| eyre!(e))
}

fn print_record<R: Debug>(object_id: &str, record: Option<R>) {
    match record {
        Some(record) => println!("{record:#?}"),
        None => println!("object {object_id} not found"),
    }
}

async fn lookup(args: &Args, object_id: &str) -> Result<()> {
    let sui = SuiClient::new(ReqwestTransport::new()?, args.rpc_url());
    match args.lookup_kind {
        LookupKind::Object => match sui.get_object(object_id).await? {
            Some(fields) => println!("{}", serde_json::to_string_pretty(&fields)?),
            None => println!("object {object_id} not found"),
        },
        LookupKind::Agent => print_record(object_id, sui.agent(object_id).await?),
        LookupKind::Battle => print_record(object_id, sui.battle(object_id).await?),
        LookupKind::Tournament => print_record(object_id, sui.tournament(object_id).await?),
    }
    Ok(())
}

async fn fetch_blob(args: &Args, blob_id: &str) -> Result<()> {
    let relay = args.relay_config();
    let walrus = WalrusClient::new(
        ReqwestTransport::new()?,
        relay.publishers,
        relay.aggregator_url,
    );
    match walrus.fetch(blob_id).await {
        Some(payload) => println!("{}", serde_json::to_string_pretty(&payload)?),
        None => println!("blob {blob_id} not available at {}", walrus.blob_url(blob_id)),
    }
    Ok(())
}

fn print_wallets(args: &Args) -> Result<()> {
    let dir = resolve_wallet_dir(args.wallet_dir.as_deref());
    let wallets = list_wallets(&dir)?;
    if wallets.is_empty() {
        println!("no wallet profiles in {}", dir.display());
    }
    for wallet in wallets {
        println!("{}\t{}", wallet.name, wallet.path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_tracing(&args.log_dir)?;
    tracing::info!(network = %args.network, "starting arena client");

    if args.list_wallets {
        return print_wallets(&args);
    }
    if let Some(object_id) = &args.lookup_object {
        return lookup(&args, object_id).await;
    }
    if let Some(blob_id) = &args.fetch_blob {
        return fetch_blob(&args, blob_id).await;
    }
    client::run_app(args.app_config()).await
}
