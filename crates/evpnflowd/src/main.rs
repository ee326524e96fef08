//! EVPN Flow Daemon Entry Point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use evpnflowd::config::DEFAULT_CONFIG_PATH;
use evpnflowd::feed;
use evpnflowd::host::{HostDiscovery, InterfaceDiscovery, StaticHost};
use evpnflowd::inventory::FileInventory;
use evpnflowd::{EvpnFlowConfig, EvpnFlowMgr, OvsOfctl};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs Open vSwitch overlay flows from EVPN MAC/IP advertisements
#[derive(Parser, Debug)]
#[command(name = "evpnflowd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Advertisement feed (newline-delimited JSON), `-` for stdin
    #[arg(short = 'f', long, default_value = "-")]
    feed: String,

    /// Log level when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Log add-flow commands instead of running them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting evpnflowd");

    let config = EvpnFlowConfig::load_or_default(&args.config)?;
    config.validate()?;

    let switch = OvsOfctl::new(config.switch.bridge.clone())
        .with_ofctl_path(config.switch.ofctl_path.clone())
        .with_timeout(config.command_timeout())
        .with_dry_run(args.dry_run);

    let host: Arc<dyn HostDiscovery> = match config.static_host()? {
        Some(identity) => Arc::new(StaticHost(identity)),
        None => Arc::new(
            InterfaceDiscovery::new(config.host.fabric_interface.clone())
                .with_timeout(config.command_timeout()),
        ),
    };

    let mut mgr = EvpnFlowMgr::new(
        Arc::new(switch),
        Arc::new(FileInventory::new(config.inventory.path.clone())),
        host,
    )
    .with_endpoint_capacity(config.endpoints.capacity);

    info!(
        bridge = %config.switch.bridge,
        inventory = %config.inventory.path.display(),
        dry_run = args.dry_run,
        "evpnflowd initialized"
    );

    let result = if args.feed == "-" {
        feed::run(&mut mgr, tokio::io::stdin()).await
    } else {
        let file = tokio::fs::File::open(&args.feed)
            .await
            .with_context(|| format!("cannot open feed {}", args.feed))?;
        feed::run(&mut mgr, file).await
    };
    let stats = result.context("feed read failed")?;

    info!(processed = stats.processed, "evpnflowd exiting");
    Ok(())
}
