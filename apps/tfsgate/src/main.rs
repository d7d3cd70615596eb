//! tfsgate entry point.

mod app;
mod config;
mod logging;

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "tfsgate", version, about = "HTTP put/get gateway for TFS")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "TFSGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration file.
    #[arg(short, long)]
    listen: Option<String>,

    /// Name server address (`ip:port`), overriding the configuration file.
    #[arg(long)]
    ns_addr: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let log_level = logging::init()?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting tfsgate");

    let mut config = config::Config::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(ns_addr) = args.ns_addr {
        config.gateway.ns_addr = ns_addr;
    }
    tracing::info!(
        listen = %config.listen,
        ns_addr = %config.gateway.ns_addr,
        chunk_size = config.gateway.chunk_size,
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config, log_level))?;

    tracing::info!("gateway shut down cleanly");
    Ok(())
}
