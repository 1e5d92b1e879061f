use anyhow::Context;
use clap::Parser;
use tcpkv::config::{Cli, ServerConfig};
use tcpkv::server;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            init_tracing("info");
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level
    init_tracing(&config.log_level);

    info!("tcpkv starting...");

    let shutdown = CancellationToken::new();

    // Ctrl-C stops the loop the same way QUIT does
    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received");
            interrupt.cancel();
        }
    });

    if let Err(e) = serve(config, shutdown).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    info!("tcpkv stopped");
}

async fn serve(config: ServerConfig, shutdown: CancellationToken) -> anyhow::Result<()> {
    let listener = server::bind(&config)
        .with_context(|| format!("cannot listen on {}", config.addr()))?;

    server::run(listener, &config, shutdown)
        .await
        .context("server stopped with an error")?;

    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
