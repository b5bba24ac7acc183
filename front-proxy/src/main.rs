#![forbid(unsafe_code)]

use clap::Parser;
use front_proxy_lib::config::load_from_path;
use front_proxy_lib::telemetry::init_tracing;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-tenant front proxy with per-identity rate limiting")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "FRONT_PROXY_CONFIG",
        default_value = "config/front-proxy.toml"
    )]
    config: PathBuf,

    /// Override the configured log level (RUST_LOG still takes precedence)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut cfg = match load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            init_fallback_tracing();
            error!(%err, path = %cli.config.display(), "failed to load configuration");
            std::process::exit(1);
        }
    };

    if let Some(level) = cli.log_level {
        cfg.logging.level = level;
    }
    if let Err(err) = init_tracing(&cfg.logging, &cfg.telemetry.otel_log_level) {
        init_fallback_tracing();
        error!(%err, "failed to initialize tracing");
        std::process::exit(1);
    }

    info!(
        listen = ?cfg.listen,
        backends = cfg.backends.len(),
        routes = cfg.routes.len(),
        "configuration loaded"
    );

    if let Err(err) = front_proxy_lib::run(Arc::new(cfg)).await {
        error!(%err, "proxy exited with error");
        std::process::exit(1);
    }
}

fn init_fallback_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
