// chatrelay: command-line entrypoint.

use chatrelay_lib::engine::settings::Settings;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chatrelay", version, about = "Twitch chat relay dashboard")]
struct Cli {
    /// Address the dashboard binds to (overrides the settings file)
    #[arg(long, env = "CHATRELAY_BIND")]
    bind: Option<String>,

    /// Dashboard port (overrides the settings file)
    #[arg(long, env = "CHATRELAY_PORT")]
    port: Option<u16>,

    /// Settings file [default: <config dir>/chatrelay/config.toml]
    #[arg(long, env = "CHATRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "chatrelay_lib=debug" [default: RUST_LOG or info]
    #[arg(long, env = "CHATRELAY_LOG")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(filter) = &cli.log_level {
        logger.parse_filters(filter);
    }
    logger.format_timestamp_secs().init();

    let mut settings = match Settings::load(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            error!("[settings] {}", e);
            std::process::exit(1);
        }
    };
    if let Some(bind) = cli.bind {
        settings.dashboard.bind_address = bind;
    }
    if let Some(port) = cli.port {
        settings.dashboard.port = port;
    }

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("[dashboard] Interrupt received");
    };

    if let Err(e) = chatrelay_lib::run(settings, shutdown).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
