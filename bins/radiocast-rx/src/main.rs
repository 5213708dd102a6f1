use clap::Parser;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use radiocast_config::{toml_config, RxConfig};
use radiocast_core::debug;
use radiocast_station::run_station;

/// Load configuration file
fn load_config_from_toml(cfg_path: &str) -> RxConfig {
    match toml_config::from_file(cfg_path) {
        Ok(cfg) => cfg,
        Err(err) => {
            println!("Failed to load configuration from {}: {}", cfg_path, err);
            std::process::exit(1);
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Radiocast FM receiver",
    long_about = "Runs the Radiocast multi-channel FM receiver using the provided TOML configuration file"
)]
struct Args {
    /// Config file (required)
    #[arg(help = "TOML config with receiver/device/channel parameters")]
    config: String,
}

fn main() {
    eprintln!("Radiocast {}", radiocast_core::STACK_VERSION);

    let args = Args::parse();
    let cfg = load_config_from_toml(&args.config);
    let _log_guard = debug::setup_logging_default(cfg.debug_log.clone());

    // Set up Ctrl+C handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("failed to set Ctrl+C handler");

    if let Err(err) = run_station(cfg, running) {
        tracing::error!("station failed: {}", err);
        std::process::exit(1);
    }
}
