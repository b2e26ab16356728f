use std::fs::File;

use t3watch::config::{self, Config};
use t3watch::{doctor, tui};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Log to a file so output doesn't corrupt the TUI
    let log_file = File::create(std::env::temp_dir().join("t3watch.log")).ok();

    if let Some(file) = log_file {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .with_ansi(false)
            .with_writer(file)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_target(false)
            .init();
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            if let config::ConfigError::NotFound(path) = &e {
                eprintln!("\nCreate a config file at: {}", path.display());
                eprintln!("\nExample config.toml:");
                eprintln!("{}", config::EXAMPLE_CONFIG);
            }
            std::process::exit(1);
        }
    };

    if std::env::args().nth(1).as_deref() == Some("doctor") {
        let results = doctor::run_checks(&config).await;
        if !doctor::print_results(&results) {
            std::process::exit(1);
        }
        return;
    }

    if let Err(e) = tui::run(config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
