use color_eyre::Result;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config;

/// Log to stdout and to a file in the data directory.
///
/// The filter comes from `STOREFRONT_LOGLEVEL`, then `RUST_LOG`, then `info`.
pub fn init() -> Result<()> {
    let directory = config::get_data_dir();
    std::fs::create_dir_all(&directory)?;
    let log_path = directory.join(config::LOG_FILE.clone());
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let env_filter = std::env::var(config::LOG_ENV.clone())
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| format!("info,{}=debug", env!("CARGO_CRATE_NAME")));
    let env_filter = EnvFilter::try_new(env_filter)?;

    let file_subscriber = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false);
    let stdout_subscriber = fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_subscriber)
        .with(stdout_subscriber)
        .with(ErrorLayer::default())
        .try_init()?;
    Ok(())
}
