mod api;
mod config;
mod logging;
mod services;
mod web;

use std::sync::Arc;

use color_eyre::Result;
use domain::{core::Storefront, session::SessionConfig};

use crate::{config::Config, services::StorefrontHandle};

/// Table holding the storefront's key/value slots
const SLOTS_TABLE: &str = "slots";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Initialize logging
    logging::init()?;
    tracing::info!("Starting storefront");

    let config = Config::from_env()?;
    tracing::debug!("Configuration: {config:#?}");
    std::fs::create_dir_all(&config.data_dir)?;

    let store = config.database.open(SLOTS_TABLE).await?;
    let storefront = Storefront::new(
        Arc::new(store),
        SessionConfig::default().with_latency(config.latency),
    );
    tracing::debug!("Storefront initialized: {storefront:#?}");

    let state = StorefrontHandle::new(storefront);
    let app = api::create_api(state.clone()).merge(web::create_app(state, &config.static_dir));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!("Server running on http://{}", config.addr);

    axum::serve(listener, app).await?;

    Ok(())
}
