use anyhow::{Context, Result};
use std::sync::Arc;
use wxmerge_api::AppState;
use wxmerge_core::Config;
use wxmerge_weather::WeatherAggregator;

fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    wxmerge_core::init(config.server.debug)?;
    config.ensure_valid()?;

    tracing::info!(
        "Providers: temperature={} windspeed={}, naive dates read as {}",
        config.providers.temperature_api_url,
        config.providers.windspeed_api_url,
        config.dates.naive_zone
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers)
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let config = Arc::new(config);
    let aggregator =
        WeatherAggregator::new(Arc::clone(&config)).context("Failed to create upstream client")?;

    if let Err(e) = runtime.block_on(wxmerge_api::serve(&config, AppState::new(aggregator))) {
        tracing::error!("{} ({})", e.user_message(), e);
        return Err(e.into());
    }

    Ok(())
}
