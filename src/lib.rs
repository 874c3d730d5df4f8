// Trip Planner - offline-first family trip planner data layer
//
// Local store for places, itinerary, wishlist, members and settings,
// the versioned seed protocol, the offline request cache, geo utilities
// and the trip calendar.

pub mod cache;
pub mod calendar;
pub mod config;
pub mod database;
pub mod error;
pub mod geo;
pub mod planner;
pub mod seed;
pub mod state;

pub use error::{Result, TripError};

use anyhow::Context;
use chrono::Local;

use config::AppConfig;
use state::AppState;

/// Start the data layer: open and seed the store, then refresh the offline cache
pub async fn run() -> anyhow::Result<()> {
    // Initialize env_logger to output to stderr (reads RUST_LOG env var)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = AppConfig::load()?;
    log::info!("Trip planner starting, data in {:?}", config.data_dir);

    let state = AppState::new(config);
    state
        .initialize()
        .await
        .context("Failed to open the trip database")?;

    for diagnostic in state.diagnostics().await {
        log::warn!("Startup problem: {}", diagnostic.message);
    }

    let today = Local::now().date_naive();
    let status = state.calendar().trip_status(today);
    log::info!("{} {}", status.emoji(), state.calendar().status_text(today));

    let planner = state.planner().await?;
    let stats = planner.trip_stats()?;
    log::info!(
        "{} planned, {} done, {} on the wishlist, {} places",
        stats.total_planned,
        stats.total_done,
        stats.wishlist_count,
        stats.total_places
    );

    match state.open_offline_cache() {
        Ok(cache) => match cache.install().await {
            Ok(_) => {
                cache.activate()?;
            }
            Err(e) => log::warn!("Offline cache not refreshed: {}", e),
        },
        Err(e) => log::warn!("Offline cache unavailable: {}", e),
    }

    Ok(())
}
