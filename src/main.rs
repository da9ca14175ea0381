use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::partymap::highlight::HighlightChannel;
use crate::partymap::locate::Locator;
use crate::partymap::notify::LogNotifier;
use crate::partymap::popup::PopupCoordinator;
use crate::partymap::position::{FixedPosition, NoPosition, PositionCache, PositionProvider};
use crate::partymap::store::VenueStore;

pub mod partymap;
pub mod partymap_web;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "./partymap.config.yaml".to_owned());
    let config = partymap::config::load(&config_path)?;

    let catalog = partymap::catalog::load(&config.catalog)?;
    let store = VenueStore::new(catalog);

    let provider: Arc<dyn PositionProvider> = match config.locate.manual_position {
        Some(position) => {
            info!("Using manual position {:?}", position);
            Arc::new(FixedPosition(position))
        }

        None => Arc::new(NoPosition),
    };

    let highlights = HighlightChannel::new();
    let popups = PopupCoordinator::new();

    let locator = Locator::new(
        provider,
        PositionCache::new(config.locate.freshness()),
        highlights.clone(),
        popups.clone(),
        Arc::new(LogNotifier),
        config.locate.options(),
    );

    partymap_web::serve(partymap_web::Options {
        store,
        locator,
        highlights,
        popups,
        max_hits: config.search.max_hits,
        addr: config.http_address,
    })
    .await?;

    Ok(())
}
