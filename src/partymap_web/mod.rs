use std::fmt::Display;

use anyhow::Result;
use axum::routing::get;
use axum::Router;
use tokio::net::ToSocketAddrs;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::CompressionLevel;
use tracing::{info, Level};

use crate::partymap::highlight::HighlightChannel;
use crate::partymap::locate::Locator;
use crate::partymap::popup::PopupCoordinator;
use crate::partymap::store::VenueStore;

mod handlers;

pub struct Options<A> {
    pub store: VenueStore,
    pub locator: Locator,
    pub highlights: HighlightChannel,
    pub popups: PopupCoordinator,
    pub max_hits: usize,
    pub addr: A,
}

#[derive(Clone)]
pub struct AppState {
    pub store: VenueStore,
    pub locator: Locator,
    pub highlights: HighlightChannel,
    pub popups: PopupCoordinator,
    pub max_hits: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/places", get(handlers::catalog::handle_places_get))
        .route("/api/places/{id}", get(handlers::catalog::handle_place_get))
        .route("/api/events", get(handlers::catalog::handle_events_get))
        .route("/api/events/{id}", get(handlers::catalog::handle_event_get))
        .route("/api/performers", get(handlers::catalog::handle_performers_get))
        .route("/api/performers/{id}", get(handlers::catalog::handle_performer_get))
        .route("/api/search", get(handlers::map::handle_search_get))
        .route("/api/nearby", get(handlers::nearby::handle_nearby_get))
        .route(
            "/api/highlight",
            get(handlers::map::handle_highlight_get).delete(handlers::map::handle_highlight_delete),
        )
        .route(
            "/api/popup",
            get(handlers::map::handle_popup_get).delete(handlers::map::handle_popups_delete),
        )
        .route(
            "/api/popup/{id}",
            axum::routing::put(handlers::map::handle_popup_put).delete(handlers::map::handle_popup_delete),
        )
        .layer(CompressionLayer::new().gzip(true).quality(CompressionLevel::Fastest))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

pub async fn serve<A>(opts: Options<A>) -> Result<()>
where
    A: ToSocketAddrs + Display,
{
    let state = AppState {
        store: opts.store,
        locator: opts.locator,
        highlights: opts.highlights,
        popups: opts.popups,
        max_hits: opts.max_hits,
    };

    let tracking = state.locator.track();

    let app = router(state);

    info!("Starting webserver on http://{}/", opts.addr);
    let listener = tokio::net::TcpListener::bind(opts.addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    if let Some(tracking) = tracking {
        tracking.abort();
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {:?}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }

            Err(err) => {
                tracing::warn!("Failed to listen for SIGTERM: {:?}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down");
}
