use anyhow::anyhow;
use arcstr::ArcStr;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use partymap_geo::{viewport_for, Viewport};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::partymap::search::{highlight_ids, SearchHit};
use crate::partymap_web::handlers::WebError;
use crate::partymap_web::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HighlightView {
    ids: Vec<ArcStr>,
    viewport: Viewport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PopupView {
    open: Option<ArcStr>,
    changed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchView {
    query: String,
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

pub async fn handle_highlight_get(State(state): State<AppState>) -> impl IntoResponse {
    let ids = state.highlights.get();
    let places = state.store.places().await;
    let viewport = viewport_for(&ids, &places);

    Json(HighlightView { ids, viewport })
}

pub async fn handle_highlight_delete(State(state): State<AppState>) -> impl IntoResponse {
    state.highlights.clear();
    Json(HighlightView { ids: Vec::new(), viewport: Viewport::None })
}

pub async fn handle_popup_get(State(state): State<AppState>) -> impl IntoResponse {
    Json(PopupView { open: state.popups.get_open(), changed: false })
}

#[instrument(skip_all, fields(? id))]
pub async fn handle_popup_put(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, WebError> {
    let place = state
        .store
        .place(&id)
        .await
        .ok_or_else(|| WebError::not_found(anyhow!("unknown place {:?}", id)))?;

    let changed = state.popups.open(&place.id);
    Ok(Json(PopupView { open: state.popups.get_open(), changed }))
}

#[instrument(skip_all, fields(? id))]
pub async fn handle_popup_delete(Path(id): Path<String>, State(state): State<AppState>) -> impl IntoResponse {
    let changed = state.popups.close(&ArcStr::from(id));
    Json(PopupView { open: state.popups.get_open(), changed })
}

pub async fn handle_popups_delete(State(state): State<AppState>) -> impl IntoResponse {
    state.popups.close_all();
    Json(PopupView { open: None, changed: true })
}

/// Searches the catalog and highlights the places of the hits.
#[instrument(skip_all, fields(q = %query.q))]
pub async fn handle_search_get(Query(query): Query<SearchQuery>, State(state): State<AppState>) -> impl IntoResponse {
    let hits = state.store.search(&query.q, state.max_hits).await;

    let ids = highlight_ids(&hits);
    debug!("Search found {} hits at {} places", hits.len(), ids.len());

    if ids.is_empty() {
        state.highlights.clear();
    } else {
        state.highlights.set(&ids);
    }

    Json(SearchView { query: query.q, hits })
}
