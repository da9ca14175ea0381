use anyhow::anyhow;
use arcstr::ArcStr;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use partymap_geo::{viewport_for, Coordinate, Viewport};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::partymap::notify::NO_RESULTS_NOTICE;
use crate::partymap_web::handlers::WebError;
use crate::partymap_web::AppState;

#[derive(Deserialize)]
pub struct NearbyQuery {
    lat: Option<f64>,
    lng: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NearbyView {
    ids: Vec<ArcStr>,
    viewport: Viewport,

    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<&'static str>,
}

/// Resolves the venues near the user and highlights them.
///
/// A position sent by the client is resolved directly, without a race, and remembered as the
/// latest user position afterwards.
#[instrument(skip_all, fields(? query.lat, ? query.lng))]
pub async fn handle_nearby_get(
    Query(query): Query<NearbyQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, WebError> {
    let position = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng).map_err(WebError::bad_request)?),
        (None, None) => None,
        _ => return Err(WebError::bad_request(anyhow!("lat and lng must be given together"))),
    };

    let places = state.store.places().await;
    let ids = match position {
        Some(position) => state.locator.resolve_at(position, &places),
        None => state.locator.resolve(&places).await,
    };
    let viewport = viewport_for(&ids, &places);

    let notice = ids.is_empty().then_some(NO_RESULTS_NOTICE);
    Ok(Json(NearbyView { ids, viewport, notice }))
}
