use anyhow::anyhow;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::partymap::{Event, Performer, Place};
use crate::partymap_web::handlers::WebError;
use crate::partymap_web::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaceView {
    #[serde(flatten)]
    place: Place,
    events: Vec<Event>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventView {
    #[serde(flatten)]
    event: Event,
    place: Option<Place>,
    performers: Vec<Performer>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PerformerView {
    #[serde(flatten)]
    performer: Performer,
    events: Vec<Event>,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    place: Option<String>,
}

pub async fn handle_places_get(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.places().await)
}

#[instrument(skip_all, fields(? id))]
pub async fn handle_place_get(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, WebError> {
    let place = state
        .store
        .place(&id)
        .await
        .ok_or_else(|| WebError::not_found(anyhow!("unknown place {:?}", id)))?;

    let events = state.store.events_for_place(&id).await;
    Ok(Json(PlaceView { place, events }))
}

pub async fn handle_events_get(
    Query(query): Query<EventsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let events = match query.place {
        Some(place_id) => state.store.events_for_place(&place_id).await,
        None => state.store.events().await,
    };

    Json(events)
}

#[instrument(skip_all, fields(? id))]
pub async fn handle_event_get(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, WebError> {
    let event = state
        .store
        .event(&id)
        .await
        .ok_or_else(|| WebError::not_found(anyhow!("unknown event {:?}", id)))?;

    let place = state.store.place(&event.place_id).await;
    let performers = state.store.performers_by_id(&event.performer_ids).await;

    Ok(Json(EventView { event, place, performers }))
}

pub async fn handle_performers_get(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.performers().await)
}

#[instrument(skip_all, fields(? id))]
pub async fn handle_performer_get(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, WebError> {
    let performer = state
        .store
        .performer(&id)
        .await
        .ok_or_else(|| WebError::not_found(anyhow!("unknown performer {:?}", id)))?;

    let events = state.store.events_for_performer(&id).await;
    Ok(Json(PerformerView { performer, events }))
}
