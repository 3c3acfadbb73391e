use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;
use tracing::debug;
use crate::handlers::{json_body, AppState};
use crate::models::ack::Ack;
use crate::models::error::ApiError;
use crate::models::geo_sample::GeoSample;

pub async fn submit(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let sample = GeoSample::try_from(json_body(body)?)?;
    state.samples.append(&sample).await?;
    debug!("recorded sample lat={} lon={} ts={}", sample.lat, sample.lon, sample.timestamp);
    Ok(Json(Ack::ok()))
}

pub async fn list_samples(State(state): State<AppState>) -> Result<Json<Vec<GeoSample>>, ApiError> {
    let samples = state.samples.read_all().await?;
    debug!("returning {} samples", samples.len());
    Ok(Json(samples))
}
