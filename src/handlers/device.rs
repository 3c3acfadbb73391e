use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::Value;
use tracing::info;
use crate::handlers::{json_body, AppState};
use crate::models::ack::Ack;
use crate::models::device_payload::DevicePayload;
use crate::models::error::ApiError;

pub async fn submit_payload(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let payload = DevicePayload::from_body(json_body(body)?, Utc::now().timestamp_millis())?;
    state.devices.append(&payload).await?;
    info!("device payload recorded at {}", payload.timestamp);
    Ok(Json(Ack::ok()))
}

pub async fn list_payloads(State(state): State<AppState>) -> Result<Json<Vec<DevicePayload>>, ApiError> {
    Ok(Json(state.devices.read_all().await?))
}
