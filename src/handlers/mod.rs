use std::sync::Arc;
use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::Value;
use crate::models::error::ValidationError;
use crate::store::device_log::DeviceLog;
use crate::store::record_store::RecordStore;

pub mod device;
pub mod points;

#[derive(Clone)]
pub struct AppState {
    pub samples: Arc<dyn RecordStore>,
    pub devices: Arc<DeviceLog>,
}

impl AppState {
    pub fn new(samples: Arc<dyn RecordStore>, devices: Arc<DeviceLog>) -> Self {
        Self { samples, devices }
    }
}

// Body problems are answered like any other validation failure.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ValidationError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ValidationError::Body(rejection.body_text()))
}
