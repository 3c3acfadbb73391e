use std::path::PathBuf;
use tracing::warn;
use crate::models::device_payload::DevicePayload;
use crate::models::error::StoreError;
use crate::store::json_lines::JsonLines;

pub struct DeviceLog {
    log: JsonLines,
}

impl DeviceLog {
    pub async fn open(path: impl Into<PathBuf>, queue: usize) -> Result<Self, StoreError> {
        Ok(Self { log: JsonLines::open(path, queue).await? })
    }

    pub async fn append(&self, payload: &DevicePayload) -> Result<(), StoreError> {
        self.log.append(payload).await
    }

    pub async fn read_all(&self) -> Result<Vec<DevicePayload>, StoreError> {
        let payloads = self.log.read_values().await?
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!("skipping device record in {}: {}", self.log.path().display(), e);
                    None
                }
            })
            .collect();
        Ok(payloads)
    }
}
