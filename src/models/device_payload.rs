use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::models::error::ValidationError;

/// Opaque device upload, stamped on arrival with milliseconds since the Unix epoch.
///
/// Older `pos.txt` logs carry fractional seconds and do not read as this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicePayload {
    pub timestamp: i64,
    pub data: Value,
}

impl DevicePayload {
    pub fn from_body(body: Value, received_at: i64) -> Result<Self, ValidationError> {
        let mut fields = match body {
            Value::Object(fields) => fields,
            _ => return Err(ValidationError::NotAnObject),
        };
        let data = fields.remove("data")
            .filter(|data| !data.is_null())
            .ok_or(ValidationError::MissingField("data"))?;
        Ok(Self { timestamp: received_at, data })
    }
}
