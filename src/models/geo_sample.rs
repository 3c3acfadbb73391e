use serde::Serialize;
use serde_json::{Map, Value};
use crate::models::error::ValidationError;

pub const LAT: &str = "lat";
pub const LON: &str = "lon";
pub const TIMESTAMP: &str = "timestamp";

/// One recorded observation. `timestamp` is milliseconds since the Unix epoch.
///
/// Every key of the submitted object other than the three required ones is kept
/// in `metadata` and written back flattened next to them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoSample {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: i64,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl GeoSample {
    pub fn new(lat: f64, lon: f64, timestamp: i64) -> Self {
        Self { lat, lon, timestamp, metadata: Map::new() }
    }

    /// (0, 0) is what clients send when they have no fix.
    pub fn is_null_island(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }

    #[cfg(test)]
    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

impl TryFrom<Value> for GeoSample {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => GeoSample::try_from(fields),
            _ => Err(ValidationError::NotAnObject),
        }
    }
}

impl TryFrom<Map<String, Value>> for GeoSample {
    type Error = ValidationError;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let lat = coordinate(&mut fields, LAT, 90.0)?;
        let lon = coordinate(&mut fields, LON, 180.0)?;
        let timestamp = timestamp(&mut fields)?;
        Ok(Self { metadata: fields, ..Self::new(lat, lon, timestamp) })
    }
}

// Presence is checked explicitly, zero is a valid value for every field.
fn take_present(fields: &mut Map<String, Value>, name: &'static str) -> Result<Value, ValidationError> {
    fields.remove(name)
        .filter(|value| !value.is_null())
        .ok_or(ValidationError::MissingField(name))
}

fn coordinate(fields: &mut Map<String, Value>, name: &'static str, limit: f64) -> Result<f64, ValidationError> {
    let value = take_present(fields, name)?;
    let number = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
        .filter(|n| n.is_finite())
        .ok_or(ValidationError::NotNumeric(name))?;

    if number.abs() > limit {
        return Err(ValidationError::OutOfRange { field: name, value: number });
    }
    Ok(number)
}

fn timestamp(fields: &mut Map<String, Value>) -> Result<i64, ValidationError> {
    let value = take_present(fields, TIMESTAMP)?;
    let millis = match &value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    millis.ok_or(ValidationError::NotNumeric(TIMESTAMP))
}
