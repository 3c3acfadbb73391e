use std::path::PathBuf;
use async_trait::async_trait;
use tracing::debug;
use crate::models::error::StoreError;
use crate::models::geo_sample::GeoSample;
use crate::store::json_lines::JsonLines;

/// Durable, append-only home of every ingested [`GeoSample`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns once the sample is durable; on error it must be treated as not recorded.
    async fn append(&self, sample: &GeoSample) -> Result<(), StoreError>;

    /// All stored samples with a usable coordinate pair, oldest first. A pair that
    /// is missing, invalid or the (0, 0) placeholder is not usable.
    async fn read_all(&self) -> Result<Vec<GeoSample>, StoreError>;
}

pub struct FileRecordStore {
    log: JsonLines,
}

impl FileRecordStore {
    pub async fn open(path: impl Into<PathBuf>, queue: usize) -> Result<Self, StoreError> {
        Ok(Self { log: JsonLines::open(path, queue).await? })
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn append(&self, sample: &GeoSample) -> Result<(), StoreError> {
        self.log.append(sample).await
    }

    async fn read_all(&self) -> Result<Vec<GeoSample>, StoreError> {
        let samples = self.log.read_values().await?
            .into_iter()
            .filter_map(|value| match GeoSample::try_from(value) {
                Ok(sample) if sample.is_null_island() => {
                    debug!("excluding (0, 0) placeholder at {}", sample.timestamp);
                    None
                }
                Ok(sample) => Some(sample),
                Err(e) => {
                    debug!("excluding stored record from {}: {}", self.log.path().display(), e);
                    None
                }
            })
            .collect();
        Ok(samples)
    }
}
