pub mod ack;
pub mod device_payload;
pub mod error;
pub mod geo_sample;
