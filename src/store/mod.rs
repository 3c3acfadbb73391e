pub mod device_log;
pub mod json_lines;
pub mod record_store;
