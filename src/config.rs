use std::env;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_LOG_FILTER: &str = "geo_clicks=debug,tower_http=debug";

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub points_file: PathBuf,
    pub device_file: PathBuf,
    pub static_dir: PathBuf,
    pub append_queue: usize,
}

impl ServiceConfig {
    pub fn init() -> ServiceConfig {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ServiceConfig {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        ServiceConfig {
            host: text("HOST", "0.0.0.0"),
            port: parsed(&lookup, "PORT", 5000),
            points_file: text("POINTS_FILE", "clicks.txt").into(),
            device_file: text("DEVICE_FILE", "esp32.jsonl").into(),
            static_dir: text("STATIC_DIR", "static").into(),
            append_queue: parsed(&lookup, "APPEND_QUEUE", 1024),
        }
    }

    pub fn addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

fn parsed<T: FromStr + Copy + std::fmt::Display>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{}={} is not valid, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
