use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
pub struct Ack {
    pub status: String,
}

impl Ack {
    pub fn ok() -> Self {
        Self { status: "OK".to_string() }
    }
}
