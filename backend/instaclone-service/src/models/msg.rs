use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Plain acknowledgement body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Msg {
    pub msg: String,
}

impl Msg {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}
