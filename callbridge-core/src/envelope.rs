use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One method invocation as carried over the capability's call channel.
///
/// `args_blob` is absent when the caller passed zero arguments; when
/// present it holds a codec blob whose decoded value must be an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    pub method_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args_blob: Option<Bytes>,
}

impl CallRequest {
    pub fn new(method_name: impl Into<String>, args_blob: Option<Bytes>) -> Self {
        CallRequest {
            method_name: method_name.into(),
            args_blob,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResponse {
    pub result_blob: Bytes,
}

impl CallResponse {
    pub fn new(result_blob: Bytes) -> Self {
        CallResponse { result_blob }
    }
}

/// Outcome of one bootstrap event. The bootstrap channel never carries a
/// call payload; results travel over the capability's own call channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    Ok,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResult {
    pub outcome: EventOutcome,
}

impl EventResult {
    pub fn ok() -> Self {
        EventResult {
            outcome: EventOutcome::Ok,
        }
    }

    pub fn canceled() -> Self {
        EventResult {
            outcome: EventOutcome::Canceled,
        }
    }
}
