//! Wire messages exchanged over the events socket.
//!
//! Server frames are MessagePack maps, client frames are JSON objects.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Replace the target subtree with the HTML payload.
    Morph,
    /// Hand an opaque payload to the client renderer of the target.
    Render,
}

/// A server-to-client frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    pub action: Action,
    pub target: String,
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

/// Options the client passes to its morph library.
pub fn morph_meta() -> serde_json::Value {
    json!({
        "ignoreActiveValue": false,
        "morphStyle": "outerHTML",
    })
}

impl ServerMessage {
    pub fn morph(target: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            action: Action::Morph,
            target: target.into(),
            payload: html.into().into_bytes(),
            meta: Some(morph_meta()),
        }
    }

    pub fn render(
        target: impl Into<String>,
        payload: Vec<u8>,
        meta: Option<serde_json::Value>,
    ) -> Self {
        Self {
            action: Action::Render,
            target: target.into(),
            payload,
            meta,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    /// The payload as text, for morph frames.
    pub fn html(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// A client-to-server event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMessage {
    pub handler_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ClientMessage {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(raw)?)
    }
}
