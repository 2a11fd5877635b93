// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat bridge client.
//!
//! The bridge is a single POST endpoint: given a chat id, HTML text, and
//! an optional prior message id, it edits in place or creates a message
//! and answers with the resulting id plus whether it edited.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from bridge calls
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge request failed: {0}")]
    Request(String),
    #[error("bridge returned bad payload: {0}")]
    BadPayload(String),
}

/// One upsert against the bridge.
#[derive(Debug, Clone, Serialize)]
pub struct BridgePost {
    pub chat_id: String,
    pub text: String,
    /// Prior message to edit in place; `None` creates a new message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    pub parse_mode: &'static str,
}

impl BridgePost {
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>, message_id: Option<i64>) -> Self {
        Self { chat_id: chat_id.into(), text: text.into(), message_id, parse_mode: "HTML" }
    }
}

/// What the bridge answered.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct BridgeReply {
    pub message_id: i64,
    #[serde(default)]
    pub edited: bool,
}

/// Adapter for posting chat messages.
#[async_trait]
pub trait ChatBridge: Send + Sync + 'static {
    async fn post(&self, post: &BridgePost) -> Result<BridgeReply, BridgeError>;
}

/// HTTP bridge client.
#[derive(Clone)]
pub struct HttpBridge {
    client: reqwest::Client,
    url: String,
}

impl HttpBridge {
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into() }
    }
}

#[async_trait]
impl ChatBridge for HttpBridge {
    async fn post(&self, post: &BridgePost) -> Result<BridgeReply, BridgeError> {
        let response = self
            .client
            .post(&self.url)
            .json(post)
            .send()
            .await
            .map_err(|e| BridgeError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::Request(format!("{}: {}", status, body)));
        }
        response.json::<BridgeReply>().await.map_err(|e| BridgeError::BadPayload(e.to_string()))
    }
}

/// Recording bridge for tests: assigns message ids, remembers every post.
#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct RecordingBridge {
        inner: Arc<Mutex<Inner>>,
    }

    #[derive(Default)]
    struct Inner {
        next_id: i64,
        posts: Vec<BridgePost>,
    }

    impl RecordingBridge {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn posts(&self) -> Vec<BridgePost> {
            self.inner.lock().posts.clone()
        }
    }

    #[async_trait]
    impl ChatBridge for RecordingBridge {
        async fn post(&self, post: &BridgePost) -> Result<BridgeReply, BridgeError> {
            let mut inner = self.inner.lock();
            inner.posts.push(post.clone());
            match post.message_id {
                Some(id) => Ok(BridgeReply { message_id: id, edited: true }),
                None => {
                    inner.next_id += 1;
                    Ok(BridgeReply { message_id: inner.next_id, edited: false })
                }
            }
        }
    }
}
