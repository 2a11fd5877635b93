// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manager API seam for the controller.
//!
//! The controller talks to "the manager" for the dyad registry, metrics,
//! feedback, and reset tasks. In-process that is the board handle; with
//! `MANAGER_URL` set the controller runs apart from the board and goes
//! through the HTTP surface instead.

use crate::board::{BoardError, BoardHandle};
use async_trait::async_trait;
use sx_core::{Dyad, DyadTask, Feedback, Metric, Signal};
use thiserror::Error;

/// Errors from manager calls
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("manager unavailable: {0}")]
    Unavailable(String),
    #[error("manager rejected: {0}")]
    Rejected(String),
}

impl From<BoardError> for ManagerError {
    fn from(e: BoardError) -> Self {
        match e {
            BoardError::Closed => ManagerError::Unavailable(e.to_string()),
            other => ManagerError::Rejected(other.to_string()),
        }
    }
}

/// What the controller needs from the manager.
#[async_trait]
pub trait ManagerApi: Send + Sync + 'static {
    async fn registered_dyads(&self) -> Result<Vec<Dyad>, ManagerError>;
    async fn dyad_tasks(&self) -> Result<Vec<DyadTask>, ManagerError>;
    async fn add_dyad_task(&self, task: DyadTask) -> Result<(), ManagerError>;
    async fn add_feedback(&self, feedback: Feedback) -> Result<(), ManagerError>;
    async fn add_metric(&self, metric: Metric) -> Result<(), ManagerError>;
}

#[async_trait]
impl ManagerApi for BoardHandle {
    async fn registered_dyads(&self) -> Result<Vec<Dyad>, ManagerError> {
        Ok(self.dyads().await?)
    }

    async fn dyad_tasks(&self) -> Result<Vec<DyadTask>, ManagerError> {
        Ok(BoardHandle::dyad_tasks(self).await?)
    }

    async fn add_dyad_task(&self, task: DyadTask) -> Result<(), ManagerError> {
        self.update(Signal::AddDyadTask(task)).await?;
        Ok(())
    }

    async fn add_feedback(&self, feedback: Feedback) -> Result<(), ManagerError> {
        self.update(Signal::AddFeedback(feedback)).await?;
        Ok(())
    }

    async fn add_metric(&self, metric: Metric) -> Result<(), ManagerError> {
        self.update(Signal::AddMetric(metric)).await?;
        Ok(())
    }
}

/// HTTP manager client for split deployments.
#[derive(Clone)]
pub struct HttpManager {
    client: reqwest::Client,
    base: String,
}

impl HttpManager {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base = base_url.into().trim_end_matches('/').to_string();
        Self { client: reqwest::Client::new(), base }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ManagerError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| ManagerError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ManagerError::Rejected(format!("{} on {}", response.status(), path)));
        }
        response.json().await.map_err(|e| ManagerError::Unavailable(e.to_string()))
    }

    async fn post_json<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ManagerError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ManagerError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ManagerError::Rejected(format!("{} on {}", response.status(), path)));
        }
        Ok(())
    }
}

#[async_trait]
impl ManagerApi for HttpManager {
    async fn registered_dyads(&self) -> Result<Vec<Dyad>, ManagerError> {
        self.get_json("/dyads").await
    }

    async fn dyad_tasks(&self) -> Result<Vec<DyadTask>, ManagerError> {
        self.get_json("/dyad-tasks").await
    }

    async fn add_dyad_task(&self, task: DyadTask) -> Result<(), ManagerError> {
        self.post_json("/dyad-tasks", &task).await
    }

    async fn add_feedback(&self, feedback: Feedback) -> Result<(), ManagerError> {
        self.post_json("/feedback", &feedback).await
    }

    async fn add_metric(&self, metric: Metric) -> Result<(), ManagerError> {
        self.post_json("/metrics", &metric).await
    }
}
