//! REST collaborator for task status and document generation.
//!
//! The backend is a cache-fill/cache-flush sidecar: local checklist state
//! is authoritative, pushes are fire-and-forget, and a failed call is
//! logged rather than retried or rolled back.

use crate::domain::task::TaskStatus;
use crate::forms::schema::FormSchema;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Payload persisted when a task completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub status: TaskStatus,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    pub completed_at: DateTime<Utc>,
}

#[async_trait]
pub trait StatusBackend: Send + Sync {
    /// Statuses previously persisted for this employee, keyed by task id.
    async fn fetch_statuses(&self, employee_id: Uuid) -> Result<HashMap<String, TaskStatus>>;

    async fn push_completion(
        &self,
        employee_id: Uuid,
        task_id: &str,
        record: &CompletionRecord,
    ) -> Result<()>;

    /// Hand a payload to the document service; returns the rendered
    /// document as opaque bytes.
    async fn request_document(&self, payload: &serde_json::Value) -> Result<Vec<u8>>;
}

pub struct HttpStatusBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStatusBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl StatusBackend for HttpStatusBackend {
    async fn fetch_statuses(&self, employee_id: Uuid) -> Result<HashMap<String, TaskStatus>> {
        let url = format!("{}/employees/{}/task-status", self.base_url, employee_id);
        let statuses = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<HashMap<String, TaskStatus>>()
            .await
            .context("task status response was not valid JSON")?;
        Ok(statuses)
    }

    async fn push_completion(
        &self,
        employee_id: Uuid,
        task_id: &str,
        record: &CompletionRecord,
    ) -> Result<()> {
        let url = format!(
            "{}/employees/{}/tasks/{}/status",
            self.base_url, employee_id, task_id
        );
        self.client
            .post(&url)
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn request_document(&self, payload: &serde_json::Value) -> Result<Vec<u8>> {
        let url = format!("{}/documents/generate", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Err(anyhow!("document service returned an empty body"));
        }
        Ok(bytes.to_vec())
    }
}

/// Fire-and-forget push: the completion already happened locally, so a
/// backend failure is a warning, never a rollback.
pub async fn flush_completion(
    backend: &dyn StatusBackend,
    employee_id: Uuid,
    task_id: &str,
    record: &CompletionRecord,
) {
    match backend.push_completion(employee_id, task_id, record).await {
        Ok(()) => tracing::debug!("persisted completion of {} for {}", task_id, employee_id),
        Err(e) => tracing::warn!(
            "failed to persist completion of {} for {}: {:#}",
            task_id,
            employee_id,
            e
        ),
    }
}

/// Fetch a form schema from a URL instead of an inline document. Invalid
/// schemas are rejected the same way `FormSchema::from_json` rejects them.
pub async fn fetch_schema(client: &reqwest::Client, url: &str) -> Result<FormSchema> {
    let raw = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    FormSchema::from_json(&raw).with_context(|| format!("schema fetched from {url} is invalid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyBackend;

    #[async_trait]
    impl StatusBackend for FlakyBackend {
        async fn fetch_statuses(&self, _: Uuid) -> Result<HashMap<String, TaskStatus>> {
            Err(anyhow!("backend down"))
        }

        async fn push_completion(&self, _: Uuid, _: &str, _: &CompletionRecord) -> Result<()> {
            Err(anyhow!("backend down"))
        }

        async fn request_document(&self, _: &serde_json::Value) -> Result<Vec<u8>> {
            Err(anyhow!("backend down"))
        }
    }

    #[tokio::test]
    async fn test_flush_swallows_backend_failure() {
        let record = CompletionRecord {
            status: TaskStatus::Completed,
            signature: None,
            file_name: None,
            completed_at: Utc::now(),
        };
        // Must not panic or propagate; local state stays authoritative.
        flush_completion(&FlakyBackend, Uuid::new_v4(), "employment_contract", &record).await;
    }

    #[test]
    fn test_completion_record_serializes_snake_case() {
        let record = CompletionRecord {
            status: TaskStatus::Completed,
            signature: Some("Aisyah binti Rahman".into()),
            file_name: None,
            completed_at: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "completed");
        assert!(json["signature"].is_string());
    }
}
