// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `reqwest`-based [`StoreAdapter`] against a Firestore-shaped REST facade.
//!
//! Collections are addressed the same way `firestore_client.py` addresses
//! them: `orgs/{org}/playbook_runs/{run}/steps/{step}`, `.../events`,
//! `.../inputs`, `.../files`. Server-assigned fields (`updatedAt`,
//! `completedAt`, event/input document IDs) are never populated client-side
//! — every write that touches one of those fields sends a server-timestamp
//! sentinel instead of a local `DateTime::now()`, and the response body is
//! the source of truth for whatever the store actually persisted.

use crate::{RunStatusUpdate, StepStatusUpdate, StoreAdapter, StoreError};
use async_trait::async_trait;
use pb_core::{
    Checkpoint, EventId, EventRecord, EventType, FileRecord, InputId, InputRecord, OrgId,
    PlaybookStep, Run, RunId, RunStatus, Step, StepId, StepStatus,
};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Sentinel written wherever the production document store is expected to
/// substitute its own server timestamp, mirroring `firestore.SERVER_TIMESTAMP`.
const SERVER_TIMESTAMP: &str = "__server_timestamp__";

pub struct HttpStoreAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStoreAdapter {
    pub fn new(base_url: impl Into<String>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self { client, base_url: base_url.into() })
    }

    fn run_url(&self, org: &OrgId, run: &RunId) -> String {
        format!("{}/orgs/{org}/playbook_runs/{run}", self.base_url)
    }

    fn step_url(&self, org: &OrgId, run: &RunId, step: &StepId) -> String {
        format!("{}/steps/{step}", self.run_url(org, run))
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        request: reqwest::RequestBuilder,
        body: &B,
    ) -> Result<reqwest::Response, StoreError> {
        let response =
            request.json(body).send().await.map_err(|e| StoreError::Transport(e.to_string()))?;
        self.check_status(response).await
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::Transport("document not found".to_string()));
        }
        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(StoreError::Malformed("write rejected by the store's concurrency check".into()));
        }
        response.error_for_status().map_err(|e| StoreError::Transport(e.to_string()))
    }
}

#[async_trait]
impl StoreAdapter for HttpStoreAdapter {
    async fn read_run(&self, org: &OrgId, run: &RunId) -> Result<Run, StoreError> {
        let response = self
            .client
            .get(self.run_url(org, run))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let response = self.check_status(response).await?;
        response.json().await.map_err(|e| StoreError::Malformed(e.to_string()))
    }

    async fn update_run_status(
        &self,
        org: &OrgId,
        run: &RunId,
        status: RunStatus,
        update: RunStatusUpdate,
    ) -> Result<(), StoreError> {
        #[derive(Serialize)]
        struct Body {
            status: RunStatus,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<pb_core::ErrorInfo>,
            #[serde(skip_serializing_if = "Option::is_none")]
            summary: Option<String>,
            #[serde(rename = "currentStepId", skip_serializing_if = "Option::is_none")]
            current_step_id: Option<StepId>,
            #[serde(rename = "updatedAt")]
            updated_at: &'static str,
            #[serde(rename = "completedAt", skip_serializing_if = "Option::is_none")]
            completed_at: Option<&'static str>,
        }
        let body = Body {
            status,
            error: update.error,
            summary: update.summary,
            current_step_id: update.current_step_id,
            updated_at: SERVER_TIMESTAMP,
            completed_at: status.is_terminal().then_some(SERVER_TIMESTAMP),
        };
        self.send(self.client.patch(self.run_url(org, run)), &body).await.map(drop)
    }

    async fn heartbeat_run(&self, org: &OrgId, run: &RunId) -> Result<(), StoreError> {
        #[derive(Serialize)]
        struct Body {
            #[serde(rename = "lastHeartbeat")]
            last_heartbeat: &'static str,
        }
        self.send(
            self.client.patch(format!("{}/heartbeat", self.run_url(org, run))),
            &Body { last_heartbeat: SERVER_TIMESTAMP },
        )
        .await
        .map(drop)
    }

    async fn initialize_steps(
        &self,
        org: &OrgId,
        run: &RunId,
        steps: &[PlaybookStep],
    ) -> Result<(), StoreError> {
        #[derive(Serialize)]
        struct Body<'a> {
            steps: &'a [PlaybookStep],
        }
        self.send(
            self.client.put(format!("{}/steps", self.run_url(org, run))),
            &Body { steps },
        )
        .await
        .map(drop)
    }

    async fn update_step_status(
        &self,
        org: &OrgId,
        run: &RunId,
        step: &StepId,
        status: StepStatus,
        update: StepStatusUpdate,
    ) -> Result<(), StoreError> {
        #[derive(Serialize)]
        struct Body {
            status: StepStatus,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<pb_core::ErrorInfo>,
            #[serde(rename = "resultSummary", skip_serializing_if = "Option::is_none")]
            result_summary: Option<String>,
            #[serde(rename = "jobName", skip_serializing_if = "Option::is_none")]
            job_name: Option<String>,
        }
        let response = self
            .client
            .patch(self.step_url(org, run, step))
            .json(&Body {
                status,
                error: update.error,
                result_summary: update.result_summary,
                job_name: update.job_name,
            })
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        if response.status() == reqwest::StatusCode::CONFLICT {
            let current = self.read_step_status(org, run, step).await.unwrap_or(status);
            return Err(StoreError::TerminalStatusImmutable { step: step.clone(), current });
        }
        self.check_status(response).await.map(drop)
    }

    async fn read_step_status(
        &self,
        org: &OrgId,
        run: &RunId,
        step: &StepId,
    ) -> Result<StepStatus, StoreError> {
        self.read_step(org, run, step).await.map(|s| s.status)
    }

    async fn read_step(&self, org: &OrgId, run: &RunId, step: &StepId) -> Result<Step, StoreError> {
        let response = self
            .client
            .get(self.step_url(org, run, step))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let response = self.check_status(response).await?;
        response.json().await.map_err(|e| StoreError::Malformed(e.to_string()))
    }

    async fn append_event(
        &self,
        org: &OrgId,
        run: &RunId,
        kind: EventType,
        step: Option<&StepId>,
        payload: serde_json::Value,
    ) -> Result<EventId, StoreError> {
        #[derive(Serialize)]
        struct Body<'a> {
            #[serde(rename = "type")]
            kind: EventType,
            #[serde(rename = "stepId", skip_serializing_if = "Option::is_none")]
            step_id: Option<&'a StepId>,
            timestamp: &'static str,
            payload: serde_json::Value,
        }
        #[derive(serde::Deserialize)]
        struct Created {
            id: EventId,
        }
        let response = self
            .client
            .post(format!("{}/events", self.run_url(org, run)))
            .json(&Body { kind, step_id: step, timestamp: SERVER_TIMESTAMP, payload })
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let response = self.check_status(response).await?;
        let created: Created = response.json().await.map_err(|e| StoreError::Malformed(e.to_string()))?;
        Ok(created.id)
    }

    async fn list_events(&self, org: &OrgId, run: &RunId) -> Result<Vec<EventRecord>, StoreError> {
        let response = self
            .client
            .get(format!("{}/events", self.run_url(org, run)))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let response = self.check_status(response).await?;
        response.json().await.map_err(|e| StoreError::Malformed(e.to_string()))
    }

    async fn read_input_by_question_id(
        &self,
        org: &OrgId,
        run: &RunId,
        correlation_id: &str,
    ) -> Result<Option<InputRecord>, StoreError> {
        let response = self
            .client
            .get(format!("{}/inputs", self.run_url(org, run)))
            .query(&[("correlationId", correlation_id)])
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let response = self.check_status(response).await?;
        let matches: Vec<InputRecord> =
            response.json().await.map_err(|e| StoreError::Malformed(e.to_string()))?;
        Ok(matches.into_iter().next())
    }

    async fn poll_new_inputs(
        &self,
        org: &OrgId,
        run: &RunId,
        since: Option<InputId>,
    ) -> Result<Vec<(InputId, InputRecord)>, StoreError> {
        let mut request = self.client.get(format!("{}/inputs", self.run_url(org, run)));
        if let Some(cursor) = &since {
            request = request.query(&[("since", cursor.as_str())]);
        }
        let response = request.send().await.map_err(|e| StoreError::Transport(e.to_string()))?;
        let response = self.check_status(response).await?;
        let page: Vec<InputRecord> =
            response.json().await.map_err(|e| StoreError::Malformed(e.to_string()))?;
        page.into_iter()
            .map(|input| {
                input
                    .id
                    .clone()
                    .map(|id| (id, input))
                    .ok_or_else(|| StoreError::Malformed("input document missing an id".into()))
            })
            .collect()
    }

    async fn read_context(
        &self,
        org: &OrgId,
        run: &RunId,
    ) -> Result<HashMap<String, serde_json::Value>, StoreError> {
        self.read_run(org, run).await.map(|r| r.context)
    }

    async fn read_all_step_results(
        &self,
        org: &OrgId,
        run: &RunId,
    ) -> Result<HashMap<StepId, String>, StoreError> {
        let response = self
            .client
            .get(format!("{}/steps", self.run_url(org, run)))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let response = self.check_status(response).await?;
        let steps: Vec<Step> = response.json().await.map_err(|e| StoreError::Malformed(e.to_string()))?;
        Ok(steps.into_iter().filter_map(|s| s.result_summary.clone().map(|r| (s.id, r))).collect())
    }

    async fn read_all_files(&self, org: &OrgId, run: &RunId) -> Result<Vec<FileRecord>, StoreError> {
        let response = self
            .client
            .get(format!("{}/files", self.run_url(org, run)))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let response = self.check_status(response).await?;
        response.json().await.map_err(|e| StoreError::Malformed(e.to_string()))
    }

    async fn save_checkpoint(
        &self,
        org: &OrgId,
        run: &RunId,
        step: &StepId,
        checkpoint: Checkpoint,
    ) -> Result<(), StoreError> {
        #[derive(Serialize)]
        struct Body {
            checkpoint: Checkpoint,
        }
        self.send(
            self.client.patch(self.step_url(org, run, step)),
            &Body { checkpoint },
        )
        .await
        .map(drop)
    }

    async fn load_checkpoint(
        &self,
        org: &OrgId,
        run: &RunId,
        step: &StepId,
    ) -> Result<Option<Checkpoint>, StoreError> {
        self.read_step(org, run, step).await.map(|s| s.checkpoint)
    }

    async fn clear_checkpoint(
        &self,
        org: &OrgId,
        run: &RunId,
        step: &StepId,
    ) -> Result<(), StoreError> {
        #[derive(Serialize)]
        struct Body {
            checkpoint: Option<Checkpoint>,
        }
        self.send(
            self.client.patch(self.step_url(org, run, step)),
            &Body { checkpoint: None },
        )
        .await
        .map(drop)
    }

    async fn read_oauth_token(&self, _org: &OrgId, _provider: &str) -> Result<String, StoreError> {
        Err(StoreError::NotImplemented("oauth token secrets require a production secret backend"))
    }

    async fn read_ai_config(&self, _org: &OrgId) -> Result<serde_json::Value, StoreError> {
        Err(StoreError::NotImplemented("AI provider config secrets require a production secret backend"))
    }
}
