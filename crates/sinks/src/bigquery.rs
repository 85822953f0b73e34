//! BigQuery streaming-insert sink.
//!
//! Rows go out one `insertAll` request at a time; the destination table is
//! created from the configured schema descriptor on startup when it does
//! not exist. Credential acquisition is out of scope: the sink reads a
//! ready bearer token from the environment variable named in the config.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::{debug, info};

use tweetforge_config::BigQuerySinkCfg;
use tweetforge_core::{
    Row, SinkError, SinkResult, TableSchema, TableSink,
};

pub struct BigQuerySink {
    cfg: BigQuerySinkCfg,
    http: reqwest::Client,
    schema: TableSchema,
    auth_token: Option<String>,
}

impl BigQuerySink {
    pub fn new(cfg: &BigQuerySinkCfg, schema: TableSchema) -> Result<Self> {
        let auth_token = match &cfg.auth_token_env {
            Some(var) => Some(env::var(var).with_context(|| {
                format!("reading sink auth token from ${var}")
            })?),
            None => None,
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.send_timeout_secs))
            .build()
            .context("build http client")?;

        Ok(Self {
            cfg: cfg.clone(),
            http,
            schema,
            auth_token,
        })
    }

    fn tables_url(&self) -> String {
        format!(
            "{}/projects/{}/datasets/{}/tables",
            self.cfg.endpoint.trim_end_matches('/'),
            self.cfg.project,
            self.cfg.dataset
        )
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn classify_status(&self, status: StatusCode, body: &str) -> SinkError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                SinkError::Auth {
                    details: format!("{} returned {status}", self.cfg.id)
                        .into(),
                }
            }
            _ => SinkError::Rejected {
                details: format!(
                    "{} returned {status}: {body}",
                    self.cfg.id
                )
                .into(),
            },
        }
    }

    async fn create_table(&self) -> SinkResult<()> {
        let body = json!({
            "tableReference": {
                "projectId": self.cfg.project,
                "datasetId": self.cfg.dataset,
                "tableId": self.cfg.table,
            },
            "schema": self.schema,
        });

        let response = self
            .request(self.http.post(self.tables_url()).json(&body))
            .send()
            .await
            .map_err(|e| SinkError::Connect {
                details: format!("create table: {e}").into(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.classify_status(status, &body));
        }

        info!(sink = %self.cfg.id, table = %self.cfg.table, "destination table created");
        Ok(())
    }
}

#[async_trait]
impl TableSink for BigQuerySink {
    fn id(&self) -> &str {
        &self.cfg.id
    }

    async fn ensure_table(&self) -> SinkResult<()> {
        let url = format!("{}/{}", self.tables_url(), self.cfg.table);

        let response = self
            .request(self.http.get(&url))
            .send()
            .await
            .map_err(|e| SinkError::Connect {
                details: format!("lookup table: {e}").into(),
            })?;

        match response.status() {
            status if status.is_success() => {
                debug!(sink = %self.cfg.id, table = %self.cfg.table, "destination table exists");
                Ok(())
            }
            StatusCode::NOT_FOUND => self.create_table().await,
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(self.classify_status(status, &body))
            }
        }
    }

    async fn append(&self, row: &Row) -> SinkResult<()> {
        let url = format!(
            "{}/{}/insertAll",
            self.tables_url(),
            self.cfg.table
        );

        let body = json!({
            "kind": "bigquery#tableDataInsertAllRequest",
            "rows": [{"json": row}],
        });

        let response = self
            .request(self.http.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| SinkError::Connect {
                details: format!("insertAll: {e}").into(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.classify_status(status, &body));
        }

        // insertAll reports per-row problems in a 200 response.
        let payload: Value = response.json().await.map_err(|e| {
            SinkError::Rejected {
                details: format!("unreadable insertAll response: {e}").into(),
            }
        })?;

        if let Some(errors) = payload.get("insertErrors") {
            if errors.as_array().is_some_and(|a| !a.is_empty()) {
                return Err(SinkError::Rejected {
                    details: format!("insertAll errors: {errors}").into(),
                });
            }
        }

        debug!(sink = %self.cfg.id, table = %self.cfg.table, "row appended");
        Ok(())
    }
}
