use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::request::OptimizeRequest;
use super::result::{parse_result, ParsedResult};

pub const DEFAULT_SOLVER_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("solver request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("solver returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("solver response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("solver reported failure (ok=false)")]
    Rejected,
    #[error("an optimize request is already running")]
    AlreadyRunning,
}

/// `result` of a solver response. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OptimizeEnvelope {
    #[serde(default)]
    pub summary: Value,
    #[serde(default)]
    pub raw: Value,
    #[serde(default)]
    pub assign: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OptimizeResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub result: OptimizeEnvelope,
}

impl OptimizeResponse {
    /// Normalizes `result.raw`, falling back to the envelope itself so a top-level
    /// `result.assign` is still understood.
    pub fn parsed(&self) -> Option<ParsedResult> {
        parse_result(&self.result.raw).or_else(|| {
            let assign = self.result.assign.as_ref()?;
            parse_result(&serde_json::json!({
                "assign": assign,
                "profiles": self.result.raw.get("profiles"),
                "combined_score": self.result.raw.get("combined_score"),
            }))
        })
    }
}

/// HTTP client for the solver's `POST /optimize`.
#[derive(Debug, Clone)]
pub struct SolverClient {
    client: Client,
    endpoint: String,
}

impl SolverClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SolverError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/optimize", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One request, no retry. A non-2xx status surfaces the status code and the body text.
    pub async fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResponse, SolverError> {
        info!(
            endpoint = %self.endpoint,
            orbs = request.orbs.len(),
            profiles = request.profiles.len(),
            "dispatching optimize request"
        );
        let resp = self.client.post(&self.endpoint).json(request).send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "solver rejected optimize request");
            return Err(SolverError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response: OptimizeResponse = serde_json::from_str(&body)?;
        if !response.ok {
            return Err(SolverError::Rejected);
        }
        info!(status = status.as_u16(), "optimize request completed");
        Ok(response)
    }
}
