//! SAPI v2 REST client.
//!
//! Implements the D-Wave Solver API (`https://na-west-1.cloud.dwavesys.com/sapi/v2`)
//! for listing solvers, submitting problems and retrieving answers.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use revanneal_hal::SolverInfo;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::codec::{QpAnswer, QpProblem};
use crate::error::{DWaveError, DWaveResult};

/// Default SAPI endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://na-west-1.cloud.dwavesys.com/sapi/v2";

/// Authentication header carrying the SAPI token.
const AUTH_HEADER: &str = "X-Auth-Token";

/// SAPI REST client.
pub struct SapiClient {
    /// HTTP client with timeouts configured.
    client: Client,
    /// API base URL (without trailing slash).
    endpoint: String,
    /// SAPI token.
    token: String,
}

impl std::fmt::Debug for SapiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SapiClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl SapiClient {
    /// Create a client for the default endpoint.
    pub fn new(token: impl Into<String>) -> DWaveResult<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT, token)
    }

    /// Create a client for a custom endpoint with the default timeouts.
    pub fn with_endpoint(endpoint: impl Into<String>, token: impl Into<String>) -> DWaveResult<Self> {
        Self::with_timeouts(
            endpoint,
            token,
            Duration::from_secs(60),
            Duration::from_secs(10),
        )
    }

    /// Create a client with explicit request and connect timeouts.
    pub fn with_timeouts(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> DWaveResult<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(DWaveError::MissingToken);
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(DWaveError::Http)?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// SAPI paths end with a slash.
    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.ends_with('/') {
            format!("{}/{}", self.endpoint, path)
        } else {
            format!("{}/{}/", self.endpoint, path)
        }
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> DWaveResult<T> {
        let url = self.url(path);
        debug!("GET {}", url);

        let resp = self
            .client
            .get(&url)
            .header(AUTH_HEADER, &self.token)
            .send()
            .await?;

        handle_response(resp).await
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> DWaveResult<T> {
        let url = self.url(path);
        debug!("POST {}", url);

        let resp = self
            .client
            .post(&url)
            .header(AUTH_HEADER, &self.token)
            .json(body)
            .send()
            .await?;

        handle_response(resp).await
    }

    async fn delete<T: for<'de> Deserialize<'de>>(&self, path: &str) -> DWaveResult<T> {
        let url = self.url(path);
        debug!("DELETE {}", url);

        let resp = self
            .client
            .delete(&url)
            .header(AUTH_HEADER, &self.token)
            .send()
            .await?;

        handle_response(resp).await
    }

    /// List the solvers visible to this token.
    #[instrument(skip(self))]
    pub async fn list_solvers(&self) -> DWaveResult<Vec<SolverInfo>> {
        self.get("solvers/remote/").await
    }

    /// Fetch one solver with its properties.
    #[instrument(skip(self))]
    pub async fn get_solver(&self, solver_id: &str) -> DWaveResult<SolverInfo> {
        self.get(&format!("solvers/remote/{solver_id}/"))
            .await
            .map_err(|e| match e {
                DWaveError::ProblemNotFound(_) => DWaveError::SolverNotFound(solver_id.to_string()),
                other => other,
            })
    }

    /// Submit a batch of problems. Statuses come back in submission order.
    #[instrument(skip(self, problems), fields(count = problems.len()))]
    pub async fn submit_problems(&self, problems: &[ProblemSubmission]) -> DWaveResult<Vec<ProblemStatus>> {
        self.post("problems/", &problems).await
    }

    /// Current status of a problem.
    #[instrument(skip(self))]
    pub async fn problem_status(&self, problem_id: &str) -> DWaveResult<ProblemStatus> {
        self.get(&format!("problems/{problem_id}/")).await
    }

    /// Answer of a completed problem.
    #[instrument(skip(self))]
    pub async fn problem_answer(&self, problem_id: &str) -> DWaveResult<AnswerResponse> {
        self.get(&format!("problems/{problem_id}/answer/")).await
    }

    /// Cancel a pending problem.
    #[instrument(skip(self))]
    pub async fn cancel_problem(&self, problem_id: &str) -> DWaveResult<ProblemStatus> {
        self.delete(&format!("problems/{problem_id}/")).await
    }
}

/// Deserialize a 2xx body or map the status code to an error.
async fn handle_response<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> DWaveResult<T> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to read SAPI error body ({}): {}", status, e);
            String::new()
        }
    };
    Err(map_status(status, error_message(status, body)))
}

/// Message of an error response: the SAPI error text, the raw body, or the
/// status reason when the body is empty.
fn error_message(status: StatusCode, body: String) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string();
    }
    serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::message)
        .unwrap_or(body)
}

fn map_status(status: StatusCode, message: String) -> DWaveError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DWaveError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        StatusCode::NOT_FOUND | StatusCode::GONE => DWaveError::ProblemNotFound(message),
        _ => DWaveError::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}

/// SAPI error body, e.g. `{"error_code": 404, "error_msg": "Problem not found"}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_msg: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl ErrorBody {
    fn message(self) -> Option<String> {
        self.error_msg.or(self.detail)
    }
}

// ---------------------------------------------------------------------------
// Request / response serde types
// ---------------------------------------------------------------------------

/// One entry of the `POST problems/` body.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemSubmission {
    /// Target solver.
    pub solver: String,
    /// Encoded problem.
    pub data: QpProblem,
    /// Problem type; always `"ising"` here.
    #[serde(rename = "type")]
    pub problem_type: &'static str,
    /// Solver parameters.
    pub params: serde_json::Value,
    /// Optional label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ProblemSubmission {
    /// Ising problem submission.
    pub fn ising(solver: impl Into<String>, data: QpProblem, params: serde_json::Value) -> Self {
        Self {
            solver: solver.into(),
            data,
            problem_type: "ising",
            params,
            label: None,
        }
    }

    /// Set the label.
    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }
}

/// Problem status as returned by `POST problems/` and `GET problems/{id}/`.
///
/// Rejected submissions carry `error_code` and `error_msg` instead of an id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProblemStatus {
    /// Problem identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// `PENDING | IN_PROGRESS | COMPLETED | FAILED | CANCELLED`.
    #[serde(default)]
    pub status: Option<String>,
    /// Submission time.
    #[serde(default)]
    pub submitted_on: Option<chrono::DateTime<chrono::Utc>>,
    /// Completion time.
    #[serde(default)]
    pub solved_on: Option<chrono::DateTime<chrono::Utc>>,
    /// Solver the problem ran on.
    #[serde(default)]
    pub solver: Option<String>,
    /// Label given at submission.
    #[serde(default)]
    pub label: Option<String>,
    /// Failure description for `FAILED` problems.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Error code of a rejected submission.
    #[serde(default)]
    pub error_code: Option<u16>,
    /// Error message of a rejected submission.
    #[serde(default)]
    pub error_msg: Option<String>,
    /// Answer, included when the problem finished quickly.
    #[serde(default)]
    pub answer: Option<QpAnswer>,
}

impl ProblemStatus {
    /// Whether the submission itself was rejected.
    pub fn is_rejected(&self) -> bool {
        self.error_code.is_some() || (self.id.is_none() && self.error_msg.is_some())
    }

    /// Best available failure description.
    pub fn failure_message(&self) -> String {
        self.error_message
            .clone()
            .or_else(|| self.error_msg.clone())
            .unwrap_or_else(|| "unknown error".into())
    }
}

/// Body of `GET problems/{id}/answer/`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerResponse {
    /// The encoded answer.
    pub answer: QpAnswer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_rejected() {
        assert!(matches!(SapiClient::new(""), Err(DWaveError::MissingToken)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = SapiClient::with_endpoint("https://example.com/sapi/v2/", "DEV-secret").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("DEV-secret"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(client.endpoint(), "https://example.com/sapi/v2");
    }

    #[test]
    fn test_urls_end_with_slash() {
        let client = SapiClient::with_endpoint("https://example.com/sapi/v2", "t").unwrap();
        assert_eq!(client.url("problems/abc"), "https://example.com/sapi/v2/problems/abc/");
        assert_eq!(client.url("/solvers/remote/"), "https://example.com/sapi/v2/solvers/remote/");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, "x".into()),
            DWaveError::Unauthorized { status: 401, .. }
        ));
        assert!(matches!(
            map_status(StatusCode::FORBIDDEN, "x".into()),
            DWaveError::Unauthorized { status: 403, .. }
        ));
        assert!(matches!(
            map_status(StatusCode::NOT_FOUND, "gone".into()),
            DWaveError::ProblemNotFound(msg) if msg == "gone"
        ));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into()),
            DWaveError::ApiError { status: 429, .. }
        ));
    }

    #[test]
    fn test_submission_serialization() {
        let data = QpProblem {
            format: "qp".into(),
            lin: "AAAA".into(),
            quad: String::new(),
        };
        let sub = ProblemSubmission::ising("Advantage_system4.1", data, serde_json::json!({"num_reads": 10}))
            .with_label(Some("ra".into()));
        let json = serde_json::to_value(&sub).unwrap();
        assert_eq!(json["type"], "ising");
        assert_eq!(json["data"]["format"], "qp");
        assert_eq!(json["params"]["num_reads"], 10);
        assert_eq!(json["label"], "ra");
    }

    #[test]
    fn test_problem_status_parsing() {
        let ok: ProblemStatus = serde_json::from_value(serde_json::json!({
            "id": "f6b8a1c2",
            "status": "PENDING",
            "submitted_on": "2024-03-01T12:00:00.000Z",
            "solver": "Advantage_system4.1",
            "type": "ising"
        }))
        .unwrap();
        assert_eq!(ok.id.as_deref(), Some("f6b8a1c2"));
        assert!(!ok.is_rejected());
        assert!(ok.submitted_on.is_some());

        let rejected: ProblemStatus = serde_json::from_value(serde_json::json!({
            "error_code": 400,
            "error_msg": "Missing parameter 'solver'"
        }))
        .unwrap();
        assert!(rejected.is_rejected());
        assert_eq!(rejected.failure_message(), "Missing parameter 'solver'");
    }

    #[test]
    fn test_error_body_message() {
        let body: ErrorBody = serde_json::from_str(r#"{"error_code": 404, "error_msg": "Problem does not exist"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("Problem does not exist"));
    }

    #[test]
    fn test_error_message_falls_back_to_status_reason() {
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, String::new()), "Bad Gateway");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "  \n".into()), "Bad Gateway");
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, r#"{"detail": "Not found."}"#.into()),
            "Not found."
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "upstream crashed".into()),
            "upstream crashed"
        );
    }
}
