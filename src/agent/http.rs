//! HTTP control channel.

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::agent::control::ControlChannel;
use crate::agent::types::{ExecRequest, ProjectDescriptor, SdkDescriptor};
use crate::agent::{AgentError, API_PREFIX, SESSION_HEADER};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Control channel speaking the agent's REST API.
pub struct HttpControlChannel {
    client: Client,
    base_url: Url,
    session_id: Option<String>,
}

impl HttpControlChannel {
    pub fn new(base_url: &Url) -> Result<Self, AgentError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AgentError::Unreachable {
                url: base_url.to_string(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.clone(),
            session_id: None,
        })
    }

    /// Full URL of an API endpoint, e.g. `/version` → `<base>/api/v1/version`.
    pub fn endpoint(&self, path: &str) -> Result<Url, AgentError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        let relative = format!("{}{}", API_PREFIX, path);
        base.join(relative.trim_start_matches('/'))
            .map_err(|e| AgentError::Unreachable {
                url: self.base_url.to_string(),
                reason: format!("invalid endpoint {}: {}", path, e),
            })
    }

    fn with_session(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.session_id {
            Some(sid) => builder.header(SESSION_HEADER, sid),
            None => builder,
        }
    }

    fn unreachable(&self, err: &reqwest::Error) -> AgentError {
        AgentError::Unreachable {
            url: origin(&self.base_url),
            reason: root_cause(err),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AgentError> {
        let url = self.endpoint(path)?;
        let query_failed = |message: String| AgentError::QueryFailed {
            endpoint: path.to_string(),
            message,
        };

        let response = self
            .with_session(self.client.get(url))
            .send()
            .await
            .map_err(|e| query_failed(root_cause(&e)))?;
        let response = ensure_success(response).await.map_err(query_failed)?;
        let body = response
            .bytes()
            .await
            .map_err(|e| query_failed(root_cause(&e)))?;
        debug!(endpoint = path, body = %String::from_utf8_lossy(&body), "Agent response");

        serde_json::from_slice(&body).map_err(|e| query_failed(format!("malformed payload: {}", e)))
    }
}

#[async_trait]
impl ControlChannel for HttpControlChannel {
    async fn check_alive(&mut self) -> Result<String, AgentError> {
        let url = self.endpoint("/version")?;
        debug!(%url, "Connecting to agent");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.unreachable(&e))?;

        if let Some(sid) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            debug!(session_id = sid, "Agent session established");
            self.session_id = Some(sid.to_string());
        }

        let response = ensure_success(response)
            .await
            .map_err(|reason| AgentError::Unreachable {
                url: origin(&self.base_url),
                reason,
            })?;
        let version = response
            .text()
            .await
            .map_err(|e| self.unreachable(&e))?
            .trim()
            .to_string();
        info!(%version, "Agent version");
        Ok(version)
    }

    async fn list_projects(&mut self) -> Result<Vec<ProjectDescriptor>, AgentError> {
        self.get_json("/projects").await
    }

    async fn list_sdks(&mut self) -> Result<Vec<SdkDescriptor>, AgentError> {
        self.get_json("/servers/0/sdks").await
    }

    async fn submit_exec(&mut self, request: &ExecRequest) -> Result<(), AgentError> {
        let url = self.endpoint("/exec")?;
        info!(%url, cmd = %request.cmd, args = ?request.args, "Submitting exec request");

        let response = self
            .with_session(self.client.post(url))
            .json(request)
            .send()
            .await
            .map_err(|e| AgentError::SubmissionFailed {
                message: root_cause(&e),
            })?;
        let response = ensure_success(response)
            .await
            .map_err(|message| AgentError::SubmissionFailed { message })?;
        debug!(status = %response.status(), "Exec request acknowledged");
        Ok(())
    }

    fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}

/// Pass 2xx responses through; turn anything else into "status - body".
async fn ensure_success(response: Response) -> Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    if body.is_empty() {
        Err(format!("HTTP {}", status))
    } else {
        Err(format!("HTTP {} - {}", status, body))
    }
}

/// Innermost error message; reqwest's own message only repeats the URL.
fn root_cause(err: &(dyn StdError + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

/// `scheme://host:port` of the agent, for error messages.
fn origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}
