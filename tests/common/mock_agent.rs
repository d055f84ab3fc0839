//! Mock build agent: REST control endpoints plus a Socket.IO event socket.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, Notify};

/// A captured request for assertions.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// One step the event socket plays after the exec request arrives.
#[derive(Debug, Clone)]
pub enum Frame {
    /// Raw text packet.
    Text(String),
    /// WebSocket close with a reason.
    Close(String),
}

impl Frame {
    pub fn output(timestamp: &str, stdout: &str, stderr: &str) -> Self {
        let payload = json!({"timestamp": timestamp, "stdout": stdout, "stderr": stderr});
        Frame::Text(format!(r#"42["exec:output",{}]"#, payload))
    }

    pub fn exit(code: i32, error: Option<&str>) -> Self {
        let payload = json!({"code": code, "error": error});
        Frame::Text(format!(r#"42["exec:exit",{}]"#, payload))
    }
}

/// What the mock agent answers.
#[derive(Debug, Clone)]
pub struct AgentScript {
    pub version_status: u16,
    pub version: String,
    pub session_id: Option<String>,
    pub projects: String,
    pub sdks: String,
    pub exec_status: u16,
    pub frames: Vec<Frame>,
    pub ping_interval_ms: u64,
    pub ping_timeout_ms: u64,
    /// When false the socket never answers pings, like a host that died.
    pub answer_pings: bool,
}

impl Default for AgentScript {
    fn default() -> Self {
        Self {
            version_status: 200,
            version: "1.1.0".to_string(),
            session_id: Some("mock-sid".to_string()),
            projects: r#"[{"id":"p1","label":"L1","clientPath":"proj","defaultSdk":"s1"}]"#
                .to_string(),
            sdks: r#"[{"id":"s1","name":"N1","version":"4.0","arch":"aarch64"}]"#.to_string(),
            exec_status: 200,
            frames: Vec::new(),
            ping_interval_ms: 25000,
            ping_timeout_ms: 60000,
            answer_pings: true,
        }
    }
}

impl AgentScript {
    pub fn with_frames(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            ..Default::default()
        }
    }
}

#[derive(Clone)]
struct AgentState {
    script: Arc<AgentScript>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    socket_headers: Arc<Mutex<Vec<(String, String)>>>,
    exec_posted: Arc<Notify>,
}

/// Mock agent server for testing.
pub struct MockAgent {
    pub addr: SocketAddr,
    state: AgentState,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl MockAgent {
    /// Start a new mock agent.
    pub async fn start(script: AgentScript) -> Self {
        let state = AgentState {
            script: Arc::new(script),
            requests: Arc::new(Mutex::new(Vec::new())),
            socket_headers: Arc::new(Mutex::new(Vec::new())),
            exec_posted: Arc::new(Notify::new()),
        };

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

        let app = Router::new()
            .route("/api/v1/version", get(handle_version))
            .route("/api/v1/projects", get(handle_projects))
            .route("/api/v1/servers/0/sdks", get(handle_sdks))
            .route("/api/v1/exec", post(handle_exec))
            .route("/socket.io/", get(handle_socket))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock agent");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .ok();
        });

        // Wait for server to be ready
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr,
            state,
            shutdown: shutdown_tx,
        }
    }

    /// Get the base URL for this mock agent.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Address without scheme, as a user would type it.
    pub fn host_port(&self) -> String {
        self.addr.to_string()
    }

    /// Get all captured REST requests.
    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().await.clone()
    }

    /// Requests made to one endpoint.
    pub async fn requests_to(&self, path: &str) -> Vec<CapturedRequest> {
        self.captured_requests()
            .await
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    /// Headers of the last event socket upgrade request.
    pub async fn socket_headers(&self) -> Vec<(String, String)> {
        self.state.socket_headers.lock().await.clone()
    }
}

impl Drop for MockAgent {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

fn capture_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
        .collect()
}

async fn record(state: &AgentState, method: Method, uri: &Uri, headers: &HeaderMap, body: &[u8]) {
    state.requests.lock().await.push(CapturedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers: capture_headers(headers),
        body: body.to_vec(),
    });
}

fn json_response(status: u16, body: &str) -> Response {
    (
        StatusCode::from_u16(status).unwrap(),
        [("content-type", "application/json")],
        body.to_string(),
    )
        .into_response()
}

async fn handle_version(
    State(state): State<AgentState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    record(&state, method, &uri, &headers, &[]).await;
    let mut response = (
        StatusCode::from_u16(state.script.version_status).unwrap(),
        state.script.version.clone(),
    )
        .into_response();
    if let Some(sid) = &state.script.session_id {
        response
            .headers_mut()
            .insert("xds-agent-sid", sid.parse().unwrap());
    }
    response
}

async fn handle_projects(
    State(state): State<AgentState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    record(&state, method, &uri, &headers, &[]).await;
    json_response(200, &state.script.projects)
}

async fn handle_sdks(
    State(state): State<AgentState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    record(&state, method, &uri, &headers, &[]).await;
    json_response(200, &state.script.sdks)
}

async fn handle_exec(
    State(state): State<AgentState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    record(&state, method, &uri, &headers, &body).await;
    if state.script.exec_status != 200 {
        return json_response(state.script.exec_status, r#"{"error":"exec rejected"}"#);
    }
    state.exec_posted.notify_one();
    json_response(200, r#"{"status":"OK"}"#)
}

async fn handle_socket(
    State(state): State<AgentState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    *state.socket_headers.lock().await = capture_headers(&headers);
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

async fn serve_socket(mut socket: WebSocket, state: AgentState) {
    let handshake = format!(
        r#"0{{"sid":"eio-sid","upgrades":[],"pingInterval":{},"pingTimeout":{}}}"#,
        state.script.ping_interval_ms, state.script.ping_timeout_ms
    );
    if socket.send(Message::Text(handshake.into())).await.is_err() {
        return;
    }
    if socket.send(Message::Text("40".to_string().into())).await.is_err() {
        return;
    }

    state.exec_posted.notified().await;

    for frame in state.script.frames.iter() {
        match frame {
            Frame::Text(text) => {
                if socket.send(Message::Text(text.clone().into())).await.is_err() {
                    return;
                }
            }
            Frame::Close(reason) => {
                let _ = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: 1000,
                        reason: reason.clone().into(),
                    })))
                    .await;
                return;
            }
        }
    }

    // Keep the socket open until the client leaves.
    while let Some(Ok(message)) = socket.recv().await {
        if let Message::Text(text) = message {
            if text.as_str() == "2" && state.script.answer_pings {
                let _ = socket.send(Message::Text("3".to_string().into())).await;
            }
        }
    }
}
