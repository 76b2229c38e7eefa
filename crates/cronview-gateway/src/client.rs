//! WebSocket JSON-RPC client for the gateway.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tokio_tungstenite::tungstenite;
use tracing::{debug, warn};
use url::Url;

use cronview_config::GatewayConfig;
use cronview_cron::SourceError;

use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse};

#[derive(Debug, Error)]
pub enum GatewayClientError {
    #[error("invalid gateway request: {0}")]
    InvalidRequest(String),
    #[error("failed to connect to gateway: {0}")]
    Connect(String),
    #[error("websocket error: {0}")]
    WebSocket(String),
    #[error("gateway closed the connection before replying")]
    Closed,
    #[error("invalid gateway response: {0}")]
    Protocol(String),
    #[error("{message} (code {code})")]
    Remote { code: i64, message: String },
    #[error("gateway timed out after {0}ms")]
    Timeout(u64),
}

impl From<GatewayClientError> for SourceError {
    fn from(err: GatewayClientError) -> Self {
        match err {
            GatewayClientError::Remote { .. } => SourceError::Remote(err.to_string()),
            GatewayClientError::Timeout(ms) => SourceError::Timeout(ms),
            other => SourceError::Transport(other.to_string()),
        }
    }
}

/// One-shot JSON-RPC client: each call opens its own connection.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    url: String,
    token: Option<String>,
    timeout_ms: u64,
}

impl GatewayClient {
    pub fn new(url: impl Into<String>, token: Option<String>, timeout_ms: u64) -> Self {
        Self {
            url: url.into(),
            token,
            timeout_ms,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            config.url.clone(),
            config.auth_token.clone(),
            config.timeout_ms,
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call `method` and return its `result` (`Value::Null` when absent).
    ///
    /// Connect, send, and wait are bounded together by the timeout.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, GatewayClientError> {
        let limit = Duration::from_millis(self.timeout_ms);
        match tokio::time::timeout(limit, self.round_trip(method, params)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(method, timeout_ms = self.timeout_ms, "Gateway call timed out");
                Err(GatewayClientError::Timeout(self.timeout_ms))
            }
        }
    }

    async fn round_trip(&self, method: &str, params: Value) -> Result<Value, GatewayClientError> {
        let request = build_ws_request(&self.url, self.token.as_deref())?;

        let (mut ws, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| GatewayClientError::Connect(e.to_string()))?;

        let id = uuid::Uuid::new_v4().to_string();
        let rpc_request = JsonRpcRequest::new(id.clone(), method, params);
        let text = serde_json::to_string(&rpc_request)
            .map_err(|e| GatewayClientError::InvalidRequest(e.to_string()))?;

        debug!(method, id = %id, "Sending gateway request");
        ws.send(tungstenite::Message::Text(text.into()))
            .await
            .map_err(|e| GatewayClientError::WebSocket(e.to_string()))?;

        let outcome = wait_for_response(&mut ws, &id).await;

        // Close connection
        let _ = ws.close(None).await;

        outcome
    }
}

async fn wait_for_response<S>(ws: &mut S, id: &str) -> Result<Value, GatewayClientError>
where
    S: futures::Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    while let Some(msg) = ws.next().await {
        let msg = msg.map_err(|e| GatewayClientError::WebSocket(e.to_string()))?;
        match msg {
            tungstenite::Message::Text(text) => {
                let response: JsonRpcResponse = serde_json::from_str(&text)
                    .map_err(|e| GatewayClientError::Protocol(e.to_string()))?;

                if response.id.as_str() != Some(id) {
                    debug!(id = %response.id, "Ignoring unrelated gateway message");
                    continue;
                }

                if let Some(error) = response.error {
                    return Err(GatewayClientError::Remote {
                        code: error.code,
                        message: error.message,
                    });
                }

                return Ok(response.result.unwrap_or(Value::Null));
            }
            tungstenite::Message::Close(_) => break,
            _ => {}
        }
    }

    Err(GatewayClientError::Closed)
}

/// Build the upgrade request, attaching the token as a query param and a
/// bearer header.
fn build_ws_request(
    raw_url: &str,
    token: Option<&str>,
) -> Result<tungstenite::http::Request<()>, GatewayClientError> {
    let invalid = || {
        GatewayClientError::InvalidRequest(format!("expected a ws:// or wss:// URL, got {raw_url}"))
    };
    let mut parsed = Url::parse(raw_url).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "ws" | "wss") {
        return Err(invalid());
    }
    if let Some(token) = token {
        parsed.query_pairs_mut().append_pair("token", token);
    }
    let ws_url = parsed.as_str();

    let host = extract_host(ws_url).ok_or_else(invalid)?;

    let mut request = tungstenite::http::Request::builder()
        .uri(ws_url)
        .header("Sec-WebSocket-Version", "13")
        .header(
            "Sec-WebSocket-Key",
            tungstenite::handshake::client::generate_key(),
        )
        .header("Connection", "Upgrade")
        .header("Upgrade", "websocket")
        .header("Host", host);

    if let Some(token) = token {
        request = request.header("Authorization", format!("Bearer {token}"));
    }

    request
        .body(())
        .map_err(|e| GatewayClientError::InvalidRequest(e.to_string()))
}

/// Extract host from a URL string.
fn extract_host(url: &str) -> Option<&str> {
    let after_scheme = url
        .strip_prefix("ws://")
        .or_else(|| url.strip_prefix("wss://"))?;
    after_scheme
        .split(['/', '?'])
        .next()
        .filter(|h| !h.is_empty())
}
