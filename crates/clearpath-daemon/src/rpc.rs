//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! JSON-RPC method calls to the appropriate command handlers. A
//! connection can switch into push mode with `subscribe_events`, after
//! which daemon events stream to it as JSON-RPC notifications.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

use clearpath_store::StoreError;

use crate::commands;
use crate::events::EventFilter;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    /// Error code.
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    // Domain errors

    /// Backend credentials absent (-32001).
    pub fn not_configured() -> Self {
        Self {
            code: -32001,
            message: "NOT_CONFIGURED".to_string(),
            data: None,
        }
    }

    /// Sign-in rejected or role verification failed (-32010).
    pub fn auth_failed(detail: &str) -> Self {
        Self {
            code: -32010,
            message: "AUTH_FAILED".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// No session (-32011).
    pub fn not_authenticated() -> Self {
        Self {
            code: -32011,
            message: "NOT_AUTHENTICATED".to_string(),
            data: None,
        }
    }

    /// The session resolved to no role profile (-32012).
    pub fn no_profile() -> Self {
        Self {
            code: -32012,
            message: "NO_PROFILE".to_string(),
            data: None,
        }
    }

    /// The command needs a different role (-32013).
    pub fn role_required(required: &str) -> Self {
        Self {
            code: -32013,
            message: "ROLE_REQUIRED".to_string(),
            data: Some(serde_json::json!({"required": required})),
        }
    }

    /// Officer acting outside their department (-32014).
    pub fn wrong_department(detail: &str) -> Self {
        Self {
            code: -32014,
            message: "WRONG_DEPARTMENT".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Certificate requested before all departments cleared (-32015).
    pub fn clearance_incomplete(detail: &str) -> Self {
        Self {
            code: -32015,
            message: "CLEARANCE_INCOMPLETE".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Map a store error to its RPC shape.
    pub fn from_store(error: &StoreError) -> Self {
        match error {
            StoreError::NotConfigured => Self::not_configured(),
            StoreError::Auth(detail) => Self::auth_failed(detail),
            other => Self::internal_error(&other.to_string()),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let request = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => request,
            Err(_) => {
                write_json(
                    &mut writer,
                    &RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
                )
                .await?;
                continue;
            }
        };

        // subscribe_events switches this connection into push mode.
        if request.method == "subscribe_events" {
            let filter: EventFilter =
                serde_json::from_value(request.params.clone()).unwrap_or_default();
            write_json(
                &mut writer,
                &RpcResponse::success(request.id, serde_json::json!({"subscribed": true})),
            )
            .await?;
            let mut rx = state.events.subscribe();
            loop {
                match rx.recv().await {
                    Ok(event) if filter.matches(&event) => {
                        let notification = serde_json::json!({
                            "jsonrpc": "2.0",
                            "method": "event",
                            "params": event,
                        });
                        let mut json = notification.to_string();
                        json.push('\n');
                        if writer.write_all(json.as_bytes()).await.is_err() {
                            return Ok(()); // client gone
                        }
                        writer.flush().await?;
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event subscriber lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => return Ok(()),
                }
            }
        }

        let response = dispatch_request(state.clone(), request).await;
        write_json(&mut writer, &response).await?;
    }

    Ok(())
}

async fn write_json<W, T>(writer: &mut W, value: &T) -> anyhow::Result<()>
where
    W: AsyncWriteExt + Unpin,
    T: Serialize,
{
    let mut json = serde_json::to_string(value)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();

    debug!("Dispatching RPC method: {}", method);

    // Check if method requires an authenticated session
    let requires_auth = !matches!(
        method,
        "sign_in_student" | "sign_in_department" | "sign_in_admin" | "get_auth_state" | "navigate"
    );

    if requires_auth {
        let auth = state.auth.read().await;
        if auth.session.is_none() {
            return RpcResponse::error(id, RpcError::not_authenticated());
        }
    }

    let result = match method {
        // Auth commands
        "sign_in_student" => commands::auth::sign_in_student(&state, &request.params).await,
        "sign_in_department" => {
            commands::auth::sign_in_department(&state, &request.params).await
        }
        "sign_in_admin" => commands::auth::sign_in_admin(&state, &request.params).await,
        "sign_out" => commands::auth::sign_out(&state).await,
        "get_auth_state" => commands::auth::get_auth_state(&state).await,
        "navigate" => commands::auth::navigate(&state, &request.params).await,

        // Clearance commands
        "get_clearance_view" => commands::clearance::get_clearance_view(&state).await,
        "record_clearance" => {
            commands::clearance::record_clearance(&state, &request.params).await
        }
        "send_reminder" => commands::clearance::send_reminder(&state, &request.params).await,

        // Certificate command
        "generate_certificate" => commands::certificate::generate_certificate(&state).await,

        // Admin commands
        "get_overview_stats" => commands::admin::get_overview_stats(&state).await,

        // Profile commands
        "update_student_profile" => {
            commands::profile::update_student_profile(&state, &request.params).await
        }

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_codes() {
        assert_eq!(RpcError::not_configured().code, -32001);
        assert_eq!(RpcError::auth_failed("bad credentials").code, -32010);
        assert_eq!(RpcError::not_authenticated().code, -32011);
        assert_eq!(RpcError::no_profile().code, -32012);
        assert_eq!(RpcError::role_required("student").code, -32013);
        assert_eq!(RpcError::wrong_department("Mess").code, -32014);
        assert_eq!(RpcError::clearance_incomplete("2 pending").code, -32015);
        assert_eq!(RpcError::method_not_found("unknown").code, -32601);
    }

    #[test]
    fn test_store_error_mapping() {
        let err = RpcError::from_store(&StoreError::NotConfigured);
        assert_eq!(err.message, "NOT_CONFIGURED");

        let err = RpcError::from_store(&StoreError::Auth("invalid login".to_string()));
        assert_eq!(err.message, "AUTH_FAILED");

        let err = RpcError::from_store(&StoreError::Backend {
            status: 500,
            message: "boom".to_string(),
        });
        assert_eq!(err.code, -32603);
    }

    #[test]
    fn test_rpc_response_shapes() {
        let resp = RpcResponse::success(serde_json::json!(1), serde_json::json!({"ok": true}));
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());

        let resp = RpcResponse::error(serde_json::json!(1), RpcError::internal_error("test"));
        assert!(resp.result.is_none());
        assert!(resp.error.is_some());
    }
}
