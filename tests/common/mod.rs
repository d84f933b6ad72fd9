//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use solana_sdk::hash::Hash;
use solana_sdk::signature::Signature;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

/// Start a programmable HTTP server on an ephemeral port.
pub async fn start_mock_server<F>(handler: F) -> SocketAddr
where
    F: Fn(MockRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let _ = serve_connection(socket, handler.as_ref()).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn serve_connection<F>(mut socket: TcpStream, handler: &F) -> std::io::Result<()>
where
    F: Fn(MockRequest) -> (u16, String),
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let header_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = buf[header_end..].to_vec();

    let (status, response_body) = handler(MockRequest { method, path, body });
    let status_text = match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        response_body.len(),
        response_body
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

/// What `getSignatureStatuses` reports for every signature.
#[allow(dead_code)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusMode {
    /// Landed and finalized without error.
    #[default]
    Finalized,
    /// Landed with custom program error 6001 (0x1771).
    Failed,
    /// Never seen by the node.
    Unknown,
}

/// Minimal Solana JSON-RPC node: records method names and answers
/// signature status queries according to `status`.
#[derive(Clone, Default)]
pub struct MockSolana {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub sent: Arc<Mutex<Vec<Vec<u8>>>>,
    pub balance: u64,
    pub status: StatusMode,
    /// When set, `sendTransaction` answers with this JSON-RPC error.
    pub send_error: Option<(i64, String)>,
}

#[allow(dead_code)]
impl MockSolana {
    pub fn with_balance(balance: u64) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: StatusMode) -> Self {
        self.status = status;
        self
    }

    pub fn with_send_error(mut self, code: i64, message: &str) -> Self {
        self.send_error = Some((code, message.to_string()));
        self
    }

    /// Number of requests for one JSON-RPC method.
    pub fn count(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|m| *m == method).count()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Wire-format transactions received by `sendTransaction`.
    pub fn sent_transactions(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    pub fn handle(&self, request: MockRequest) -> (u16, String) {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let id = body["id"].clone();
        let method = body["method"].as_str().unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(method.clone());

        if method == "sendTransaction" {
            if let Some((code, message)) = &self.send_error {
                return (200, rpc_error(&id, *code, message));
            }
        }

        let context = json!({ "slot": 1 });
        let result = match method.as_str() {
            "getVersion" => json!({ "solana-core": "2.2.0", "feature-set": 1 }),
            "getHealth" => json!("ok"),
            "getLatestBlockhash" => json!({
                "context": context,
                "value": {
                    "blockhash": Hash::new_unique().to_string(),
                    "lastValidBlockHeight": 1000
                }
            }),
            "getMinimumBalanceForRentExemption" => json!(1_000_000),
            "getBalance" => json!({ "context": context, "value": self.balance }),
            "sendTransaction" => {
                let encoded = body["params"][0].as_str().unwrap_or_default();
                let wire = STANDARD.decode(encoded).unwrap_or_default();
                // One compact-u16 byte for the signature count, then signatures.
                let signature = Signature::try_from(&wire[1..65]).unwrap();
                self.sent.lock().unwrap().push(wire);
                json!(signature.to_string())
            }
            "getSignatureStatuses" => {
                let status = match self.status {
                    StatusMode::Finalized => json!({
                        "slot": 1,
                        "confirmations": null,
                        "err": null,
                        "status": { "Ok": null },
                        "confirmationStatus": "finalized"
                    }),
                    StatusMode::Failed => {
                        let err = json!({ "InstructionError": [0, { "Custom": 6001 }] });
                        json!({
                            "slot": 1,
                            "confirmations": null,
                            "err": err,
                            "status": { "Err": err },
                            "confirmationStatus": "confirmed"
                        })
                    }
                    StatusMode::Unknown => Value::Null,
                };
                json!({ "context": context, "value": [status] })
            }
            _ => return (200, rpc_error(&id, -32601, "Method not found")),
        };

        (200, json!({ "jsonrpc": "2.0", "id": id, "result": result }).to_string())
    }
}

fn rpc_error(id: &Value, code: i64, message: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
    .to_string()
}
