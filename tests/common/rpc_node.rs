//! A scripted JSON-RPC node on a local port, for exercising the real HTTP
//! client.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A running node. Every request is recorded as `(method, params)`.
pub struct RpcNode {
    pub url: String,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl RpcNode {
    /// How many times `method` was called.
    pub fn count(&self, method: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    /// Params of every call to `method`, in order.
    pub fn params(&self, method: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

/// `{"result": value}`, merged into the response envelope.
pub fn result(value: Value) -> Value {
    json!({ "result": value })
}

/// `{"error": {...}}`, merged into the response envelope.
pub fn rpc_error(code: i64, message: &str) -> Value {
    json!({ "error": { "code": code, "message": message } })
}

/// Start a node that answers every request with `handler(method, params)`.
/// `eth_chainId` is answered with 31337 unless the handler overrides it.
pub async fn start_rpc_node<F>(handler: F) -> RpcNode
where
    F: Fn(&str, &Value) -> Option<Value> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let recorded = requests.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let Some(body) = read_request_body(&mut socket).await else {
                            return;
                        };
                        let request: Value = serde_json::from_slice(&body).unwrap();
                        let method = request["method"].as_str().unwrap_or_default().to_string();
                        let params = request["params"].clone();
                        recorded.lock().unwrap().push((method.clone(), params.clone()));

                        let mut response = match handler(&method, &params) {
                            Some(answer) => answer,
                            None if method == "eth_chainId" => result(json!("0x7a69")),
                            None => rpc_error(-32601, "method not found"),
                        };
                        response["jsonrpc"] = json!("2.0");
                        response["id"] = request["id"].clone();

                        let body = response.to_string();
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    RpcNode {
        url: url(addr),
        requests,
    }
}

/// Start a node that accepts connections and closes them without answering.
pub async fn start_dropping_node() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let _ = read_request_body(&mut socket).await;
            drop(socket);
        }
    });

    url(addr)
}

/// Start a node that reads requests and never answers.
pub async fn start_hung_node() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = read_request_body(&mut socket).await;
                tokio::time::sleep(Duration::from_secs(3600)).await;
                drop(socket);
            });
        }
    });

    url(addr)
}

fn url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}

async fn read_request_body(socket: &mut TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            let start = end + 4;
            if buf.len() >= start + length {
                return Some(buf[start..start + length].to_vec());
            }
        }
    }
}
