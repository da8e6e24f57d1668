//! 远端传输抽象与 JSON-RPC over HTTP 实现
//!
//! RemoteTransport 只有一个能力：send_request(method, params) -> response。
//! 超时与重试属于传输层，编排器本身不重试。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::WizardError;

/// 远端请求能力；Err 表示传输故障（网络、超时、JSON-RPC error）
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn send_request(&self, method: &str, params: Value) -> Result<Value, WizardError>;
}

/// JSON-RPC 2.0 over HTTP POST；连接失败与 5xx 按线性退避重试
pub struct JsonRpcHttpTransport {
    client: Client,
    endpoint: String,
    max_retries: u32,
    retry_delay: Duration,
    next_id: AtomicU64,
}

impl JsonRpcHttpTransport {
    pub fn new(endpoint: &str, timeout_secs: u64, max_retries: u32, retry_delay_ms: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.to_string(),
            max_retries,
            retry_delay: Duration::from_millis(retry_delay_ms),
            next_id: AtomicU64::new(1),
        }
    }

    async fn post_once(&self, body: &Value) -> Result<Value, Attempt> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let retryable = e.is_connect() || e.is_timeout();
                Attempt::failed(retryable, e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Attempt::failed(
                status.is_server_error(),
                format!("HTTP {}", status),
            ));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| Attempt::failed(false, format!("Invalid JSON body: {e}")))
    }
}

/// 单次尝试的失败：是否可重试 + 原因
struct Attempt {
    retryable: bool,
    reason: String,
}

impl Attempt {
    fn failed(retryable: bool, reason: String) -> Self {
        Self { retryable, reason }
    }
}

#[async_trait]
impl RemoteTransport for JsonRpcHttpTransport {
    async fn send_request(&self, method: &str, params: Value) -> Result<Value, WizardError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let mut attempt = 0;
        loop {
            match self.post_once(&body).await {
                Ok(envelope) => return parse_rpc_response(envelope),
                Err(failure) if failure.retryable && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        method,
                        attempt,
                        "Request failed ({}), retrying",
                        failure.reason
                    );
                    tokio::time::sleep(self.retry_delay * attempt).await;
                }
                Err(failure) => return Err(WizardError::Transport(failure.reason)),
            }
        }
    }
}

/// 解析 JSON-RPC 响应信封：error 对象转为 WizardError::Remote，否则取 result
pub fn parse_rpc_response(envelope: Value) -> Result<Value, WizardError> {
    if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(WizardError::Remote { code, message });
    }
    match envelope.get("result") {
        Some(result) => Ok(result.clone()),
        None => Err(WizardError::InvalidResponse(
            "JSON-RPC response has neither result nor error".into(),
        )),
    }
}
