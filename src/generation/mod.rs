//! 生成层：远端传输、请求编排、错误分类与试用拦截

pub mod classifier;
pub mod mock;
pub mod orchestrator;
pub mod transport;

pub use classifier::{Classification, ErrorClassifier, NoTrialPolicy, TrialPolicy};
pub use mock::{MockReply, MockTransport};
pub use orchestrator::{GenerationInput, GenerationOrchestrator, SpinnerGuard};
pub use transport::{JsonRpcHttpTransport, RemoteTransport};

use std::sync::Arc;

use crate::config::ServiceSection;

/// 根据配置选择传输：有 endpoint 用 JSON-RPC over HTTP，否则用 Mock
pub fn create_transport_from_config(cfg: &ServiceSection) -> Arc<dyn RemoteTransport> {
    match cfg.endpoint.as_deref().filter(|e| !e.is_empty()) {
        Some(endpoint) => {
            tracing::info!("Using JSON-RPC transport ({})", endpoint);
            Arc::new(JsonRpcHttpTransport::new(
                endpoint,
                cfg.timeout_secs,
                cfg.max_retries,
                cfg.retry_delay_ms,
            ))
        }
        None => {
            tracing::warn!("No service endpoint configured, using mock transport");
            Arc::new(MockTransport::new())
        }
    }
}
