//! 生成请求编排
//!
//! 单次远端调用：发送前 startSpinner，结束后由 SpinnerGuard 的 Drop 保证 stopSpinner
//! （成功、错误、传输失败或 panic 均成立）。传输故障转为 GenerationResult::Failure 返回，不向上抛出。

use std::sync::Arc;
use std::time::Instant;

use crate::core::GenerationError;
use crate::generation::RemoteTransport;
use crate::host::Panel;
use crate::protocol::{GenerationRequest, GenerationResult, OutboundMessage, GENERATION_METHOD};

/// 加载指示守卫：创建时 startSpinner，Drop 时 stopSpinner
pub struct SpinnerGuard {
    panel: Arc<dyn Panel>,
}

impl SpinnerGuard {
    pub fn start(panel: Arc<dyn Panel>) -> Self {
        panel.post_message(OutboundMessage::StartSpinner);
        Self { panel }
    }
}

impl Drop for SpinnerGuard {
    fn drop(&mut self) {
        self.panel.post_message(OutboundMessage::StopSpinner);
    }
}

/// 一次生成的输入；outline 为 None 表示请求生成大纲
#[derive(Debug, Clone)]
pub struct GenerationInput {
    pub access_token: String,
    pub text: String,
    pub outline: Option<String>,
    pub generation_id: String,
    pub wizard_id: String,
}

pub struct GenerationOrchestrator {
    transport: Arc<dyn RemoteTransport>,
    service_url: String,
}

impl GenerationOrchestrator {
    pub fn new(transport: Arc<dyn RemoteTransport>, service_url: impl Into<String>) -> Self {
        Self {
            transport,
            service_url: service_url.into(),
        }
    }

    /// 发起一次生成；不重试、不设内部超时
    pub async fn generate(&self, panel: Arc<dyn Panel>, input: GenerationInput) -> GenerationResult {
        let _spinner = SpinnerGuard::start(panel);
        let start = Instant::now();

        let request = GenerationRequest::new(
            input.access_token,
            self.service_url.clone(),
            input.text,
            input.outline,
            input.generation_id,
            input.wizard_id,
        );
        let create_outline = request.create_outline;
        let generation_id = request.generation_id.clone();

        let result = match serde_json::to_value(&request) {
            Ok(params) => match self.transport.send_request(GENERATION_METHOD, params).await {
                Ok(response) => GenerationResult::from_response(response),
                Err(e) => {
                    tracing::warn!("Generation request failed: {}", e);
                    GenerationResult::Failure(GenerationError::transport(e.to_string()))
                }
            },
            Err(e) => GenerationResult::Failure(GenerationError::transport(e.to_string())),
        };

        tracing::info!(
            generation_id = %generation_id,
            create_outline,
            ok = !result.is_error(),
            duration_ms = start.elapsed().as_millis() as u64,
            "playbook generation"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::core::GenerationErrorKind;
    use crate::generation::{MockReply, MockTransport};

    #[derive(Default)]
    struct RecordingPanel(Mutex<Vec<OutboundMessage>>);

    impl Panel for RecordingPanel {
        fn post_message(&self, message: OutboundMessage) {
            self.0.lock().unwrap().push(message);
        }
        fn reveal(&self) {}
        fn dispose(&self) {}
    }

    fn input(outline: Option<&str>) -> GenerationInput {
        GenerationInput {
            access_token: "tok".into(),
            text: "install nginx".into(),
            outline: outline.map(String::from),
            generation_id: "g1".into(),
            wizard_id: "w1".into(),
        }
    }

    fn spinner_messages(panel: &RecordingPanel) -> Vec<OutboundMessage> {
        panel.0.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_success_toggles_spinner_and_sends_request() {
        let transport = Arc::new(MockTransport::new());
        let orchestrator = GenerationOrchestrator::new(transport.clone(), "https://svc");
        let panel = Arc::new(RecordingPanel::default());

        let result = orchestrator.generate(panel.clone(), input(None)).await;
        assert!(!result.is_error());
        assert_eq!(
            spinner_messages(&panel),
            vec![OutboundMessage::StartSpinner, OutboundMessage::StopSpinner]
        );

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, GENERATION_METHOD);
        assert_eq!(calls[0].1["createOutline"], true);
        assert_eq!(calls[0].1["URL"], "https://svc");
        assert_eq!(calls[0].1["wizardId"], "w1");
    }

    #[tokio::test]
    async fn test_error_result_stops_spinner() {
        let transport = Arc::new(MockTransport::with_replies([MockReply::Respond(
            json!({"code": "internal", "message": "backend down"}),
        )]));
        let orchestrator = GenerationOrchestrator::new(transport, "https://svc");
        let panel = Arc::new(RecordingPanel::default());

        let result = orchestrator.generate(panel.clone(), input(Some("1. a"))).await;
        assert!(result.is_error());
        assert_eq!(
            spinner_messages(&panel),
            vec![OutboundMessage::StartSpinner, OutboundMessage::StopSpinner]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_returned_as_data() {
        let transport = Arc::new(MockTransport::with_replies([MockReply::Fail(
            "connection reset".into(),
        )]));
        let orchestrator = GenerationOrchestrator::new(transport, "https://svc");
        let panel = Arc::new(RecordingPanel::default());

        match orchestrator.generate(panel.clone(), input(None)).await {
            GenerationResult::Failure(err) => {
                assert_eq!(err.kind, GenerationErrorKind::Transport);
                assert!(err.message.contains("connection reset"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(spinner_messages(&panel).len(), 2);
    }
}
