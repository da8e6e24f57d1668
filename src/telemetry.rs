//! 向导埋点：会话动作事件
//!
//! ActionEmitter 将 (wizard_id, action, from_page, to_page) 组装为 FeedbackRequest，
//! 由后台任务交给 TelemetrySink；上报失败只记日志，不影响调用方。

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::config::TelemetrySection;
use crate::core::WizardError;

/// 会话动作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Open,
    Transition,
    CloseAccept,
    CloseCancel,
}

/// 单次动作事件（构造后立即上报，不保留）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEvent {
    pub wizard_id: String,
    pub action: ActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_page: Option<u32>,
}

/// 上报请求体：`{playbookGenerationAction: {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub playbook_generation_action: ActionEvent,
}

/// 埋点接收端
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// suppress_in_test 为 true 时接收端应丢弃该事件（测试模式）
    async fn send_feedback(
        &self,
        request: &FeedbackRequest,
        suppress_in_test: bool,
    ) -> Result<(), WizardError>;
}

/// 写入结构化日志的接收端
#[derive(Debug, Default)]
pub struct TracingTelemetrySink;

#[async_trait]
impl TelemetrySink for TracingTelemetrySink {
    async fn send_feedback(
        &self,
        request: &FeedbackRequest,
        suppress_in_test: bool,
    ) -> Result<(), WizardError> {
        if suppress_in_test {
            return Ok(());
        }
        let payload = serde_json::to_string(request)?;
        tracing::info!(target: "telemetry", payload = %payload, "playbook generation action");
        Ok(())
    }
}

/// 发往上报任务的指令
enum EmitterCommand {
    Send(FeedbackRequest),
    /// 之前排队的事件全部处理完后回执
    Flush(oneshot::Sender<()>),
}

/// 动作埋点发射器
///
/// emit 只把事件放入队列立即返回；后台任务按顺序调用 sink，慢或挂起的 sink 不会阻塞调用方。
/// 创建时需处于 tokio 运行时中。
#[derive(Clone)]
pub struct ActionEmitter {
    tx: mpsc::UnboundedSender<EmitterCommand>,
    enabled: bool,
    test_mode: bool,
}

impl ActionEmitter {
    pub fn new(sink: Arc<dyn TelemetrySink>, test_mode: bool) -> Self {
        Self::spawn(sink, true, test_mode)
    }

    /// 按配置创建：test_mode 由环境变量是否存在决定
    pub fn from_config(sink: Arc<dyn TelemetrySink>, cfg: &TelemetrySection) -> Self {
        Self::spawn(sink, cfg.enabled, test_mode_from_env(&cfg.test_mode_env))
    }

    fn spawn(sink: Arc<dyn TelemetrySink>, enabled: bool, test_mode: bool) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<EmitterCommand>();
        tokio::spawn(async move {
            while let Some(cmd) = rx.recv().await {
                match cmd {
                    EmitterCommand::Send(request) => {
                        if let Err(e) = sink.send_feedback(&request, test_mode).await {
                            tracing::warn!("Failed to send playbook generation action: {}", e);
                        }
                    }
                    EmitterCommand::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        Self {
            tx,
            enabled,
            test_mode,
        }
    }

    pub fn is_test_mode(&self) -> bool {
        self.test_mode
    }

    /// 排队上报一次动作，不等待结果
    pub fn emit(&self, event: ActionEvent) {
        if !self.enabled {
            return;
        }
        tracing::debug!(
            wizard_id = %event.wizard_id,
            action = ?event.action,
            from_page = ?event.from_page,
            to_page = ?event.to_page,
            "emit action event"
        );
        let request = FeedbackRequest {
            playbook_generation_action: event,
        };
        if self.tx.send(EmitterCommand::Send(request)).is_err() {
            tracing::warn!("Telemetry worker stopped, dropping action event");
        }
    }

    /// 等待此前排队的事件全部交给 sink（退出前或测试中使用）
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(EmitterCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

/// 环境变量存在即视为测试模式
pub fn test_mode_from_env(name: &str) -> bool {
    !name.is_empty() && std::env::var_os(name).is_some()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(FeedbackRequest, bool)>>,
        fail: bool,
    }

    #[async_trait]
    impl TelemetrySink for RecordingSink {
        async fn send_feedback(
            &self,
            request: &FeedbackRequest,
            suppress_in_test: bool,
        ) -> Result<(), WizardError> {
            self.sent
                .lock()
                .unwrap()
                .push((request.clone(), suppress_in_test));
            if self.fail {
                return Err(WizardError::Telemetry("sink offline".into()));
            }
            Ok(())
        }
    }

    fn event(action: ActionKind, from_page: Option<u32>, to_page: Option<u32>) -> ActionEvent {
        ActionEvent {
            wizard_id: "w1".into(),
            action,
            from_page,
            to_page,
        }
    }

    #[test]
    fn test_feedback_payload_shape() {
        let request = FeedbackRequest {
            playbook_generation_action: event(ActionKind::Open, None, Some(1)),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "playbookGenerationAction": {
                    "wizardId": "w1",
                    "action": "OPEN",
                    "toPage": 1
                }
            })
        );

        let json = serde_json::to_value(event(ActionKind::CloseAccept, Some(3), None)).unwrap();
        assert_eq!(json["action"], "CLOSE_ACCEPT");
        assert_eq!(json["fromPage"], 3);
        assert!(json.get("toPage").is_none());
    }

    #[tokio::test]
    async fn test_emit_passes_test_mode_flag() {
        let sink = Arc::new(RecordingSink::default());
        let emitter = ActionEmitter::new(sink.clone(), true);
        emitter.emit(event(ActionKind::Transition, Some(1), Some(2)));
        emitter.flush().await;

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1);
        assert_eq!(sent[0].0.playbook_generation_action.to_page, Some(2));
    }

    #[tokio::test]
    async fn test_emit_swallows_sink_errors() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let emitter = ActionEmitter::new(sink.clone(), false);
        emitter.emit(event(ActionKind::CloseCancel, Some(2), None));
        emitter.emit(event(ActionKind::CloseCancel, Some(3), None));
        emitter.flush().await;
        // 第一次失败后后台任务继续处理
        assert_eq!(sink.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_emitter_sends_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let cfg = TelemetrySection {
            enabled: false,
            test_mode_env: String::new(),
        };
        let emitter = ActionEmitter::from_config(sink.clone(), &cfg);
        assert!(!emitter.is_test_mode());
        emitter.emit(event(ActionKind::Open, None, Some(1)));
        emitter.flush().await;
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    /// 永不返回的 sink
    struct HangingSink;

    #[async_trait]
    impl TelemetrySink for HangingSink {
        async fn send_feedback(&self, _: &FeedbackRequest, _: bool) -> Result<(), WizardError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_emit_does_not_wait_for_sink() {
        let emitter = ActionEmitter::new(Arc::new(HangingSink), false);
        let emitted = tokio::time::timeout(std::time::Duration::from_millis(300), async {
            emitter.emit(event(ActionKind::Open, None, Some(1)));
            emitter.emit(event(ActionKind::Transition, Some(1), Some(2)));
        })
        .await;
        assert!(emitted.is_ok());
    }

    #[tokio::test]
    async fn test_events_delivered_in_order() {
        let sink = Arc::new(RecordingSink::default());
        let emitter = ActionEmitter::new(sink.clone(), false);
        for page in 2..=5 {
            emitter.emit(event(ActionKind::Transition, Some(page - 1), Some(page)));
        }
        emitter.flush().await;

        let pages: Vec<_> = sink
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|(r, _)| r.playbook_generation_action.to_page)
            .collect();
        assert_eq!(pages, vec![Some(2), Some(3), Some(4), Some(5)]);
    }

    #[test]
    fn test_test_mode_from_env() {
        std::env::set_var("WIZARD_TELEMETRY_TEST_MARKER", "1");
        assert!(test_mode_from_env("WIZARD_TELEMETRY_TEST_MARKER"));
        assert!(!test_mode_from_env("WIZARD_TELEMETRY_TEST_MARKER_UNSET"));
        assert!(!test_mode_from_env(""));
    }
}
