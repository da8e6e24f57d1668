//! playbook-wizard - stdio 宿主
//!
//! 入口：初始化日志、加载配置、组装控制器与路由，打开面板后逐行读取 stdin 的面板消息。
//! stdout 输出面板消息（JSON 行）；stdin EOF 视为用户关闭面板。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use playbook_wizard::{
    config::load_config,
    generation::{create_transport_from_config, ErrorClassifier, GenerationOrchestrator, NoTrialPolicy},
    host::{
        stdio::{FileEditorHost, HostEvent, LoggingContentMatches, StdioPanelHost},
        StaticCredentials, SyntectHighlighter,
    },
    observability,
    protocol::InboundMessage,
    telemetry::{ActionEmitter, TracingTelemetrySink},
    Collaborators, MessageRouter, WizardController,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// 退出前等待埋点交付的上限
const TELEMETRY_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load configuration")?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<HostEvent>();

    let emitter = ActionEmitter::from_config(Arc::new(TracingTelemetrySink), &cfg.telemetry);
    let controller = Arc::new(WizardController::new(
        Arc::new(StdioPanelHost::new(event_tx.clone())),
        emitter,
    ));

    let output_dir = cfg
        .editor
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("playbooks"));
    let router = Arc::new(MessageRouter::new(
        controller.clone(),
        GenerationOrchestrator::new(create_transport_from_config(&cfg.service), cfg.service.url.clone()),
        ErrorClassifier::new(Arc::new(NoTrialPolicy)),
        Collaborators {
            credentials: Arc::new(StaticCredentials(cfg.service.access_token.clone())),
            editor: Arc::new(FileEditorHost::new(output_dir)),
            highlighter: Arc::new(SyntectHighlighter),
            content_matches: Arc::new(LoggingContentMatches),
            language: cfg.editor.language.clone(),
        },
    ));

    controller.open().context("Failed to open wizard panel")?;

    // stdin 读取：每行一条消息，EOF 视为用户关闭面板
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => {
                    if event_tx.send(HostEvent::Inbound(line)).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    let _ = event_tx.send(HostEvent::InputClosed);
                    break;
                }
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    let _ = event_tx.send(HostEvent::InputClosed);
                    break;
                }
            }
        }
    });

    while let Some(event) = event_rx.recv().await {
        match event {
            HostEvent::Inbound(line) => match serde_json::from_str::<InboundMessage>(&line) {
                Ok(message) => {
                    // 大纲请求在后台完成，这里不等待
                    let _ = router.dispatch(message).await;
                }
                Err(e) => tracing::warn!("Ignoring malformed panel message: {}", e),
            },
            HostEvent::PanelDisposed { wizard_id } => {
                controller.panel_disposed(&wizard_id);
                if !controller.sessions().is_active() {
                    break;
                }
            }
            // 关闭当前面板，随后的 PanelDisposed 负责上报与退出
            HostEvent::InputClosed => match controller.sessions().panel() {
                Some(panel) => panel.dispose(),
                None => break,
            },
        }
    }

    if tokio::time::timeout(TELEMETRY_FLUSH_TIMEOUT, controller.flush_telemetry())
        .await
        .is_err()
    {
        tracing::warn!("Timed out flushing telemetry events");
    }
    Ok(())
}
