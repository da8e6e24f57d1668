//! stdio 宿主：供 `playbook-wizard` 二进制使用
//!
//! 面板消息按 JSON 行写到 stdout；面板销毁通过 HostEvent 通知主循环；
//! 接受的 playbook 写入带时间戳的新文件（不覆盖已有文件）；错误通知写 stderr。

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::core::WizardError;
use crate::host::{ContentMatchNotifier, EditorHost, Panel, PanelHost};
use crate::protocol::OutboundMessage;

/// 宿主主循环事件
#[derive(Debug)]
pub enum HostEvent {
    /// stdin 上读到的一行入站消息
    Inbound(String),
    /// 面板已销毁（用户关闭或接受后关闭）
    PanelDisposed { wizard_id: String },
    /// stdin 已关闭（EOF 或读取错误），视为用户关闭当前面板
    InputClosed,
}

pub struct StdioPanelHost {
    events: mpsc::UnboundedSender<HostEvent>,
}

impl StdioPanelHost {
    pub fn new(events: mpsc::UnboundedSender<HostEvent>) -> Self {
        Self { events }
    }
}

impl PanelHost for StdioPanelHost {
    fn create_panel(&self, wizard_id: &str) -> Result<Arc<dyn Panel>, WizardError> {
        Ok(Arc::new(StdioPanel {
            wizard_id: wizard_id.to_string(),
            events: self.events.clone(),
        }))
    }
}

pub struct StdioPanel {
    wizard_id: String,
    events: mpsc::UnboundedSender<HostEvent>,
}

impl Panel for StdioPanel {
    fn post_message(&self, message: OutboundMessage) {
        match serde_json::to_string(&message) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!("Failed to encode outbound message: {}", e),
        }
    }

    fn reveal(&self) {
        tracing::info!("Panel revealed");
    }

    fn dispose(&self) {
        let _ = self.events.send(HostEvent::PanelDisposed {
            wizard_id: self.wizard_id.clone(),
        });
    }
}

/// 同名文件最多尝试的后缀数
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// 将文档写入 output_dir 下的 `playbook-<时间戳>.yml`；同一秒内重名时追加 `-1`、`-2` ...
pub struct FileEditorHost {
    output_dir: PathBuf,
}

impl FileEditorHost {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

#[async_trait]
impl EditorHost for FileEditorHost {
    async fn open_document(&self, content: &str, language: &str) -> Result<(), WizardError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| WizardError::Editor(e.to_string()))?;
        let stem = format!("playbook-{}", chrono::Local::now().format("%Y%m%d-%H%M%S"));
        let path = write_new_file(&self.output_dir, &stem, content).await?;
        tracing::info!(language, "Opened playbook document at {}", path.display());
        Ok(())
    }

    fn show_error(&self, message: &str) {
        tracing::error!("{}", message);
        eprintln!("error: {message}");
    }
}

/// 以 create_new 写入，已存在时换下一个后缀
async fn write_new_file(dir: &Path, stem: &str, content: &str) -> Result<PathBuf, WizardError> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = match attempt {
            0 => format!("{stem}.yml"),
            n => format!("{stem}-{n}.yml"),
        };
        let path = dir.join(name);
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(WizardError::Editor(e.to_string())),
        };
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| WizardError::Editor(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| WizardError::Editor(e.to_string()))?;
        return Ok(path);
    }
    Err(WizardError::Editor(format!(
        "no free file name for {stem} in {}",
        dir.display()
    )))
}

/// 内容匹配通知写日志
#[derive(Debug, Default)]
pub struct LoggingContentMatches;

#[async_trait]
impl ContentMatchNotifier for LoggingContentMatches {
    async fn suggestion_accepted(&self, generation_id: &str, content: &str) -> Result<(), WizardError> {
        tracing::info!(generation_id, bytes = content.len(), "Content match requested");
        Ok(())
    }
}
