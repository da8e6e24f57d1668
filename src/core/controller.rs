//! 向导控制器：面板单例生命周期与页面迁移
//!
//! 负责：打开（或前置已有）面板、页面跳转、接受关闭（CLOSE_ACCEPT）、外部销毁（CLOSE_CANCEL），
//! 并在每次迁移后通过 ActionEmitter 上报。

use std::sync::Arc;

use crate::core::{SessionStore, WizardError};
use crate::host::PanelHost;
use crate::protocol::OutboundMessage;
use crate::telemetry::{ActionEmitter, ActionKind};

pub struct WizardController {
    sessions: SessionStore,
    panels: Arc<dyn PanelHost>,
    emitter: ActionEmitter,
}

impl WizardController {
    pub fn new(panels: Arc<dyn PanelHost>, emitter: ActionEmitter) -> Self {
        Self {
            sessions: SessionStore::new(),
            panels,
            emitter,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// 打开向导；已有会话时只前置显示现有面板。返回当前会话的 wizard_id
    pub fn open(&self) -> Result<String, WizardError> {
        if let Some(panel) = self.sessions.panel() {
            tracing::info!("Wizard panel already open, revealing");
            panel.reveal();
            return self
                .sessions
                .wizard_id()
                .ok_or_else(|| WizardError::Panel("session closed while revealing".into()));
        }

        // 面板创建时即绑定 wizard_id，销毁回调据此识别所属会话
        let wizard_id = uuid::Uuid::new_v4().to_string();
        let panel = self.panels.create_panel(&wizard_id)?;
        match self.sessions.begin(wizard_id.clone(), panel.clone()) {
            Ok(event) => {
                tracing::info!(wizard_id = %wizard_id, "Wizard session opened");
                panel.post_message(OutboundMessage::Init);
                self.emitter.emit(event);
                Ok(wizard_id)
            }
            Err(existing) => {
                panel.dispose();
                existing.reveal();
                self.sessions
                    .wizard_id()
                    .ok_or_else(|| WizardError::Panel("session closed while revealing".into()))
            }
        }
    }

    /// 页面跳转；无会话时忽略
    pub fn transition(&self, to_page: u32) {
        match self.sessions.transition(to_page) {
            Some(event) => self.emitter.emit(event),
            None => tracing::warn!(to_page, "Transition ignored: no active wizard session"),
        }
    }

    /// 接受并关闭：先同步清空会话，再上报 CLOSE_ACCEPT，最后销毁面板
    ///
    /// 返回 false 表示会话已不存在。
    pub fn accept(&self) -> bool {
        let Some((event, panel)) = self.sessions.close(ActionKind::CloseAccept) else {
            tracing::warn!("Accept ignored: no active wizard session");
            return false;
        };
        tracing::info!(wizard_id = %event.wizard_id, "Wizard session accepted");
        self.emitter.emit(event);
        panel.dispose();
        true
    }

    /// 宿主在面板销毁后调用；该面板的会话仍在时视为用户取消（CLOSE_CANCEL）
    ///
    /// wizard_id 与当前会话不符（旧面板迟到的回调）时忽略。
    pub fn panel_disposed(&self, wizard_id: &str) {
        match self.sessions.close_matching(wizard_id, ActionKind::CloseCancel) {
            Some((event, _)) => {
                tracing::info!(wizard_id = %event.wizard_id, "Wizard panel closed without accept");
                self.emitter.emit(event);
            }
            None => tracing::debug!(wizard_id, "Panel disposed after its session closed"),
        }
    }

    /// 等待已排队的埋点事件交付
    pub async fn flush_telemetry(&self) {
        self.emitter.flush().await;
    }
}
