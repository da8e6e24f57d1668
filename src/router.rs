//! 面板消息路由
//!
//! 按 InboundMessage 类型分发到控制器、编排器与分类器，并把结果转成 OutboundMessage 或宿主副作用：
//! - **outline**: 无大纲时后台请求服务（返回 JoinHandle，不阻塞后续消息）；有大纲时原样回显
//! - **generateCode**: 无 playbook 时按大纲请求服务；随后渲染、推送 playbook、通知内容匹配
//! - **transition**: 页面跳转埋点
//! - **openEditor**: 打开新文档、CLOSE_ACCEPT、清空会话、销毁面板
//!
//! 异步结果只投递给发起请求的会话；期间面板被关闭或换成新会话时丢弃。
//! 处理过程中的意外故障在这里兜底：记日志并展示通用错误通知。

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::core::{WizardController, WizardError, UNKNOWN_ERROR};
use crate::generation::{ErrorClassifier, GenerationInput, GenerationOrchestrator};
use crate::host::{ContentMatchNotifier, CredentialProvider, EditorHost, Highlighter, Panel};
use crate::protocol::{GenerationPayload, GenerationResult, InboundMessage, OutboundMessage};

/// 未登录时的提示
pub const SIGN_IN_REQUIRED: &str = "Please sign in to generate playbooks.";

/// 路由依赖的宿主协作方
#[derive(Clone)]
pub struct Collaborators {
    pub credentials: Arc<dyn CredentialProvider>,
    pub editor: Arc<dyn EditorHost>,
    pub highlighter: Arc<dyn Highlighter>,
    pub content_matches: Arc<dyn ContentMatchNotifier>,
    /// 新文档的语言标识
    pub language: String,
}

pub struct MessageRouter {
    controller: Arc<WizardController>,
    orchestrator: GenerationOrchestrator,
    classifier: ErrorClassifier,
    host: Collaborators,
}

impl MessageRouter {
    pub fn new(
        controller: Arc<WizardController>,
        orchestrator: GenerationOrchestrator,
        classifier: ErrorClassifier,
        host: Collaborators,
    ) -> Self {
        Self {
            controller,
            orchestrator,
            classifier,
            host,
        }
    }

    pub fn controller(&self) -> &Arc<WizardController> {
        &self.controller
    }

    /// 分发一条面板消息；后台任务（大纲请求）的句柄会返回给调用方
    pub async fn dispatch(self: &Arc<Self>, message: InboundMessage) -> Option<JoinHandle<()>> {
        tracing::debug!(command = message.command(), "inbound message");
        match message {
            InboundMessage::Outline {
                text,
                outline,
                playbook,
                generation_id,
            } => match non_empty(outline) {
                Some(outline) => {
                    self.post(OutboundMessage::Outline {
                        outline: GenerationPayload {
                            playbook,
                            generation_id,
                            outline: Some(outline),
                        },
                    });
                    None
                }
                None => {
                    let router = Arc::clone(self);
                    Some(tokio::spawn(async move {
                        let result = router.request_outline(text, generation_id).await;
                        router.report(result);
                    }))
                }
            },
            InboundMessage::GenerateCode {
                text,
                playbook,
                generation_id,
                outline,
                dark_mode,
            } => {
                let result = self
                    .generate_code(text, playbook, generation_id, outline, dark_mode)
                    .await;
                self.report(result);
                None
            }
            InboundMessage::Transition { to_page } => {
                self.controller.transition(to_page);
                None
            }
            InboundMessage::OpenEditor { playbook } => {
                let result = self.open_editor(playbook).await;
                self.report(result);
                None
            }
        }
    }

    /// 请求大纲；失败时经过试用拦截，未处理的消息展示一次
    async fn request_outline(&self, text: String, generation_id: String) -> Result<(), WizardError> {
        let Some((panel, input)) = self.prepare(text, None, generation_id).await else {
            return Ok(());
        };

        let wizard_id = input.wizard_id.clone();
        let result = self.orchestrator.generate(panel, input).await;
        match &result {
            GenerationResult::Success(payload) => {
                self.post_for(
                    &wizard_id,
                    OutboundMessage::Outline {
                        outline: payload.clone(),
                    },
                );
            }
            GenerationResult::Failure(_) => {
                let classification = self.classifier.classify(&result).await;
                if let Some(message) = classification.user_message {
                    self.host.editor.show_error(&message);
                }
            }
        }
        Ok(())
    }

    /// 生成最终 playbook（此分支不做试用拦截），渲染后推送并通知内容匹配
    async fn generate_code(
        &self,
        text: String,
        playbook: Option<String>,
        generation_id: String,
        outline: String,
        dark_mode: bool,
    ) -> Result<(), WizardError> {
        let (wizard_id, playbook, generation_id) = match non_empty(playbook) {
            Some(playbook) => (self.controller.sessions().wizard_id(), playbook, generation_id),
            None => {
                let Some((panel, input)) =
                    self.prepare(text, Some(outline.clone()), generation_id).await
                else {
                    return Ok(());
                };
                let wizard_id = input.wizard_id.clone();
                match self.orchestrator.generate(panel, input).await {
                    GenerationResult::Success(GenerationPayload {
                        playbook: Some(playbook),
                        generation_id,
                        ..
                    }) => (Some(wizard_id), playbook, generation_id),
                    GenerationResult::Success(_) => {
                        tracing::warn!("Generation succeeded without a playbook");
                        self.host.editor.show_error(UNKNOWN_ERROR);
                        return Ok(());
                    }
                    GenerationResult::Failure(err) => {
                        self.host.editor.show_error(&err.user_message());
                        return Ok(());
                    }
                }
            }
        };

        let html = self.host.highlighter.render(&playbook, dark_mode)?;
        match wizard_id {
            Some(wizard_id) => self.post_for(
                &wizard_id,
                OutboundMessage::Playbook {
                    playbook: playbook.clone(),
                    generation_id: generation_id.clone(),
                    outline,
                    html,
                },
            ),
            None => tracing::debug!("Dropping playbook message: no active wizard session"),
        }
        self.host
            .content_matches
            .suggestion_accepted(&generation_id, &playbook)
            .await
    }

    /// 在新编辑器打开 playbook，然后接受并关闭会话
    async fn open_editor(&self, playbook: String) -> Result<(), WizardError> {
        self.host
            .editor
            .open_document(&playbook, &self.host.language)
            .await?;
        self.controller.accept();
        Ok(())
    }

    /// 取会话、面板与令牌；任何一项缺失都不调用编排器
    async fn prepare(
        &self,
        text: String,
        outline: Option<String>,
        generation_id: String,
    ) -> Option<(Arc<dyn Panel>, GenerationInput)> {
        let sessions = self.controller.sessions();
        let (Some(wizard_id), Some(panel)) = (sessions.wizard_id(), sessions.panel()) else {
            tracing::warn!("Generation ignored: no active wizard session");
            return None;
        };
        let Some(access_token) = self.host.credentials.access_token().await else {
            tracing::warn!("Generation skipped: no access token");
            self.host.editor.show_error(SIGN_IN_REQUIRED);
            return None;
        };
        Some((
            panel,
            GenerationInput {
                access_token,
                text,
                outline,
                generation_id,
                wizard_id,
            },
        ))
    }

    /// 推送到当前面板；无会话时丢弃
    fn post(&self, message: OutboundMessage) {
        match self.controller.sessions().panel() {
            Some(panel) => panel.post_message(message),
            None => tracing::debug!(?message, "Dropping outbound message: panel closed"),
        }
    }

    /// 仅当 wizard_id 仍是当前会话时推送；请求期间会话已关闭或被替换则丢弃
    fn post_for(&self, wizard_id: &str, message: OutboundMessage) {
        match self.controller.sessions().panel_for(wizard_id) {
            Some(panel) => panel.post_message(message),
            None => tracing::debug!(
                wizard_id,
                ?message,
                "Dropping outbound message: originating session closed"
            ),
        }
    }

    fn report(&self, result: Result<(), WizardError>) {
        if let Err(e) = result {
            tracing::error!("Wizard message handler failed: {}", e);
            self.host.editor.show_error(UNKNOWN_ERROR);
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
