//! 宿主协作方抽象
//!
//! 面板、编辑器、凭据、高亮、内容匹配均由宿主提供；控制器只依赖这些 trait。
//! - **Panel / PanelHost**: 面板实例与创建（单例由 SessionStore 保证）
//! - **EditorHost**: 打开新文档、展示错误通知
//! - **CredentialProvider**: 访问令牌
//! - **Highlighter**: playbook 渲染为 HTML 预览
//! - **ContentMatchNotifier**: 接受建议后的内容 / 训练匹配通知

pub mod highlight;
pub mod stdio;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::WizardError;
use crate::protocol::OutboundMessage;

pub use highlight::SyntectHighlighter;

/// 面板实例：投递消息、前置显示、销毁
///
/// 方法均为同步且不可失败（投递失败由实现方自行记录），以便在 Drop 中停止 spinner。
/// 销毁后宿主负责以面板的 wizard_id 调用 `WizardController::panel_disposed`。
pub trait Panel: Send + Sync {
    fn post_message(&self, message: OutboundMessage);

    fn reveal(&self);

    fn dispose(&self);
}

/// 面板工厂
///
/// 面板与创建它的 wizard_id 绑定；宿主报告销毁时须带上该 ID。
pub trait PanelHost: Send + Sync {
    fn create_panel(&self, wizard_id: &str) -> Result<Arc<dyn Panel>, WizardError>;
}

/// 编辑器：打开新文档、展示非阻塞错误通知
#[async_trait]
pub trait EditorHost: Send + Sync {
    async fn open_document(&self, content: &str, language: &str) -> Result<(), WizardError>;

    fn show_error(&self, message: &str);
}

/// 访问令牌提供方；None 表示未登录
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Option<String>;
}

/// playbook 高亮渲染
pub trait Highlighter: Send + Sync {
    fn render(&self, code: &str, dark_mode: bool) -> Result<String, WizardError>;
}

/// 建议被接受后通知内容匹配 / 训练匹配（按生成 ID 关联）
#[async_trait]
pub trait ContentMatchNotifier: Send + Sync {
    async fn suggestion_accepted(&self, generation_id: &str, content: &str) -> Result<(), WizardError>;
}

/// 固定令牌（来自配置）
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(pub Option<String>);

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn access_token(&self) -> Option<String> {
        self.0.clone().filter(|t| !t.is_empty())
    }
}
