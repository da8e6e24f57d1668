//! 错误分类与试用拦截
//!
//! 失败结果先交给 TrialPolicy 重映射，再尝试弹出试用提示；提示未处理时返回需要展示的消息。

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::GenerationError;
use crate::protocol::GenerationResult;

/// 试用策略：重映射错误、尝试弹出专用提示（返回是否已完全处理）
#[async_trait]
pub trait TrialPolicy: Send + Sync {
    fn map_error(&self, error: GenerationError) -> GenerationError;

    async fn show_popup(&self, error: &GenerationError) -> bool;
}

/// 不做试用拦截：原样返回，弹窗从不处理
#[derive(Debug, Default)]
pub struct NoTrialPolicy;

#[async_trait]
impl TrialPolicy for NoTrialPolicy {
    fn map_error(&self, error: GenerationError) -> GenerationError {
        error
    }

    async fn show_popup(&self, _error: &GenerationError) -> bool {
        false
    }
}

/// 分类结果：handled 表示弹窗已处理；user_message 为仍需展示的消息（不为空）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub handled: bool,
    pub user_message: Option<String>,
}

pub struct ErrorClassifier {
    policy: Arc<dyn TrialPolicy>,
}

impl ErrorClassifier {
    pub fn new(policy: Arc<dyn TrialPolicy>) -> Self {
        Self { policy }
    }

    pub async fn classify(&self, result: &GenerationResult) -> Classification {
        let GenerationResult::Failure(err) = result else {
            return Classification::default();
        };

        let mapped = self.policy.map_error(err.clone());
        if mapped.kind != err.kind {
            tracing::info!(from = ?err.kind, to = ?mapped.kind, "Generation error remapped by trial policy");
        }
        if self.policy.show_popup(&mapped).await {
            return Classification {
                handled: true,
                user_message: None,
            };
        }
        Classification {
            handled: false,
            user_message: Some(mapped.user_message()),
        }
    }
}
