//! 向导错误类型
//!
//! WizardError 表示处理过程中的「故障」（传输、协作方、配置）；GenerationError 是生成服务返回的
//! 类型化失败，作为数据返回给调用方，由 Router 与 ErrorClassifier 决定如何提示用户。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 错误消息为空时向用户展示的固定文案
pub const UNKNOWN_ERROR: &str = "An unknown error occurred.";

/// 向导运行过程中可能出现的故障（网络、远端、协作方、配置等）
#[derive(Error, Debug)]
pub enum WizardError {
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON-RPC 层返回的 error 对象
    #[error("Remote error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),

    #[error("Editor error: {0}")]
    Editor(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Panel error: {0}")]
    Panel(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 生成失败的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    /// 服务端返回的错误体
    Remote,
    /// 传输层失败（网络、超时、JSON-RPC error）
    Transport,
    /// 响应既不是错误体也无法解析为成功载荷
    Malformed,
    /// 试用已过期 / 需要申请试用（由 TrialPolicy 重映射）
    TrialRequired,
}

/// 类型化的生成失败：kind + 可选错误码 + 消息 + 可选补救信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub code: Option<String>,
    pub message: String,
    pub detail: Option<serde_json::Value>,
}

impl GenerationError {
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            detail: None,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Transport, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// 展示给用户的消息；空消息回退为 UNKNOWN_ERROR
    pub fn user_message(&self) -> String {
        if self.message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            self.message.clone()
        }
    }
}
