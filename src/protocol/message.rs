//! 面板消息协议定义
//!
//! 面板 -> 控制器（InboundMessage）与控制器 -> 面板（OutboundMessage）统一以 `command` 字段区分类型。

use serde::{Deserialize, Serialize};

use super::generation::GenerationPayload;

/// 面板发往控制器的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum InboundMessage {
    /// 请求生成大纲；outline 非空时为回显（不调用服务）
    #[serde(rename_all = "camelCase")]
    Outline {
        text: String,
        #[serde(default)]
        outline: Option<String>,
        #[serde(default)]
        playbook: Option<String>,
        #[serde(default)]
        generation_id: String,
    },

    /// 由大纲生成最终 playbook；playbook 非空时直接展示
    #[serde(rename_all = "camelCase")]
    GenerateCode {
        #[serde(default)]
        text: String,
        #[serde(default)]
        playbook: Option<String>,
        #[serde(default)]
        generation_id: String,
        outline: String,
        #[serde(default)]
        dark_mode: bool,
    },

    /// 页面跳转
    #[serde(rename_all = "camelCase")]
    Transition { to_page: u32 },

    /// 接受结果：在新编辑器中打开并关闭面板
    OpenEditor { playbook: String },
}

impl InboundMessage {
    /// 消息类型名（用于日志）
    pub fn command(&self) -> &'static str {
        match self {
            InboundMessage::Outline { .. } => "outline",
            InboundMessage::GenerateCode { .. } => "generateCode",
            InboundMessage::Transition { .. } => "transition",
            InboundMessage::OpenEditor { .. } => "openEditor",
        }
    }
}

/// 控制器发往面板的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum OutboundMessage {
    Init,
    StartSpinner,
    StopSpinner,
    /// 大纲就绪（载荷原样来自服务或回显）
    Outline { outline: GenerationPayload },
    /// playbook 就绪：原文、高亮 HTML、大纲与生成 ID
    #[serde(rename_all = "camelCase")]
    Playbook {
        playbook: String,
        generation_id: String,
        outline: String,
        html: String,
    },
}
