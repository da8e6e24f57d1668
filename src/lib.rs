//! playbook-wizard - Playbook 生成向导控制器
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、会话存储与页面状态机、向导控制器
//! - **generation**: 远端传输、生成请求编排、错误分类与试用拦截
//! - **host**: 宿主协作方抽象（面板、编辑器、凭据、高亮、内容匹配）与 stdio 实现
//! - **observability**: tracing 初始化
//! - **protocol**: 面板消息与生成服务请求 / 响应
//! - **router**: 面板消息路由
//! - **telemetry**: 会话动作埋点

pub mod config;
pub mod core;
pub mod generation;
pub mod host;
pub mod observability;
pub mod protocol;
pub mod router;
pub mod telemetry;

pub use crate::core::{WizardController, WizardError};
pub use router::{Collaborators, MessageRouter};
