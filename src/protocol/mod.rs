//! 面板与生成服务之间的消息协议

pub mod generation;
pub mod message;

pub use generation::{GenerationPayload, GenerationRequest, GenerationResult, GENERATION_METHOD};
pub use message::{InboundMessage, OutboundMessage};
