//! 核心层：错误类型、会话存储与页面状态机、向导控制器

pub mod controller;
pub mod error;
pub mod session;

pub use controller::WizardController;
pub use error::{GenerationError, GenerationErrorKind, WizardError, UNKNOWN_ERROR};
pub use session::{ActiveSession, SessionStore, FIRST_PAGE};
