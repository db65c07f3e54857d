//! 核心层：错误、会话状态、控制指令识别、会话控制器

pub mod control;
pub mod controller;
pub mod error;
pub mod state;

pub use control::{classify, ControlToken, Turn};
pub use controller::{SessionController, TurnOutcome};
pub use error::SessionError;
pub use state::{Mode, SessionPhase, SessionState};
