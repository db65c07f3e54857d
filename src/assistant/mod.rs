//! 助手网关层：回复解码（reply）、提示词（prompt）、三种请求（gateway）

pub mod gateway;
pub mod prompt;
pub mod reply;

pub use gateway::AssistantGateway;
pub use prompt::{SystemContext, COMMAND_ONLY_INSTRUCTION};
pub use reply::{Reply, RequestKind, BACKEND_ERROR_MARKER, COMMAND_MARKER};
