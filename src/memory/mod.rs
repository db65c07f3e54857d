//! 记忆层：会话交互历史（只追加）与发给 LLM 的消息格式

pub mod conversation;
pub mod history;

pub use conversation::{Message, Role};
pub use history::{HistoryBuffer, HistoryEntry, DEFAULT_CONTEXT_WINDOW};
