//! 助手回复：网关边界上的标签化解码
//!
//! 线上约定：以 `CMD:` 开头的回复是命令提议，其余部分（trim 后）即命令行；
//! 以 `[AI_ERROR]` 开头的回复是后端错误；其余为自由文本。
//! 解码只在网关发生，控制器只对 Reply 做模式匹配，不接触原始字符串。

use serde::Serialize;

/// 命令提议前缀
pub const COMMAND_MARKER: &str = "CMD:";
/// 后端错误前缀（保留字）
pub const BACKEND_ERROR_MARKER: &str = "[AI_ERROR]";

/// 网关发出的请求类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Converse,
    Explain,
    Diagnose,
}

/// 助手回复
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Reply {
    /// 自然语言文本
    Text(String),
    /// 命令提议（已去掉前缀并 trim）
    CommandProposal(String),
    /// 后端错误（已去掉前缀）
    BackendError(String),
}

impl Reply {
    /// 按前缀约定解码原始回复
    pub fn decode(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix(BACKEND_ERROR_MARKER) {
            return Reply::BackendError(rest.trim().to_string());
        }
        if let Some(rest) = raw.strip_prefix(COMMAND_MARKER) {
            let command = rest.trim();
            if command.is_empty() {
                return Reply::BackendError("The assistant proposed an empty command.".to_string());
            }
            return Reply::CommandProposal(command.to_string());
        }
        Reply::Text(raw.to_string())
    }

    pub fn is_backend_error(&self) -> bool {
        matches!(self, Reply::BackendError(_))
    }
}
