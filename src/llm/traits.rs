//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Gemini / Mock）实现 LlmClient::complete。
//! 错误以 LlmError 返回，由助手网关统一转换为 Reply::BackendError，不会越过网关边界。

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::Message;

/// 后端调用失败的分类
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// 配额耗尽（如 Gemini RESOURCE_EXHAUSTED / HTTP 429）
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error: {0}")]
    ApiError(String),

    /// 后端返回空内容（常见于安全拦截）
    #[error("Empty response")]
    EmptyResponse,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl LlmError {
    /// 按错误文本归类：配额类优先，其次连接类，其余视为 API 错误
    pub fn classify(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let lower = raw.to_lowercase();
        if lower.contains("resource_exhausted")
            || lower.contains("resource has been exhausted")
            || lower.contains("quota")
            || lower.contains("429")
        {
            LlmError::QuotaExceeded(raw)
        } else if lower.contains("connect") || lower.contains("dns") || lower.contains("reqwest") {
            LlmError::Transport(raw)
        } else {
            LlmError::ApiError(raw)
        }
    }
}

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 发送消息序列，返回首条回复文本
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
