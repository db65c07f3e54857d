//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 按顺序返回预置回复（文本或错误），并记录每次请求的消息，便于断言上下文窗口与提示内容。
//! 队列耗尽后返回 EmptyResponse。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError};
use crate::memory::Message;

/// 预置回复客户端
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条文本回复
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// 追加一次失败
    pub fn fail(self, err: LlmError) -> Self {
        self.push(Err(err));
        self
    }

    pub fn push(&self, reply: Result<String, LlmError>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    /// 已收到的全部请求（按调用顺序）
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_empty() {
        let client = ScriptedLlmClient::new()
            .reply("first")
            .fail(LlmError::Timeout(5));
        let msgs = vec![Message::user("hi")];
        assert_eq!(client.complete(&msgs).await, Ok("first".to_string()));
        assert_eq!(client.complete(&msgs).await, Err(LlmError::Timeout(5)));
        assert_eq!(client.complete(&msgs).await, Err(LlmError::EmptyResponse));
        assert_eq!(client.call_count(), 3);
        assert_eq!(client.requests()[0], msgs);
    }
}
