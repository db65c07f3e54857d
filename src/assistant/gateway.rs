//! 助手网关：converse / explain / diagnose 三种请求
//!
//! 网关不持有会话状态；每次请求由调用方传入窗口化历史与执行记录。
//! 所有后端失败（配额、网络、超时、空响应）在这里被归一化为 Reply::BackendError，
//! 控制器永远不会收到原始错误。

use std::sync::Arc;

use crate::assistant::prompt::{diagnose_prompt, explain_prompt, COMMAND_ONLY_INSTRUCTION};
use crate::assistant::{Reply, RequestKind, SystemContext};
use crate::llm::{LlmClient, LlmError};
use crate::memory::{HistoryEntry, Message};
use crate::tools::ExecutionResult;

/// 助手网关：持有 LLM 客户端与启动时构建的系统上下文
pub struct AssistantGateway {
    llm: Arc<dyn LlmClient>,
    context: SystemContext,
}

impl AssistantGateway {
    pub fn new(llm: Arc<dyn LlmClient>, context: SystemContext) -> Self {
        Self { llm, context }
    }

    pub fn context(&self) -> &SystemContext {
        &self.context
    }

    /// 对话请求：系统上下文 + 窗口化历史 + 本次问题；verbose 关闭时要求只回 CMD:
    pub async fn converse(&self, window: &[HistoryEntry], query: &str, verbose: bool) -> Reply {
        let messages = self.converse_messages(window, query, verbose);
        self.request(RequestKind::Converse, &messages).await
    }

    /// 解释一次成功执行；不携带历史。命令提议不是预期回复，按原文显示
    pub async fn explain(&self, result: &ExecutionResult) -> Reply {
        let messages = vec![
            Message::system(self.context.prompt.clone()),
            Message::user(explain_prompt(result)),
        ];
        match self.request(RequestKind::Explain, &messages).await {
            Reply::CommandProposal(command) => Reply::Text(format!("CMD:{command}")),
            other => other,
        }
    }

    /// 诊断一次失败执行；可能返回纠错命令提议
    pub async fn diagnose(&self, result: &ExecutionResult) -> Reply {
        let messages = vec![
            Message::system(self.context.prompt.clone()),
            Message::user(diagnose_prompt(result)),
        ];
        self.request(RequestKind::Diagnose, &messages).await
    }

    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    fn converse_messages(&self, window: &[HistoryEntry], query: &str, verbose: bool) -> Vec<Message> {
        let mut messages = vec![Message::system(self.context.prompt.clone())];
        messages.extend(window.iter().flat_map(HistoryEntry::to_messages));
        messages.push(Message::user(format!("User (ASK): {query}")));
        if !verbose {
            messages.push(Message::system(COMMAND_ONLY_INSTRUCTION));
        }
        messages
    }

    async fn request(&self, kind: RequestKind, messages: &[Message]) -> Reply {
        match self.llm.complete(messages).await {
            Ok(raw) => Reply::decode(&raw),
            Err(e) => {
                tracing::warn!(request = ?kind, error = %e, "assistant backend call failed");
                Reply::BackendError(backend_error_message(kind, &e))
            }
        }
    }
}

/// 面向用户的错误文本（按请求类型区分）
fn backend_error_message(kind: RequestKind, err: &LlmError) -> String {
    match (kind, err) {
        (RequestKind::Converse, LlmError::QuotaExceeded(_)) => {
            "Google Gemini API quota exceeded. Please check your plan and billing details.".into()
        }
        (RequestKind::Explain, LlmError::QuotaExceeded(_)) => {
            "Google Gemini API quota exceeded for explanation.".into()
        }
        (RequestKind::Diagnose, LlmError::QuotaExceeded(_)) => {
            "Google Gemini API quota exceeded for error analysis.".into()
        }
        (RequestKind::Converse, LlmError::EmptyResponse) => {
            "Sorry, I could not generate a response. Check for potential safety blocks.".into()
        }
        (RequestKind::Explain, LlmError::EmptyResponse) => "Could not get an explanation.".into(),
        (RequestKind::Diagnose, LlmError::EmptyResponse) => "Could not analyze the error.".into(),
        (_, LlmError::Timeout(secs)) => format!("The AI did not answer within {secs}s."),
        (RequestKind::Converse, _) => "Communication error with AI.".into(),
        (RequestKind::Explain, _) => "Communication error for explanation.".into(),
        (RequestKind::Diagnose, _) => "Communication error for error analysis.".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlmClient;
    use crate::memory::Role;

    fn gateway(client: Arc<ScriptedLlmClient>) -> AssistantGateway {
        AssistantGateway::new(client, SystemContext::for_os("linux"))
    }

    #[tokio::test]
    async fn test_converse_builds_context_in_order() {
        let client = Arc::new(ScriptedLlmClient::new().reply("CMD:ls -l"));
        let gw = gateway(client.clone());
        let window = vec![HistoryEntry::DirectExecution {
            result: ExecutionResult::new("pwd", "/tmp", "", 0),
        }];

        let reply = gw.converse(&window, "list files", true).await;
        assert_eq!(reply, Reply::CommandProposal("ls -l".into()));

        let sent = &client.requests()[0];
        assert_eq!(sent[0].role, Role::System);
        assert!(sent[1].content.starts_with("User (EXECUTE CMD:pwd):"));
        assert_eq!(sent.last().map(|m| m.content.as_str()), Some("User (ASK): list files"));
    }

    #[tokio::test]
    async fn test_converse_quiet_adds_command_only_instruction() {
        let client = Arc::new(ScriptedLlmClient::new().reply("CMD:ls"));
        let gw = gateway(client.clone());
        gw.converse(&[], "list files", false).await;

        let sent = &client.requests()[0];
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2], Message::system(COMMAND_ONLY_INSTRUCTION));
    }

    #[tokio::test]
    async fn test_quota_failure_is_normalized() {
        let client = Arc::new(
            ScriptedLlmClient::new().fail(LlmError::QuotaExceeded("RESOURCE_EXHAUSTED".into())),
        );
        let reply = gateway(client).converse(&[], "hello", true).await;
        assert_eq!(
            reply,
            Reply::BackendError(
                "Google Gemini API quota exceeded. Please check your plan and billing details.".into()
            )
        );
    }

    #[tokio::test]
    async fn test_explain_has_no_history_and_never_proposes() {
        let client = Arc::new(ScriptedLlmClient::new().reply("CMD:rm -rf /"));
        let gw = gateway(client.clone());
        let reply = gw.explain(&ExecutionResult::new("echo hi", "hi", "", 0)).await;
        assert_eq!(reply, Reply::Text("CMD:rm -rf /".into()));
        assert_eq!(client.requests()[0].len(), 2);
    }

    #[tokio::test]
    async fn test_diagnose_errors_use_diagnose_wording() {
        let client = Arc::new(ScriptedLlmClient::new().fail(LlmError::Transport("refused".into())));
        let reply = gateway(client).diagnose(&ExecutionResult::new("false", "", "", 1)).await;
        assert_eq!(reply, Reply::BackendError("Communication error for error analysis.".into()));
    }

    #[tokio::test]
    async fn test_backend_error_marker_in_text_is_decoded() {
        let client = Arc::new(ScriptedLlmClient::new().reply("[AI_ERROR] upstream hiccup"));
        let reply = gateway(client).converse(&[], "hello", true).await;
        assert_eq!(reply, Reply::BackendError("upstream hiccup".into()));
    }
}
