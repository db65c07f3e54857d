//! 交互历史：会话期间只追加、不修改的记录序列
//!
//! 存储不设上限，但拼入助手上下文时只取最近 `window` 条（按追加顺序，不重排）。
//! 每条记录可渲染为 user / assistant 消息，供 converse 请求使用。

use serde::Serialize;

use crate::memory::Message;
use crate::tools::ExecutionResult;

/// 拼入上下文的默认条数
pub const DEFAULT_CONTEXT_WINDOW: usize = 5;

/// 单条历史记录；追加后不可变
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntry {
    /// EXECUTE 模式下用户直接执行的命令
    DirectExecution { result: ExecutionResult },
    /// 助手提议、用户确认后执行的命令
    AssistedExecution {
        user_query: String,
        result: ExecutionResult,
    },
    /// 助手以文本回复（含后端错误文本）
    AssistantReply { user_query: String, text: String },
    /// 用户拒绝了助手提议的命令
    ProposalCancelled {
        user_query: String,
        proposed_command: String,
    },
    /// 自动纠错执行；不再触发诊断
    CorrectionAttempt { result: ExecutionResult },
    /// 用户拒绝了自动纠错建议
    CorrectionDeclined { proposed_command: String },
}

impl HistoryEntry {
    /// 渲染为发给助手的消息（先 user 侧，再 assistant 侧）
    pub fn to_messages(&self) -> Vec<Message> {
        match self {
            HistoryEntry::DirectExecution { result } => vec![Message::user(format!(
                "User (EXECUTE CMD:{}):{}",
                result.command,
                render_outcome(result)
            ))],
            HistoryEntry::AssistedExecution { user_query, result } => vec![
                Message::user(format!("User (ASK): {user_query}")),
                Message::assistant(format!(
                    "Assistant (CMD:{}):{}",
                    result.command,
                    render_outcome(result)
                )),
            ],
            HistoryEntry::AssistantReply { user_query, text } => vec![
                Message::user(format!("User (ASK): {user_query}")),
                Message::assistant(format!("Assistant (TEXT): {text}")),
            ],
            HistoryEntry::ProposalCancelled {
                user_query,
                proposed_command,
            } => vec![
                Message::user(format!("User (ASK): {user_query}")),
                Message::assistant(format!(
                    "Assistant: (Action cancelled by user: Proposal was 'CMD:{proposed_command}')"
                )),
            ],
            HistoryEntry::CorrectionAttempt { result } => vec![Message::assistant(format!(
                "Assistant (CORRECTION CMD:{}):{}",
                result.command,
                render_outcome(result)
            ))],
            HistoryEntry::CorrectionDeclined { proposed_command } => {
                vec![Message::assistant(format!(
                    "Assistant: (Proposed correction refused by user: 'CMD:{proposed_command}')"
                ))]
            }
        }
    }

    /// 是否由一次用户内容输入直接产生（纠错相关条目不是）
    pub fn is_content_turn(&self) -> bool {
        !matches!(
            self,
            HistoryEntry::CorrectionAttempt { .. } | HistoryEntry::CorrectionDeclined { .. }
        )
    }
}

/// stdout / stderr 为空时省略对应段落，最后附上返回码
fn render_outcome(result: &ExecutionResult) -> String {
    let mut s = String::new();
    let stdout = result.stdout.trim();
    if !stdout.is_empty() {
        s.push_str(&format!("\nOutput:\n```\n{stdout}\n```"));
    }
    let stderr = result.stderr.trim();
    if !stderr.is_empty() {
        s.push_str(&format!("\nErrors:\n```\n{stderr}\n```"));
    }
    s.push_str(&format!("\nReturn Code: {}", result.exit_code));
    s
}

/// 历史缓冲：只追加；`window()` 返回最近 N 条
#[derive(Clone, Debug)]
pub struct HistoryBuffer {
    entries: Vec<HistoryEntry>,
    window: usize,
}

impl HistoryBuffer {
    pub fn new(window: usize) -> Self {
        Self {
            entries: Vec::new(),
            window,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        tracing::debug!(len = self.entries.len() + 1, "history append");
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// 最近 min(window, len) 条，保持追加顺序
    pub fn window(&self) -> &[HistoryEntry] {
        let start = self.entries.len().saturating_sub(self.window);
        &self.entries[start..]
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Role;

    fn direct(cmd: &str) -> HistoryEntry {
        HistoryEntry::DirectExecution {
            result: ExecutionResult::new(cmd, "", "", 0),
        }
    }

    #[test]
    fn test_window_keeps_most_recent_in_order() {
        let mut buf = HistoryBuffer::default();
        for i in 0..8 {
            buf.push(direct(&format!("echo {i}")));
        }
        assert_eq!(buf.len(), 8);
        let window = buf.window();
        assert_eq!(window.len(), DEFAULT_CONTEXT_WINDOW);
        assert_eq!(window[0], direct("echo 3"));
        assert_eq!(window[4], direct("echo 7"));
    }

    #[test]
    fn test_window_shorter_than_limit() {
        let mut buf = HistoryBuffer::new(5);
        assert!(buf.window().is_empty());
        buf.push(direct("ls"));
        buf.push(direct("pwd"));
        assert_eq!(buf.window(), buf.entries());
    }

    #[test]
    fn test_render_omits_empty_streams() {
        let entry = HistoryEntry::DirectExecution {
            result: ExecutionResult::new("false", "", "", 1),
        };
        let msgs = entry.to_messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].content, "User (EXECUTE CMD:false):\nReturn Code: 1");
    }

    #[test]
    fn test_render_assisted_execution() {
        let entry = HistoryEntry::AssistedExecution {
            user_query: "list files".into(),
            result: ExecutionResult::new("ls", "a.txt\nb.txt", "", 0),
        };
        let msgs = entry.to_messages();
        assert_eq!(msgs[0].role, Role::User);
        assert_eq!(msgs[0].content, "User (ASK): list files");
        assert_eq!(msgs[1].role, Role::Assistant);
        assert!(msgs[1].content.starts_with("Assistant (CMD:ls):\nOutput:\n```\na.txt\nb.txt\n```"));
        assert!(msgs[1].content.ends_with("Return Code: 0"));
        assert!(!msgs[1].content.contains("Errors:"));
    }

    #[test]
    fn test_render_cancelled_proposal() {
        let entry = HistoryEntry::ProposalCancelled {
            user_query: "wipe it".into(),
            proposed_command: "rm -rf build".into(),
        };
        let msgs = entry.to_messages();
        assert!(msgs[1].content.contains("Proposal was 'CMD:rm -rf build'"));
    }

    #[test]
    fn test_correction_entries_are_not_content_turns() {
        assert!(direct("ls").is_content_turn());
        assert!(!HistoryEntry::CorrectionDeclined {
            proposed_command: "true".into()
        }
        .is_content_turn());
    }
}
