//! 会话事件
//!
//! 控制器与执行器把所有可见输出表达为 SessionEvent，经 EventSink 交给终端渲染（或测试记录器）。
//! 每个事件是一次原子输出：一行命令输出不会被另一路输出截断。

use serde::Serialize;

use crate::assistant::RequestKind;
use crate::core::Mode;

/// 命令输出来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// 会话过程事件（可序列化为 JSON，便于日志与测试断言）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// 模式切换
    ModeChanged { mode: Mode },
    /// 详细模式开关
    VerbosityChanged { verbose: bool },
    /// 清屏并重新显示横幅
    ClearScreen,
    /// 输入阶段收到 Ctrl+C
    InputInterrupted,
    /// 开始执行命令
    CommandStarted { command: String },
    /// 一行命令输出
    OutputLine { stream: OutputStream, line: String },
    /// 命令结束
    CommandFinished { exit_code: i32 },
    /// 命令运行中收到 Ctrl+C（命令继续运行）
    CommandStillRunning,
    /// 正在等待助手
    Thinking { activity: String },
    /// 助手文本回复
    AssistantText { text: String },
    /// 助手提议命令，等待确认
    Proposal { command: String },
    /// 用户取消了提议
    ProposalCancelled,
    /// 执行失败，开始诊断
    AnalyzingFailure,
    /// 诊断给出纠错命令
    CorrectionSuggested,
    /// 纠错命令也失败了
    CorrectionFailed,
    /// 诊断文本（无纠错命令）
    Analysis { text: String },
    /// 成功执行后的解释
    Explanation { text: String },
    /// 后端错误；request 标明来自哪类请求
    BackendError { request: RequestKind, text: String },
    /// 会话结束
    Goodbye,
}

/// 事件接收端：终端渲染器或测试记录器
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SessionEvent);
}

/// 记录所有事件（测试与无界面场景用）
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: std::sync::Mutex<Vec<SessionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: SessionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
