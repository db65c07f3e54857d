//! 命令执行契约
//!
//! ProcessExecutor::run 总是返回 ExecutionResult，从不返回错误：无法启动进程等内部失败
//! 被映射为哨兵退出码 -1，错误说明作为唯一的 stderr 内容。
//! ExecutionRecord 在结果上附带来源（直接 / 助手 / 纠错），纠错结果不再进入诊断。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ui::{EventSink, SessionEvent};

/// 内部执行失败时使用的退出码
pub const SPAWN_FAILURE_EXIT_CODE: i32 = -1;

/// 一次命令执行的结果
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn new(
        command: impl Into<String>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        exit_code: i32,
    ) -> Self {
        Self {
            command: command.into(),
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// 执行器内部失败（如无法启动进程）
    pub fn internal_failure(command: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::new(
            command,
            "",
            format!("Error executing command: {cause}"),
            SPAWN_FAILURE_EXIT_CODE,
        )
    }

    /// 退出码非 0 或 stderr 非空即视为失败
    pub fn failed(&self) -> bool {
        self.exit_code != 0 || !self.stderr.is_empty()
    }
}

/// 执行来源
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOrigin {
    /// EXECUTE 模式下的用户输入
    Direct,
    /// 助手提议并经确认
    Assisted,
    /// 诊断后的自动纠错
    Correction,
}

/// 带来源标记的执行记录
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExecutionRecord {
    pub origin: ExecutionOrigin,
    pub result: ExecutionResult,
}

impl ExecutionRecord {
    pub fn new(origin: ExecutionOrigin, result: ExecutionResult) -> Self {
        Self { origin, result }
    }

    /// 纠错结果永远不会再被诊断
    pub fn eligible_for_diagnosis(&self) -> bool {
        self.origin != ExecutionOrigin::Correction && self.result.failed()
    }
}

/// 命令执行器：运行命令行，输出逐行推给 sink，结束后返回完整结果
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    async fn run(&self, command: &str, sink: &dyn EventSink) -> ExecutionResult;
}

/// 预置结果执行器（用于测试，不启动进程）
///
/// 按顺序为每次 run 返回预置的 (stdout, stderr, exit_code)，命令名取实际传入值；
/// 队列耗尽后返回成功的空结果。记录每次收到的命令。
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    outcomes: Mutex<VecDeque<(String, String, i32)>>,
    commands: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcome(self, stdout: &str, stderr: &str, exit_code: i32) -> Self {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push_back((stdout.to_string(), stderr.to_string(), exit_code));
        }
        self
    }

    /// 已执行的命令（按顺序）
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ProcessExecutor for ScriptedExecutor {
    async fn run(&self, command: &str, sink: &dyn EventSink) -> ExecutionResult {
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command.to_string());
        }
        sink.emit(SessionEvent::CommandStarted {
            command: command.to_string(),
        });
        let (stdout, stderr, exit_code) = self
            .outcomes
            .lock()
            .ok()
            .and_then(|mut outcomes| outcomes.pop_front())
            .unwrap_or_default();
        sink.emit(SessionEvent::CommandFinished { exit_code });
        ExecutionResult::new(command, stdout, stderr, exit_code)
    }
}
