//! Shell 执行器：sh -c / cmd /C 运行命令，stdout 与 stderr 逐行流式显示
//!
//! 两路输出各由一个读取任务转发到同一个通道，主循环逐行 emit，保证行原子性。
//! Ctrl+C 由进程级的 InterruptSignal 统一接管（启动时安装一次）：命令运行期间只提示，
//! 等待助手回复期间忽略，任何时候都不终止会话；子进程照常收到终端的 SIGINT。
//! 可选超时到期时杀掉子进程并返回 -1。

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, Notify};

use crate::tools::{ExecutionResult, ProcessExecutor, SPAWN_FAILURE_EXIT_CODE};
use crate::ui::{EventSink, OutputStream, SessionEvent};

/// 进程级 Ctrl+C 通知
///
/// `install` 在启动时调用一次，此后 SIGINT 不再使进程退出，而是唤醒当时正在等待的执行器；
/// 没有命令在运行时的 Ctrl+C 不会被记住。未安装时只能通过 `raise` 触发。
#[derive(Clone, Debug, Default)]
pub struct InterruptSignal {
    notify: Arc<Notify>,
}

impl InterruptSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// 安装进程级监听；须在 tokio 运行时内调用
    pub fn install() -> Self {
        let signal = Self::new();
        let notify = signal.notify.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                notify.notify_waiters();
            }
            tracing::warn!("ctrl-c listener stopped");
        });
        signal
    }

    /// 手动触发一次中断通知
    pub fn raise(&self) {
        self.notify.notify_waiters();
    }

    async fn wait(&self) {
        self.notify.notified().await
    }
}

/// 系统 shell 执行器
pub struct ShellExecutor {
    program: String,
    flag: String,
    timeout: Option<Duration>,
    interrupt: InterruptSignal,
}

impl ShellExecutor {
    /// timeout_secs 为 0 表示不设超时
    pub fn new(timeout_secs: u64) -> Self {
        let (program, flag) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };
        Self {
            program: program.to_string(),
            flag: flag.to_string(),
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            interrupt: InterruptSignal::new(),
        }
    }

    /// 使用共享的中断通知（通常来自 `InterruptSignal::install`）
    pub fn with_interrupt(mut self, interrupt: InterruptSignal) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// 换用其他 shell（如 bash -c）
    pub fn with_shell(mut self, program: impl Into<String>, flag: impl Into<String>) -> Self {
        self.program = program.into();
        self.flag = flag.into();
        self
    }

    fn build(&self, command: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.flag);
        // cmd.exe 自己解析命令行，不能再套一层参数转义
        #[cfg(windows)]
        cmd.raw_arg(command);
        #[cfg(not(windows))]
        cmd.arg(command);
        cmd.stdin(std::process::Stdio::inherit())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn stream(&self, command: &str, sink: &dyn EventSink) -> std::io::Result<ExecutionResult> {
        let mut child = self.build(command).spawn()?;

        let (tx, mut rx) = mpsc::unbounded_channel::<(OutputStream, String)>();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, OutputStream::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, OutputStream::Stderr, tx.clone()));
        }
        drop(tx);

        let deadline = self.timeout.map(|t| tokio::time::Instant::now() + t);
        let mut stdout_lines: Vec<String> = Vec::new();
        let mut stderr_lines: Vec<String> = Vec::new();
        let mut timed_out = false;

        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some((stream, line)) => {
                        sink.emit(SessionEvent::OutputLine { stream, line: line.clone() });
                        match stream {
                            OutputStream::Stdout => stdout_lines.push(line),
                            OutputStream::Stderr => stderr_lines.push(line),
                        }
                    }
                    None => break,
                },
                _ = self.interrupt.wait() => {
                    sink.emit(SessionEvent::CommandStillRunning);
                }
                _ = wait_deadline(deadline) => {
                    timed_out = true;
                    child.start_kill()?;
                    break;
                }
            }
        }

        let status = child.wait().await?;
        if let (true, Some(limit)) = (timed_out, self.timeout) {
            let msg = format!("Command timed out after {}s", limit.as_secs());
            sink.emit(SessionEvent::OutputLine {
                stream: OutputStream::Stderr,
                line: msg.clone(),
            });
            stderr_lines.push(msg);
            return Ok(ExecutionResult::new(
                command,
                stdout_lines.join("\n"),
                stderr_lines.join("\n"),
                SPAWN_FAILURE_EXIT_CODE,
            ));
        }

        Ok(ExecutionResult::new(
            command,
            stdout_lines.join("\n"),
            stderr_lines.join("\n"),
            exit_code(&status),
        ))
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl ProcessExecutor for ShellExecutor {
    async fn run(&self, command: &str, sink: &dyn EventSink) -> ExecutionResult {
        let start = Instant::now();
        sink.emit(SessionEvent::CommandStarted {
            command: command.to_string(),
        });

        let result = match self.stream(command, sink).await {
            Ok(result) => result,
            Err(e) => {
                let result = ExecutionResult::internal_failure(command, e);
                sink.emit(SessionEvent::OutputLine {
                    stream: OutputStream::Stderr,
                    line: result.stderr.clone(),
                });
                result
            }
        };

        sink.emit(SessionEvent::CommandFinished {
            exit_code: result.exit_code,
        });

        let audit = serde_json::json!({
            "event": "command_audit",
            "command": command,
            "exit_code": result.exit_code,
            "failed": result.failed(),
            "duration_ms": start.elapsed().as_millis() as u64,
        });
        tracing::info!(audit = %audit.to_string(), "command");

        result
    }
}

/// 逐行读取（非 UTF-8 字节按 lossy 替换），去掉行尾 \r\n
async fn forward_lines<R>(reader: R, stream: OutputStream, tx: mpsc::UnboundedSender<(OutputStream, String)>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                if tx.send((stream, line)).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, ?stream, "output read failed");
                break;
            }
        }
    }
}

async fn wait_deadline(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

/// 被信号终止时返回 -信号值
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    SPAWN_FAILURE_EXIT_CODE
}

#[cfg(all(test, windows))]
mod windows_tests {
    use super::*;
    use crate::ui::RecordingSink;

    #[tokio::test]
    async fn test_quoted_arguments_reach_cmd_verbatim() {
        let sink = RecordingSink::new();
        let result = ShellExecutor::default().run(r#"echo "a b""#, &sink).await;
        assert_eq!(result.stdout, r#""a b""#);
        assert_eq!(result.exit_code, 0);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::ui::RecordingSink;

    #[tokio::test]
    async fn test_captures_stdout() {
        let sink = RecordingSink::new();
        let result = ShellExecutor::default().run("echo hi", &sink).await;
        assert_eq!(result, ExecutionResult::new("echo hi", "hi", "", 0));
        assert!(!result.failed());

        let events = sink.events();
        assert_eq!(
            events.first(),
            Some(&SessionEvent::CommandStarted { command: "echo hi".into() })
        );
        assert!(events.contains(&SessionEvent::OutputLine {
            stream: OutputStream::Stdout,
            line: "hi".into()
        }));
        assert_eq!(events.last(), Some(&SessionEvent::CommandFinished { exit_code: 0 }));
    }

    #[tokio::test]
    async fn test_separates_streams_and_keeps_exit_code() {
        let sink = RecordingSink::new();
        let result = ShellExecutor::default()
            .run("echo one; echo two; echo oops 1>&2; exit 3", &sink)
            .await;
        assert_eq!(result.stdout, "one\ntwo");
        assert_eq!(result.stderr, "oops");
        assert_eq!(result.exit_code, 3);
        assert!(result.failed());
    }

    #[tokio::test]
    async fn test_false_fails_without_output() {
        let sink = RecordingSink::new();
        let result = ShellExecutor::default().run("false", &sink).await;
        assert_eq!(result, ExecutionResult::new("false", "", "", 1));
    }

    #[tokio::test]
    async fn test_spawn_failure_maps_to_sentinel() {
        let sink = RecordingSink::new();
        let executor = ShellExecutor::default().with_shell("/nonexistent/shell-binary", "-c");
        let result = executor.run("echo hi", &sink).await;
        assert_eq!(result.exit_code, SPAWN_FAILURE_EXIT_CODE);
        assert!(result.stdout.is_empty());
        assert!(result.stderr.starts_with("Error executing command:"));
        assert!(sink.events().contains(&SessionEvent::CommandFinished {
            exit_code: SPAWN_FAILURE_EXIT_CODE
        }));
    }

    #[tokio::test]
    async fn test_timeout_kills_command() {
        let sink = RecordingSink::new();
        let result = ShellExecutor::new(1).run("sleep 5", &sink).await;
        assert_eq!(result.exit_code, SPAWN_FAILURE_EXIT_CODE);
        assert_eq!(result.stderr, "Command timed out after 1s");
    }

    #[tokio::test]
    async fn test_strips_carriage_returns() {
        let sink = RecordingSink::new();
        let result = ShellExecutor::default().run("printf 'a\\r\\nb\\n'", &sink).await;
        assert_eq!(result.stdout, "a\nb");
    }

    #[tokio::test]
    async fn test_interrupt_keeps_command_running() {
        let sink = Arc::new(RecordingSink::new());
        let interrupt = InterruptSignal::new();
        let executor = ShellExecutor::default().with_interrupt(interrupt.clone());

        let raiser = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            interrupt.raise();
        });
        let result = executor.run("sleep 1; echo done", sink.as_ref()).await;
        raiser.await.unwrap();

        assert_eq!(result, ExecutionResult::new("sleep 1; echo done", "done", "", 0));
        assert!(sink.events().contains(&SessionEvent::CommandStillRunning));
    }

    #[tokio::test]
    async fn test_interrupt_without_running_command_is_not_remembered() {
        let sink = RecordingSink::new();
        let interrupt = InterruptSignal::new();
        interrupt.raise();
        let result = ShellExecutor::default()
            .with_interrupt(interrupt)
            .run("echo hi", &sink)
            .await;
        assert_eq!(result.exit_code, 0);
        assert!(!sink.events().contains(&SessionEvent::CommandStillRunning));
    }
}
