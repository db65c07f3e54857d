//! 会话控制器：状态机主循环
//!
//! 一次处理一个输入回合（含确认、执行、后处理），完成后才读取下一个输入。
//! - 控制指令与空输入不产生历史记录
//! - EXECUTE：输入原样执行，记为 DirectExecution
//! - CONVERSE：交给助手；命令提议须经确认闸门，确认后执行并记为 AssistedExecution
//! - 后处理：失败 → 诊断（最多一次纠错执行，纠错结果不再诊断）；成功且 verbose → 解释

use std::sync::Arc;

use crate::assistant::{AssistantGateway, Reply, RequestKind};
use crate::core::control::{classify, ControlToken, Turn};
use crate::core::{Mode, SessionError, SessionPhase, SessionState};
use crate::memory::HistoryEntry;
use crate::tools::{ExecutionOrigin, ExecutionRecord, ExecutionResult, ProcessExecutor};
use crate::ui::{confirm, Confirmation, EventSink, InputEvent, InputSource, SessionEvent};

/// 一个回合结束后是否继续
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Continue,
    Quit,
}

/// 会话控制器：显式持有状态与所有协作者（无全局变量）
pub struct SessionController {
    state: SessionState,
    phase: SessionPhase,
    gateway: AssistantGateway,
    executor: Arc<dyn ProcessExecutor>,
    input: Box<dyn InputSource>,
    sink: Arc<dyn EventSink>,
}

impl SessionController {
    pub fn new(
        state: SessionState,
        gateway: AssistantGateway,
        executor: Arc<dyn ProcessExecutor>,
        input: Box<dyn InputSource>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            state,
            phase: SessionPhase::Idle,
            gateway,
            executor,
            input,
            sink,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn gateway(&self) -> &AssistantGateway {
        &self.gateway
    }

    /// 主循环：直到 quit 或输入结束；只有输入层故障会返回错误
    pub async fn run(&mut self) -> Result<(), SessionError> {
        loop {
            self.transition(SessionPhase::AwaitingInput);
            let prompt = self.state.prompt();
            match self.input.read_line(&prompt)? {
                InputEvent::Line(line) => {
                    if self.handle_input(&line).await == TurnOutcome::Quit {
                        break;
                    }
                }
                InputEvent::Interrupted => self.sink.emit(SessionEvent::InputInterrupted),
                InputEvent::Eof => break,
            }
        }
        self.transition(SessionPhase::Terminated);
        self.sink.emit(SessionEvent::Goodbye);
        Ok(())
    }

    /// 处理一次原始输入
    pub async fn handle_input(&mut self, raw: &str) -> TurnOutcome {
        self.transition(SessionPhase::Dispatch);
        match classify(raw) {
            Turn::Control(ControlToken::Quit) => {
                self.transition(SessionPhase::Terminated);
                return TurnOutcome::Quit;
            }
            Turn::Control(ControlToken::ToggleMode) => {
                let mode = self.state.toggle_mode();
                self.sink.emit(SessionEvent::ModeChanged { mode });
            }
            Turn::Control(ControlToken::ToggleVerbose) => {
                let verbose = self.state.toggle_verbose();
                self.sink.emit(SessionEvent::VerbosityChanged { verbose });
            }
            Turn::Control(ControlToken::ClearScreen) => self.sink.emit(SessionEvent::ClearScreen),
            Turn::Blank => {}
            Turn::Content(text) => self.content_turn(&text).await,
        }
        self.transition(SessionPhase::Idle);
        TurnOutcome::Continue
    }

    async fn content_turn(&mut self, text: &str) {
        let record = match self.state.mode {
            Mode::Execute => {
                let result = self.execute(text).await;
                self.state.history.push(HistoryEntry::DirectExecution {
                    result: result.clone(),
                });
                Some(ExecutionRecord::new(ExecutionOrigin::Direct, result))
            }
            Mode::Converse => self.converse(text).await,
        };

        if let Some(record) = record {
            self.post_process(record).await;
        }
    }

    /// 助手路径；只有确认并执行了命令时返回执行记录
    async fn converse(&mut self, query: &str) -> Option<ExecutionRecord> {
        self.sink.emit(SessionEvent::Thinking {
            activity: "AI thinking...".to_string(),
        });
        let reply = self
            .gateway
            .converse(self.state.history.window(), query, self.state.verbose)
            .await;

        match reply {
            Reply::BackendError(text) => {
                self.sink.emit(SessionEvent::BackendError {
                    request: RequestKind::Converse,
                    text: text.clone(),
                });
                self.state.history.push(HistoryEntry::AssistantReply {
                    user_query: query.to_string(),
                    text: format!("ERROR: {text}"),
                });
                None
            }
            Reply::Text(text) => {
                self.sink.emit(SessionEvent::AssistantText { text: text.clone() });
                self.state.history.push(HistoryEntry::AssistantReply {
                    user_query: query.to_string(),
                    text,
                });
                None
            }
            Reply::CommandProposal(proposed) => {
                let confirmation = self.confirm(&proposed);
                if !confirmation.proceed {
                    self.state.history.push(HistoryEntry::ProposalCancelled {
                        user_query: query.to_string(),
                        proposed_command: proposed,
                    });
                    return None;
                }
                let result = self.execute(&confirmation.final_command).await;
                self.state.history.push(HistoryEntry::AssistedExecution {
                    user_query: query.to_string(),
                    result: result.clone(),
                });
                Some(ExecutionRecord::new(ExecutionOrigin::Assisted, result))
            }
        }
    }

    /// 失败 → 诊断；成功且 verbose → 解释。纠错记录不做任何后处理
    async fn post_process(&mut self, record: ExecutionRecord) {
        if record.origin == ExecutionOrigin::Correction {
            return;
        }
        self.transition(SessionPhase::PostProcessing);
        if record.eligible_for_diagnosis() {
            self.diagnose(&record.result).await;
        } else if !record.result.failed() && self.state.verbose {
            self.explain(&record.result).await;
        }
    }

    async fn diagnose(&mut self, failed: &ExecutionResult) {
        self.sink.emit(SessionEvent::AnalyzingFailure);
        match self.gateway.diagnose(failed).await {
            Reply::BackendError(text) => self.sink.emit(SessionEvent::BackendError {
                request: RequestKind::Diagnose,
                text,
            }),
            Reply::Text(text) => self.sink.emit(SessionEvent::Analysis { text }),
            Reply::CommandProposal(fix) => {
                self.sink.emit(SessionEvent::CorrectionSuggested);
                let confirmation = self.confirm(&fix);
                if !confirmation.proceed {
                    self.state.history.push(HistoryEntry::CorrectionDeclined {
                        proposed_command: fix,
                    });
                    return;
                }
                let result = self.execute(&confirmation.final_command).await;
                self.state.history.push(HistoryEntry::CorrectionAttempt {
                    result: result.clone(),
                });
                let record = ExecutionRecord::new(ExecutionOrigin::Correction, result);
                if record.result.failed() {
                    self.sink.emit(SessionEvent::CorrectionFailed);
                }
            }
        }
    }

    async fn explain(&mut self, result: &ExecutionResult) {
        self.sink.emit(SessionEvent::Thinking {
            activity: "Getting explanation from AI...".to_string(),
        });
        match self.gateway.explain(result).await {
            Reply::BackendError(text) => self.sink.emit(SessionEvent::BackendError {
                request: RequestKind::Explain,
                text,
            }),
            Reply::Text(text) => self.sink.emit(SessionEvent::Explanation { text }),
            Reply::CommandProposal(command) => self.sink.emit(SessionEvent::Explanation {
                text: format!("CMD:{command}"),
            }),
        }
    }

    fn confirm(&mut self, proposed: &str) -> Confirmation {
        self.transition(SessionPhase::AwaitingConfirmation);
        confirm(self.input.as_mut(), self.sink.as_ref(), proposed)
    }

    async fn execute(&mut self, command: &str) -> ExecutionResult {
        self.transition(SessionPhase::Executing);
        self.executor.run(command, self.sink.as_ref()).await
    }

    fn transition(&mut self, next: SessionPhase) {
        if self.phase != next {
            tracing::debug!(from = ?self.phase, to = ?next, "session phase");
            self.phase = next;
        }
    }
}
