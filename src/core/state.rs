//! 会话状态：模式、详细开关、历史，以及控制器所处阶段

use serde::Serialize;

use crate::memory::HistoryBuffer;

/// 输入模式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// 输入直接作为命令执行
    Execute,
    /// 输入交给助手
    Converse,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Execute => Mode::Converse,
            Mode::Converse => Mode::Execute,
        }
    }

    /// 提示符中的单字母标识
    pub fn indicator(self) -> char {
        match self {
            Mode::Execute => 'E',
            Mode::Converse => 'A',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Execute => "EXECUTE",
            Mode::Converse => "ASK",
        }
    }
}

/// 控制器阶段；Terminated 为终态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    AwaitingInput,
    Dispatch,
    AwaitingConfirmation,
    Executing,
    PostProcessing,
    Terminated,
}

/// 会话状态：进程生命周期内唯一
#[derive(Clone, Debug)]
pub struct SessionState {
    pub mode: Mode,
    pub verbose: bool,
    pub history: HistoryBuffer,
}

impl SessionState {
    pub fn new(context_window: usize) -> Self {
        Self {
            mode: Mode::Execute,
            verbose: true,
            history: HistoryBuffer::new(context_window),
        }
    }

    /// 初始详细开关（默认开启）
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn toggle_mode(&mut self) -> Mode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub fn toggle_verbose(&mut self) -> bool {
        self.verbose = !self.verbose;
        self.verbose
    }

    /// 例如 "(EV) > "；verbose 关闭时为 "(E ) > "
    pub fn prompt(&self) -> String {
        let verbose = if self.verbose { 'V' } else { ' ' };
        format!("({}{}) > ", self.mode.indicator(), verbose)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(crate::memory::DEFAULT_CONTEXT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = SessionState::default();
        assert_eq!(state.mode, Mode::Execute);
        assert!(state.verbose);
        assert!(state.history.is_empty());
        assert_eq!(state.prompt(), "(EV) > ");
    }

    #[test]
    fn test_double_toggle_restores() {
        let mut state = SessionState::default();
        assert_eq!(state.toggle_mode(), Mode::Converse);
        assert_eq!(state.prompt(), "(AV) > ");
        assert_eq!(state.toggle_mode(), Mode::Execute);
        assert!(!state.toggle_verbose());
        assert_eq!(state.prompt(), "(E ) > ");
        assert!(state.toggle_verbose());
        assert!(state.history.is_empty());
    }
}
