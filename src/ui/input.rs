//! 行输入
//!
//! InputSource 把一次阻塞读取归一为 Line / Interrupted / Eof 三种结果；
//! 终端实现基于 rustyline（Ctrl+C → Interrupted，Ctrl+D → Eof），测试用 ScriptedInput。

use std::collections::VecDeque;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::core::SessionError;

/// 一次读取的结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// Ctrl+C
    Interrupted,
    /// Ctrl+D / 输入结束
    Eof,
}

/// 阻塞式行输入
pub trait InputSource {
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent, SessionError>;

    /// 预填 initial 供用户编辑；默认实现不预填
    fn edit_line(&mut self, prompt: &str, _initial: &str) -> Result<InputEvent, SessionError> {
        self.read_line(prompt)
    }
}

/// rustyline 终端输入（带会话内行历史）
pub struct TerminalInput {
    editor: DefaultEditor,
}

impl TerminalInput {
    pub fn new() -> Result<Self, SessionError> {
        let editor = DefaultEditor::new().map_err(|e| SessionError::Input(e.to_string()))?;
        Ok(Self { editor })
    }

    fn map(result: rustyline::Result<String>) -> Result<InputEvent, SessionError> {
        match result {
            Ok(line) => Ok(InputEvent::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
            Err(e) => Err(SessionError::Input(e.to_string())),
        }
    }
}

impl InputSource for TerminalInput {
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent, SessionError> {
        let event = Self::map(self.editor.readline(prompt))?;
        if let InputEvent::Line(line) = &event {
            if !line.trim().is_empty() {
                let _ = self.editor.add_history_entry(line.as_str());
            }
        }
        Ok(event)
    }

    fn edit_line(&mut self, prompt: &str, initial: &str) -> Result<InputEvent, SessionError> {
        Self::map(self.editor.readline_with_initial(prompt, (initial, "")))
    }
}

/// 预置输入序列；耗尽后返回 Eof。记录每次读取时的提示符
#[derive(Debug, Default)]
pub struct ScriptedInput {
    events: VecDeque<InputEvent>,
    prompts: Vec<String>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, text: impl Into<String>) -> Self {
        self.events.push_back(InputEvent::Line(text.into()));
        self
    }

    pub fn interrupt(mut self) -> Self {
        self.events.push_back(InputEvent::Interrupted);
        self
    }

    pub fn eof(mut self) -> Self {
        self.events.push_back(InputEvent::Eof);
        self
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl InputSource for ScriptedInput {
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent, SessionError> {
        self.prompts.push(prompt.to_string());
        Ok(self.events.pop_front().unwrap_or(InputEvent::Eof))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input_drains_then_eof() {
        let mut input = ScriptedInput::new().line("ls").interrupt();
        assert_eq!(input.read_line("> ").ok(), Some(InputEvent::Line("ls".into())));
        assert_eq!(input.edit_line("? ", "pwd").ok(), Some(InputEvent::Interrupted));
        assert_eq!(input.read_line("> ").ok(), Some(InputEvent::Eof));
        assert_eq!(input.prompts(), ["> ", "? ", "> "]);
    }
}
