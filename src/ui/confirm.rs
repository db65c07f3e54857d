//! 确认闸门：展示提议命令，允许编辑，回车确认，Ctrl+C 取消
//!
//! 空输入 = 接受原提议；非空输入 = 用编辑后的命令替换；中断（或输入结束）= 取消，只显示取消提示。

use crate::ui::{EventSink, InputEvent, InputSource, SessionEvent};

pub const CONFIRM_PROMPT: &str = "Confirm/Modify and Enter (Ctrl+C to cancel/correct) > ";

/// 确认结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub proceed: bool,
    pub final_command: String,
}

impl Confirmation {
    fn accept(command: impl Into<String>) -> Self {
        Self {
            proceed: true,
            final_command: command.into(),
        }
    }

    fn cancel() -> Self {
        Self {
            proceed: false,
            final_command: String::new(),
        }
    }
}

/// 向用户确认 proposed；输入层故障按取消处理，故障本身会在下一次读取时再次暴露
pub fn confirm(input: &mut dyn InputSource, sink: &dyn EventSink, proposed: &str) -> Confirmation {
    sink.emit(SessionEvent::Proposal {
        command: proposed.to_string(),
    });

    match input.edit_line(CONFIRM_PROMPT, proposed) {
        Ok(InputEvent::Line(line)) => {
            let edited = line.trim();
            if edited.is_empty() {
                Confirmation::accept(proposed)
            } else {
                Confirmation::accept(edited)
            }
        }
        Ok(InputEvent::Interrupted) | Ok(InputEvent::Eof) => {
            sink.emit(SessionEvent::ProposalCancelled);
            Confirmation::cancel()
        }
        Err(e) => {
            tracing::warn!(error = %e, "confirmation input failed");
            sink.emit(SessionEvent::ProposalCancelled);
            Confirmation::cancel()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{RecordingSink, ScriptedInput};

    #[test]
    fn test_empty_input_accepts_proposal() {
        let sink = RecordingSink::new();
        let mut input = ScriptedInput::new().line("");
        let c = confirm(&mut input, &sink, "ls -l");
        assert_eq!(c, Confirmation::accept("ls -l"));
        assert_eq!(sink.events(), vec![SessionEvent::Proposal { command: "ls -l".into() }]);
    }

    #[test]
    fn test_edit_replaces_command() {
        let sink = RecordingSink::new();
        let mut input = ScriptedInput::new().line("  ls -la ");
        let c = confirm(&mut input, &sink, "ls -l");
        assert_eq!(c, Confirmation::accept("ls -la"));
    }

    #[test]
    fn test_interrupt_cancels_with_notice() {
        let sink = RecordingSink::new();
        let mut input = ScriptedInput::new().interrupt().line("next");
        let c = confirm(&mut input, &sink, "rm -rf build");
        assert!(!c.proceed);
        assert!(sink.events().contains(&SessionEvent::ProposalCancelled));
        // 取消只消费一次读取
        assert_eq!(input.remaining(), 1);
    }
}
