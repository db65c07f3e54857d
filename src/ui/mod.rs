//! 终端交互层：事件（event）、渲染（console）、行输入（input）、确认闸门（confirm）

pub mod confirm;
pub mod console;
pub mod event;
pub mod input;

pub use confirm::{confirm, Confirmation, CONFIRM_PROMPT};
pub use console::Console;
pub use event::{EventSink, OutputStream, RecordingSink, SessionEvent};
pub use input::{InputEvent, InputSource, ScriptedInput, TerminalInput};
