//! 命令执行：执行契约（executor）与系统 shell 实现（shell）

pub mod executor;
pub mod shell;

pub use executor::{
    ExecutionOrigin, ExecutionRecord, ExecutionResult, ProcessExecutor, ScriptedExecutor,
    SPAWN_FAILURE_EXIT_CODE,
};
pub use shell::{InterruptSignal, ShellExecutor};
