//! Smarterm - 交互式智能终端
//!
//! 模块划分：
//! - **assistant**: 助手网关（对话 / 解释 / 诊断）、回复解码、提示词
//! - **config**: 应用配置加载（INI + 环境变量）
//! - **core**: 会话状态、控制指令、错误、会话控制器
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Gemini / Mock）
//! - **memory**: 对话消息与只追加的执行历史
//! - **observability**: tracing 初始化
//! - **tools**: 进程执行器（Shell）
//! - **ui**: 终端输入、确认闸门与事件渲染

pub mod assistant;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod tools;
pub mod ui;

pub use crate::core::{SessionController, SessionError, SessionState};
