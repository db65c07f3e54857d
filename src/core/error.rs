//! 会话错误
//!
//! 后端调用失败、命令失败、用户取消都不是错误，而是控制器处理的类型化结果；
//! 这里只有无法构建后端客户端与终端输入故障两类。配置错误见 `config::ConfigError`。

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// 无法构建后端客户端（启动期致命）
    #[error("Error initializing AI client: {0}")]
    BackendInit(String),

    /// 终端输入故障（非中断 / EOF）
    #[error("Input error: {0}")]
    Input(String),
}
