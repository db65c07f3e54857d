//! 可观测性：tracing 日志写到 stderr，避免与命令输出交错在 stdout 上

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 默认级别
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// 初始化全局 subscriber；RUST_LOG 优先，其次 level，最后 warn
pub fn init(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.unwrap_or(DEFAULT_LOG_LEVEL)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
