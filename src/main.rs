//! Smarterm - 交互式智能终端
//!
//! 入口：解析参数、初始化日志、加载配置与凭据、构建助手与执行器，并运行会话主循环。

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use smarterm::assistant::{AssistantGateway, SystemContext};
use smarterm::config::{load_config, ConfigError, CONFIG_HINT};
use smarterm::core::{SessionController, SessionError, SessionState};
use smarterm::llm::create_gemini_client;
use smarterm::observability;
use smarterm::tools::{InterruptSignal, ShellExecutor};
use smarterm::ui::{Console, TerminalInput};

#[derive(Parser, Debug)]
#[command(name = "smarterm", version, about = "Interactive shell with an AI assistant")]
struct Args {
    /// 额外的配置文件（覆盖 ~/smarterm/config.ini）
    #[arg(long, env = "SMARTERM_CONFIG")]
    config: Option<PathBuf>,

    /// 模型名，覆盖配置中的 [llm] model
    #[arg(long)]
    model: Option<String>,

    /// 日志级别（RUST_LOG 优先）
    #[arg(long)]
    log_level: Option<String>,

    /// 不显示启动横幅
    #[arg(long)]
    no_banner: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    observability::init(args.log_level.as_deref());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            if let Some(ConfigError::MissingCredential { .. }) = e.downcast_ref::<ConfigError>() {
                eprintln!("Please create the file with the following content:\n{CONFIG_HINT}");
            }
            tracing::error!(error = %e, "session aborted");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(args.config)?;
    let api_key = config.api_key()?;

    let model = args.model.as_deref().unwrap_or(&config.llm.model);
    let llm = create_gemini_client(
        api_key,
        Some(model),
        config.llm.base_url.as_deref(),
        config.llm.request_timeout_secs,
    )
    .map_err(|e| SessionError::BackendInit(e.to_string()))?;
    let gateway = AssistantGateway::new(Arc::new(llm), SystemContext::detect());

    let executor = Arc::new(
        ShellExecutor::new(config.executor.timeout_secs).with_interrupt(InterruptSignal::install()),
    );
    let input = TerminalInput::new().context("Failed to open terminal input")?;
    let console = Console::new(config.session.show_banner && !args.no_banner);
    console.welcome();

    let state = SessionState::new(config.session.context_window).with_verbose(config.session.verbose);
    let mut controller =
        SessionController::new(state, gateway, executor, Box::new(input), Arc::new(console));
    let outcome = controller.run().await;

    let (prompt, completion, total) = controller.gateway().token_usage();
    tracing::info!(prompt, completion, total, "token usage");
    outcome.context("Session ended with an error")
}
