//! 终端渲染：把 SessionEvent 打印为带样式的行（crossterm），横幅与清屏
//!
//! 命令 stderr 行写到进程 stderr，其余写 stdout；每个事件一次 println，保证行原子性。

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};

use crate::assistant::RequestKind;
use crate::ui::{EventSink, OutputStream, SessionEvent};

const BANNER: &str = r"
                            _
  ___ _ __ ___   __ _ _ __| |_ ___ _ __ _ __ ___
 / __| '_ ` _ \ / _` | '__| __/ _ \ '__| '_ ` _ \
 \__ \ | | | | | (_| | |  | ||  __/ |  | | | | | |
 |___/_| |_| |_|\__,_|_|   \__\___|_|  |_| |_| |_|
";

/// 终端控制台
#[derive(Debug, Clone)]
pub struct Console {
    show_banner: bool,
}

impl Console {
    pub fn new(show_banner: bool) -> Self {
        Self { show_banner }
    }

    /// 清屏后显示横幅与帮助
    pub fn welcome(&self) {
        self.clear();
        if self.show_banner {
            println!("{}", BANNER.cyan().bold());
            println!("{}\n", format!("Version {}", env!("CARGO_PKG_VERSION")).dim());
        }
        print_help();
    }

    fn clear(&self) {
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, Clear(ClearType::All), MoveTo(0, 0)) {
            tracing::debug!(error = %e, "clear screen failed");
        }
    }

    fn system(&self, msg: impl std::fmt::Display) {
        println!("{} {}", "[SYSTEM]".magenta(), msg);
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new(true)
    }
}

fn print_help() {
    println!("{}", "Modes:".magenta());
    println!("  {}: Type shell commands directly.", "(E)XECUTE".bold());
    println!("  {}    : Ask questions or request commands from the AI.", "(A)SK".bold());
    println!("{}", "Special Commands:".magenta());
    println!("{}: Switch mode (EXECUTE/ASK)", "  '!!'       ".cyan());
    println!(
        "{} or {}: Toggle verbose mode (explanations ON{}/OFF)",
        "  '!verbose' ".cyan(),
        "'!v'".cyan(),
        "V".green().bold()
    );
    println!("{} or {}: Clear screen", "  '!clear'   ".cyan(), "'!cls'".cyan());
    println!("{} or {}: Quit", "  'exit' ".cyan(), "'!q' ".cyan());
}

fn error_label(request: RequestKind) -> &'static str {
    match request {
        RequestKind::Converse => "AI Error:",
        RequestKind::Explain => "Explanation Error:",
        RequestKind::Diagnose => "Analysis Error:",
    }
}

impl EventSink for Console {
    fn emit(&self, event: SessionEvent) {
        match event {
            SessionEvent::ModeChanged { mode } => {
                self.system(format!("Switched to {} mode.", mode.label().bold()));
            }
            SessionEvent::VerbosityChanged { verbose } => {
                let status = if verbose {
                    "enabled".green().bold()
                } else {
                    "disabled".red().bold()
                };
                self.system(format!("Verbose mode {status}."));
            }
            SessionEvent::ClearScreen => self.welcome(),
            SessionEvent::InputInterrupted => {
                println!();
                self.system("Interruption received. Type 'exit' or '!q' to quit.");
            }
            SessionEvent::CommandStarted { command } => {
                println!("{}", format!("--- Executing: {} ---", command.bold()).blue());
            }
            SessionEvent::OutputLine { stream, line } => match stream {
                OutputStream::Stdout => println!("{} {}", "OUT>".dim(), line),
                OutputStream::Stderr => {
                    let mut stderr = io::stderr().lock();
                    let _ = writeln!(stderr, "{}", format!("ERR> {line}").red().bold());
                }
            },
            SessionEvent::CommandFinished { exit_code } => {
                let code = if exit_code == 0 {
                    exit_code.to_string().green()
                } else {
                    exit_code.to_string().red()
                };
                println!("{}", format!("--- Command finished (code: {code}) ---").blue());
            }
            SessionEvent::CommandStillRunning => {
                println!();
                self.system("Interrupt received; the command keeps running until it exits.");
            }
            SessionEvent::Thinking { activity } => println!("{}", activity.dim()),
            SessionEvent::AssistantText { text } => println!("{} {}", "AI:".green(), text),
            SessionEvent::Proposal { command } => {
                println!("{} {}", "AI proposes:".magenta(), command.yellow().bold());
            }
            SessionEvent::ProposalCancelled => {
                println!();
                self.system("Command cancelled. You can ask for a correction.");
            }
            SessionEvent::AnalyzingFailure => println!("{}", "Analyzing error with AI...".yellow()),
            SessionEvent::CorrectionSuggested => {
                println!("{}", "AI suggests a correction:".yellow());
            }
            SessionEvent::CorrectionFailed => {
                println!("{}", "The proposed correction also failed.".red().bold());
            }
            SessionEvent::Analysis { text } => println!("{}\n{}", "AI Analysis:".yellow(), text),
            SessionEvent::Explanation { text } => {
                println!("{}\n{}", "AI Explanation:".italic().dark_grey(), text);
            }
            SessionEvent::BackendError { request, text } => {
                println!("{} {}", error_label(request).red().bold(), text);
            }
            SessionEvent::Goodbye => {
                println!();
                self.system("Goodbye!");
            }
        }
        let _ = io::stdout().flush();
    }
}
