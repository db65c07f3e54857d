//! 提示词：按操作系统生成的系统上下文，以及 explain / diagnose 请求模板

use crate::tools::ExecutionResult;

/// verbose 关闭时追加在 converse 请求末尾的指令
pub const COMMAND_ONLY_INSTRUCTION: &str = "Assistant (Instruction): Respond only with 'CMD: your_exact_command'. Do not provide any explanation or additional text.";

/// 系统上下文：启动时构建一次，之后只读
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemContext {
    pub os: String,
    pub prompt: String,
}

impl SystemContext {
    /// 按当前平台构建
    pub fn detect() -> Self {
        Self::for_os(std::env::consts::OS)
    }

    /// os 取值与 std::env::consts::OS 一致（windows / linux / macos / ...）
    pub fn for_os(os: &str) -> Self {
        let (shell_type, guidance) = match os {
            "windows" => (
                "CMD/PowerShell".to_string(),
                "You are operating in a terminal on Windows.".to_string(),
            ),
            "linux" => (
                "bash/zsh or other standard Linux shell".to_string(),
                "You are operating in a terminal on Linux.".to_string(),
            ),
            "macos" => (
                "bash/zsh or other standard macOS shell".to_string(),
                "You are operating in a terminal on macOS.".to_string(),
            ),
            other => (
                "unknown shell".to_string(),
                format!(
                    "You are operating in a terminal on an unknown operating system ({other}). Try using standard POSIX commands."
                ),
            ),
        };

        let prompt = format!(
            "{guidance} \
            Your goal is to help the user achieve their tasks by executing {shell_type} commands. \
            Use the command history and their outputs to understand the context. \
            Anticipate the user's needs if possible. \
            When you need to execute a command, respond *only* with 'CMD:' followed by the exact command. \
            Example (Windows): CMD:dir /w. Example (Linux/macOS): CMD:ls -l. \
            For any other response (explanation, question), use natural language. \
            Be concise in your responses."
        );

        Self {
            os: os.to_string(),
            prompt,
        }
    }
}

fn fenced_or(text: &str, placeholder: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        placeholder.to_string()
    } else {
        text.to_string()
    }
}

/// 请求解释一次成功执行的输出
pub fn explain_prompt(result: &ExecutionResult) -> String {
    format!(
        "Can you briefly explain the output of the following command?\n\n\
        Command: `{}`\n\
        Return Code: {}\n\n\
        Standard Output (stdout):\n```\n{}\n```\n\n\
        Standard Error (stderr):\n```\n{}\n```\n\n\
        Explanation:",
        result.command,
        result.exit_code,
        fenced_or(&result.stdout, "[Empty]"),
        fenced_or(&result.stderr, "[Empty]"),
    )
}

/// 请求诊断失败原因并（如可能）给出 CMD: 纠错命令
pub fn diagnose_prompt(result: &ExecutionResult) -> String {
    format!(
        "The following command failed:\n\n\
        Command: `{}`\n\
        Return Code: {}\n\n\
        Standard Output (stdout):\n```\n{}\n```\n\n\
        Standard Error (stderr):\n```\n{}\n```\n\n\
        Can you briefly explain the cause of this error and propose a corrected command if possible? \
        If you propose a command, use *only* the format 'CMD: new_exact_command'. \
        Otherwise, just provide the explanation.",
        result.command,
        result.exit_code,
        fenced_or(&result.stdout, "[Empty]"),
        fenced_or(&result.stderr, "[None]"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_context_per_os() {
        let win = SystemContext::for_os("windows");
        assert!(win.prompt.contains("CMD/PowerShell"));
        assert!(win.prompt.starts_with("You are operating in a terminal on Windows."));

        let mac = SystemContext::for_os("macos");
        assert!(mac.prompt.contains("macOS"));

        let other = SystemContext::for_os("freebsd");
        assert!(other.prompt.contains("unknown operating system (freebsd)"));
        assert!(other.prompt.contains("'CMD:'"));
    }

    #[test]
    fn test_explain_prompt_placeholders() {
        let prompt = explain_prompt(&ExecutionResult::new("true", "", "", 0));
        assert!(prompt.contains("Command: `true`"));
        assert!(prompt.contains("Return Code: 0"));
        assert_eq!(prompt.matches("[Empty]").count(), 2);
    }

    #[test]
    fn test_diagnose_prompt_includes_streams() {
        let prompt = diagnose_prompt(&ExecutionResult::new("cat nope", "", "cat: nope: No such file", 1));
        assert!(prompt.starts_with("The following command failed:"));
        assert!(prompt.contains("cat: nope: No such file"));
        assert!(prompt.contains("Standard Output (stdout):\n```\n[Empty]\n```"));
        assert!(prompt.contains("'CMD: new_exact_command'"));
    }
}
