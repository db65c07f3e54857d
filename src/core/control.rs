//! 输入分类：控制指令 / 空输入 / 内容输入
//!
//! 控制指令大小写不敏感、精确匹配（trim 后），不产生历史记录。

/// 顶层控制指令
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlToken {
    /// `exit` / `!q`
    Quit,
    /// `!!`
    ToggleMode,
    /// `!verbose` / `!v`
    ToggleVerbose,
    /// `!clear` / `!cls`
    ClearScreen,
}

/// 一次用户输入的分类结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Turn {
    Control(ControlToken),
    Blank,
    /// 内容输入（已 trim）
    Content(String),
}

impl ControlToken {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "exit" | "!q" => Some(ControlToken::Quit),
            "!!" => Some(ControlToken::ToggleMode),
            "!verbose" | "!v" => Some(ControlToken::ToggleVerbose),
            "!clear" | "!cls" => Some(ControlToken::ClearScreen),
            _ => None,
        }
    }
}

/// 先匹配控制指令，再判空，其余为内容输入
pub fn classify(raw: &str) -> Turn {
    if let Some(token) = ControlToken::parse(raw) {
        return Turn::Control(token);
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Turn::Blank
    } else {
        Turn::Content(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_tokens_case_insensitive() {
        assert_eq!(classify("EXIT"), Turn::Control(ControlToken::Quit));
        assert_eq!(classify("  !Q "), Turn::Control(ControlToken::Quit));
        assert_eq!(classify("!!"), Turn::Control(ControlToken::ToggleMode));
        assert_eq!(classify("!Verbose"), Turn::Control(ControlToken::ToggleVerbose));
        assert_eq!(classify("!v"), Turn::Control(ControlToken::ToggleVerbose));
        assert_eq!(classify("!CLS"), Turn::Control(ControlToken::ClearScreen));
        assert_eq!(classify("!clear"), Turn::Control(ControlToken::ClearScreen));
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(classify(""), Turn::Blank);
        assert_eq!(classify("   \t"), Turn::Blank);
    }

    #[test]
    fn test_near_misses_are_content() {
        assert_eq!(classify("exit 1"), Turn::Content("exit 1".into()));
        assert_eq!(classify("!!!"), Turn::Content("!!!".into()));
        assert_eq!(classify("echo hi"), Turn::Content("echo hi".into()));
    }

    #[test]
    fn test_content_trimmed_at_both_ends_only() {
        assert_eq!(classify("   echo  hi  \r\n"), Turn::Content("echo  hi".into()));
    }
}
