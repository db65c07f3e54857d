//! 应用配置：从 ~/smarterm/config.ini 与环境变量加载
//!
//! 加载顺序：先读用户目录下的 INI 文件，再叠加 `--config` 指定的文件，
//! 最后用环境变量 `SMARTERM__*` 覆盖（双下划线表示嵌套，如 `SMARTERM__API__GEMINI_API_KEY=...`）。

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::llm::GEMINI_FLASH;
use crate::memory::DEFAULT_CONTEXT_WINDOW;

/// 缺少凭据时提示的 INI 片段
pub const CONFIG_HINT: &str = "[API]\nGEMINI_API_KEY = YOUR_API_KEY_HERE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("API key not found in {}", path.display())]
    MissingCredential { path: PathBuf },
}

/// 应用配置根
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(alias = "API", alias = "Api")]
    pub api: ApiSection,
    #[serde(alias = "LLM")]
    pub llm: LlmSection,
    #[serde(alias = "SESSION")]
    pub session: SessionSection,
    #[serde(alias = "EXECUTOR")]
    pub executor: ExecutorSection,
}

/// [API] 段：凭据
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApiSection {
    #[serde(default, alias = "GEMINI_API_KEY")]
    pub gemini_api_key: Option<String>,
}

/// [llm] 段：模型、端点、单次请求超时（0 表示不限）
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    GEMINI_FLASH.to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// [session] 段
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSection {
    /// 发送给助手的历史条目数
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    #[serde(default = "default_true")]
    pub verbose: bool,
    #[serde(default = "default_true")]
    pub show_banner: bool,
}

fn default_context_window() -> usize {
    DEFAULT_CONTEXT_WINDOW
}

fn default_true() -> bool {
    true
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            verbose: true,
            show_banner: true,
        }
    }
}

/// [executor] 段：命令超时（秒，0 表示不限）
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExecutorSection {
    #[serde(default)]
    pub timeout_secs: u64,
}

impl AppConfig {
    /// 取出非空的 API Key；缺失时带上期望的配置文件路径
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        match self.api.gemini_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError::MissingCredential {
                path: default_config_path(),
            }),
        }
    }
}

/// ~/smarterm/config.ini；取不到用户目录时退回当前目录
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smarterm")
        .join("config.ini")
}

/// 加载配置：默认 INI（可缺失）→ 显式文件 → 环境变量 SMARTERM__*
pub fn load_config(explicit: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    load_from(&default_config_path(), explicit.as_deref())
}

fn load_from(default_path: &Path, explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = config::Config::builder().add_source(
        config::File::from(default_path.to_path_buf())
            .format(config::FileFormat::Ini)
            .required(false),
    );

    if let Some(path) = explicit {
        builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SMARTERM")
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder.build()?.try_deserialize()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ini(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".ini")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_any_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_from(&dir.path().join("missing.ini"), None).unwrap();
        assert_eq!(cfg.llm.model, GEMINI_FLASH);
        assert_eq!(cfg.llm.request_timeout_secs, 120);
        assert_eq!(cfg.session.context_window, 5);
        assert!(cfg.session.verbose);
        assert_eq!(cfg.executor.timeout_secs, 0);
    }

    #[test]
    fn test_reads_api_key_from_ini() {
        let file = ini("[API]\nGEMINI_API_KEY = abc123\n");
        let cfg = load_from(file.path(), None).unwrap();
        assert_eq!(cfg.api_key().unwrap(), "abc123");
    }

    #[test]
    fn test_blank_key_is_missing_credential() {
        let file = ini("[API]\nGEMINI_API_KEY =   \n");
        let cfg = load_from(file.path(), None).unwrap();
        assert!(matches!(cfg.api_key(), Err(ConfigError::MissingCredential { .. })));
    }

    #[test]
    fn test_explicit_file_overrides_sections() {
        let base = ini("[API]\nGEMINI_API_KEY = k\n");
        let extra = ini("[session]\ncontext_window = 3\nverbose = false\n\n[executor]\ntimeout_secs = 10\n");
        let cfg = load_from(base.path(), Some(extra.path())).unwrap();
        assert_eq!(cfg.session.context_window, 3);
        assert!(!cfg.session.verbose);
        assert_eq!(cfg.executor.timeout_secs, 10);
        assert_eq!(cfg.api_key().unwrap(), "k");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_from(&dir.path().join("a.ini"), Some(&dir.path().join("b.ini")));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
