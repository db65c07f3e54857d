//! Gemini API 客户端（OpenAI 兼容格式）
//!
//! Gemini 提供 OpenAI 兼容端点，复用 OpenAiClient。
//! - Base URL: https://generativelanguage.googleapis.com/v1beta/openai/
//! - 模型: gemini-2.5-flash（默认）、gemini-2.5-pro

use crate::llm::{LlmError, OpenAiClient};

/// Gemini API 常量
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
pub const GEMINI_FLASH: &str = "gemini-2.5-flash";
pub const GEMINI_PRO: &str = "gemini-2.5-pro";

/// 创建 Gemini 客户端；base_url / model 为空时使用默认值，base_url 必须是 http(s) 地址
pub fn create_gemini_client(
    api_key: &str,
    model: Option<&str>,
    base_url: Option<&str>,
    request_timeout_secs: u64,
) -> Result<OpenAiClient, LlmError> {
    let model = model.filter(|m| !m.trim().is_empty()).unwrap_or(GEMINI_FLASH);
    let base_url = base_url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(GEMINI_BASE_URL);

    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        return Err(LlmError::InvalidRequest(format!("invalid base url: {base_url}")));
    }

    tracing::info!("Using Gemini LLM ({}) at {}", model, base_url);
    Ok(OpenAiClient::new(Some(base_url), model, api_key).with_request_timeout(request_timeout_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_for_blank_overrides() {
        let client = create_gemini_client("key", Some("  "), None, 0).unwrap();
        assert_eq!(client.model(), GEMINI_FLASH);
    }

    #[test]
    fn test_model_override() {
        let client = create_gemini_client("key", Some(GEMINI_PRO), None, 30).unwrap();
        assert_eq!(client.model(), GEMINI_PRO);
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let result = create_gemini_client("key", None, Some("localhost:8080"), 0);
        assert!(matches!(result, Err(LlmError::InvalidRequest(_))));
    }
}
