//! 远程翻译后端
//!
//! 每次调用返回一个 [`AttemptOutcome`]，由重试循环根据结果决定是否重试。

use crate::error::{Result, TranslationError};
use crate::types::{
    ApiErrorResponse, BackendConfig, ContentBlock, Message, MessagesRequest, MessagesResponse,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// 单次调用的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 后端返回的译文
    Success(String),
    /// 可重试的失败（限流、超时、过载、响应异常等）
    TransientFailure(String),
    /// 重试也无法成功的失败（认证失败、请求无法构造等）
    FatalFailure(String),
}

/// 翻译后端
///
/// 实现者只负责一次请求；重试由 [`crate::translator::retry_with_delay`] 负责。
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn call(&self, system_prompt: &str, content: &str) -> AttemptOutcome;
}

/// 翻译指令
pub fn system_prompt(language: &str) -> String {
    format!(
        "You are an professional translation software. Translate this text into {}. \
         You MUST only output the translation, nothing else. \
         If there's nothing to translate simply output the original text.",
        language
    )
}

/// 发送给后端的用户内容
pub fn user_content(chunk: &str) -> String {
    format!("string to translate:\n {}", chunk)
}

/// Anthropic Messages API 后端
#[derive(Clone)]
pub struct AnthropicBackend {
    /// HTTP客户端
    client: Client,
    api_key: String,
    config: BackendConfig,
}

impl AnthropicBackend {
    /// 从配置创建后端，API密钥从 `config.api_key_env` 指定的环境变量读取
    pub fn new(config: BackendConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            TranslationError::Config(format!("环境变量 {} 未设置", config.api_key_env))
        })?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: BackendConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(concat!("pptx-translator/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    async fn send(&self, system_prompt: &str, content: &str) -> AttemptOutcome {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_output_tokens,
            temperature: self.config.temperature,
            system: system_prompt,
            messages: vec![Message {
                role: "user",
                content: vec![ContentBlock {
                    kind: "text".to_string(),
                    text: Some(content.to_string()),
                }],
            }],
        };

        let response = match self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.config.anthropic_version)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                return AttemptOutcome::FatalFailure(format!("无法构造请求: {}", e))
            }
            Err(e) => return AttemptOutcome::TransientFailure(format!("网络请求失败: {}", e)),
        };

        let status = response.status();
        tracing::debug!("后端响应状态: {}", status);

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return AttemptOutcome::TransientFailure(format!("读取响应失败: {}", e)),
        };

        if status.is_success() {
            parse_success_body(&body)
        } else {
            classify_error(status, &body)
        }
    }
}

#[async_trait]
impl TranslationBackend for AnthropicBackend {
    async fn call(&self, system_prompt: &str, content: &str) -> AttemptOutcome {
        self.send(system_prompt, content).await
    }
}

/// 取出响应中的第一个文本块
fn parse_success_body(body: &str) -> AttemptOutcome {
    match serde_json::from_str::<MessagesResponse>(body) {
        Ok(response) => match response
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
        {
            Some(text) => AttemptOutcome::Success(text),
            None => AttemptOutcome::TransientFailure("响应中没有文本内容".to_string()),
        },
        Err(e) => AttemptOutcome::TransientFailure(format!("无法解析响应: {}", e)),
    }
}

/// 认证失败不可重试，其余错误状态均重试
fn classify_error(status: StatusCode, body: &str) -> AttemptOutcome {
    let detail = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| format!("{}: {}", e.error.kind, e.error.message))
        .unwrap_or_else(|_| body.trim().to_string());
    let message = format!("API error {}: {}", status.as_u16(), detail);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AttemptOutcome::FatalFailure(message),
        _ => AttemptOutcome::TransientFailure(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_body_yields_first_text_block() {
        let body = r#"{"id":"msg_1","type":"message","role":"assistant",
            "content":[{"type":"text","text":"Bonjour le monde."}],
            "stop_reason":"end_turn"}"#;
        assert_eq!(
            parse_success_body(body),
            AttemptOutcome::Success("Bonjour le monde.".to_string())
        );
    }

    #[test]
    fn malformed_or_empty_body_is_retryable() {
        assert!(matches!(
            parse_success_body("not json"),
            AttemptOutcome::TransientFailure(_)
        ));
        assert!(matches!(
            parse_success_body(r#"{"content":[]}"#),
            AttemptOutcome::TransientFailure(_)
        ));
    }

    #[test]
    fn overload_and_rate_limit_are_transient() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let outcome = classify_error(StatusCode::from_u16(529).unwrap(), body);
        assert_eq!(
            outcome,
            AttemptOutcome::TransientFailure("API error 529: overloaded_error: Overloaded".to_string())
        );
        assert!(matches!(
            classify_error(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            AttemptOutcome::TransientFailure(_)
        ));
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, "{}"),
            AttemptOutcome::TransientFailure(_)
        ));
    }

    #[test]
    fn authentication_failure_is_fatal() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        assert!(matches!(
            classify_error(StatusCode::UNAUTHORIZED, body),
            AttemptOutcome::FatalFailure(_)
        ));
    }

    #[test]
    fn prompt_names_language_and_frames_chunk() {
        assert!(system_prompt("French").contains("Translate this text into French."));
        assert_eq!(user_content("Hello"), "string to translate:\n Hello");
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let config = BackendConfig {
            api_key_env: "PPTX_TRANSLATOR_TEST_UNSET_KEY".to_string(),
            ..BackendConfig::default()
        };
        assert!(matches!(
            AnthropicBackend::new(config),
            Err(TranslationError::Config(_))
        ));
    }
}
