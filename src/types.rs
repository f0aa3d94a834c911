//! 类型定义模块
//!
//! 定义翻译库中使用的所有数据结构和配置类型。

use crate::error::{Result, TranslationError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 缓存查找的输入：原文与目标语言
///
/// 作为缓存键时不做任何规范化，仅空白不同的两段文本视为不同的键。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranslationRequest {
    pub text: String,
    pub target_language: String,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_language: target_language.into(),
        }
    }
}

/// 长文本中的一个连续片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 在所属文本中的序号（从0开始）
    pub index: usize,
    pub text: String,
}

/// 后端配置
///
/// # 字段说明
///
/// * `api_url` - Messages API地址
/// * `model` - 模型标识
/// * `api_key_env` - 保存API密钥的环境变量名
/// * `anthropic_version` - `anthropic-version` 请求头
/// * `max_output_tokens` - 单次请求的最大输出token数
/// * `temperature` - 采样温度，取低值以保证结果稳定
/// * `timeout_secs` - 单次请求超时（秒）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub api_url: String,
    pub model: String,
    pub api_key_env: String,
    pub anthropic_version: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.anthropic.com/v1/messages".to_string(),
            model: "claude-3-5-sonnet-20240620".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            anthropic_version: "2023-06-01".to_string(),
            max_output_tokens: 5000,
            temperature: 0.2,
            timeout_secs: 120,
        }
    }
}

/// 分块配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// 每块最大token数
    pub max_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: crate::chunker::DEFAULT_MAX_TOKENS,
        }
    }
}

/// 重试配置
///
/// 每次重试之间等待固定时长，不做指数退避。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// 每块最多尝试次数（含第一次）
    pub max_attempts: usize,
    /// 两次尝试之间的等待（秒）
    pub delay_secs: f64,
}

impl RetryConfig {
    /// 重试间隔；负数按0处理，非有限值或超出 `Duration` 范围时返回配置错误
    pub fn delay(&self) -> Result<Duration> {
        let invalid = |reason: String| {
            TranslationError::Config(format!("retry.delay_secs = {} 无效: {}", self.delay_secs, reason))
        };
        if !self.delay_secs.is_finite() {
            return Err(invalid("不是有限值".to_string()));
        }
        Duration::try_from_secs_f64(self.delay_secs.max(0.0)).map_err(|e| invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.delay().map(|_| ())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay_secs: 5.0,
        }
    }
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 最多缓存的条目数
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 1000 }
    }
}

#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system: &'a str,
    pub messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Message<'a> {
    pub role: &'a str,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}
