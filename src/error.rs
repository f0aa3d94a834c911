//! 错误处理模块
//!
//! 定义翻译库中使用的错误类型和错误处理机制。

use thiserror::Error;

/// 翻译错误类型
///
/// 包含翻译过程中可能出现的各种错误情况。
///
/// # 变体说明
///
/// * `Http` - HTTP客户端错误
/// * `Config` - 配置错误（缺少API密钥、配置文件无效等）
/// * `Tokenizer` - 分词器错误
/// * `ChunkFailed` - 重试耗尽后的最终翻译失败，包含块位置
/// * `Fatal` - 后端报告的不可重试错误
/// * `Document` - 演示文稿结构错误
#[derive(Error, Debug)]
pub enum TranslationError {
    /// HTTP客户端错误
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 分词器错误
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// 重试耗尽
    #[error("Translation failed for chunk {index}/{total} after {attempts} attempts. Last error: {last_error}")]
    ChunkFailed {
        /// 块序号（从1开始）
        index: usize,
        /// 总块数
        total: usize,
        /// 已尝试次数
        attempts: usize,
        /// 最后一次错误消息
        last_error: String,
    },

    /// 不可重试的后端错误
    #[error("Translation aborted for chunk {index}/{total}: {message}")]
    Fatal {
        index: usize,
        total: usize,
        message: String,
    },

    /// 演示文稿结构错误
    #[error("Document error: {0}")]
    Document(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl TranslationError {
    /// 是否为重试耗尽或不可重试导致的最终翻译失败
    pub fn is_terminal_translation_failure(&self) -> bool {
        matches!(
            self,
            TranslationError::ChunkFailed { .. } | TranslationError::Fatal { .. }
        )
    }
}

/// 翻译结果类型别名
///
/// 简化返回类型，使用 `TranslationError` 作为错误类型。
///
/// # 示例
///
/// ```rust
/// use pptx_translator::{Result, TranslationError};
///
/// fn example_function() -> Result<String> {
///     Err(TranslationError::Config("missing api key".to_string()))
/// }
///
/// assert!(example_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, TranslationError>;
