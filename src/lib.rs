//! # PPTX Translator
//!
//! 使用大语言模型翻译PowerPoint演示文稿中的文本，保持文档结构和格式不变。
//!
//! ## 主要特性
//!
//! - **按token分块**: 长文本按token数切分，优先在句号处断开
//! - **固定间隔重试**: 每块独立重试，重试耗尽时报告块的位置
//! - **有界缓存**: 相同的 (原文, 目标语言) 只翻译一次，LRU淘汰
//! - **例外规则**: 语言标签、版本号直接替换，不经过翻译
//! - **配置灵活**: 支持TOML配置文件和程序化配置
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use pptx_translator::{
//!     translate_document, AnthropicBackend, ChunkTranslator, Cl100kTokenizer, DocumentJob,
//!     TranslationCache, TranslationService, TranslatorConfig,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TranslatorConfig::load_from_default_locations();
//!     let translator = ChunkTranslator::new(
//!         Arc::new(AnthropicBackend::new(config.backend.clone())?),
//!         Arc::new(Cl100kTokenizer::new()?),
//!         config.chunking.max_tokens,
//!         config.retry.clone(),
//!     );
//!     let service = TranslationService::new(
//!         translator,
//!         Arc::new(TranslationCache::new(config.cache.capacity)),
//!     );
//!
//!     let job = DocumentJob {
//!         source_lang: "en",
//!         target_lang: "fr",
//!         version: "1.2.3",
//!         use_exceptions: true,
//!     };
//!     translate_document("deck.pptx", "deck.fr.pptx", &job, &service).await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cache;
pub mod chunker;
pub mod config;
pub mod document;
pub mod error;
pub mod exceptions;
pub mod languages;
pub mod pptx;
pub mod service;
pub mod tokenizer;
pub mod translator;
pub mod types;

pub use backend::{AnthropicBackend, AttemptOutcome, TranslationBackend};
pub use cache::{CacheStats, TranslationCache};
pub use chunker::{reassemble, Chunks, TextChunker, DEFAULT_MAX_TOKENS};
pub use config::TranslatorConfig;
pub use document::{translate_document, translate_presentation, DocumentJob, DocumentReport};
pub use error::{Result, TranslationError};
pub use exceptions::{check_exception, ExceptionMatcher};
pub use pptx::{Presentation, Slide, TextRun};
pub use service::TranslationService;
pub use tokenizer::{Cl100kTokenizer, Tokenizer};
pub use translator::{retry_with_delay, ChunkTranslator};
pub use types::{
    BackendConfig, CacheConfig, Chunk, ChunkingConfig, RetryConfig, TranslationRequest,
};
