//! 翻译核心模块
//!
//! 文本分块、逐块调用后端（固定间隔重试）、拼接结果。

use crate::backend::{system_prompt, user_content, AttemptOutcome, TranslationBackend};
use crate::chunker::{reassemble, TextChunker};
use crate::error::{Result, TranslationError};
use crate::tokenizer::Tokenizer;
use crate::types::{Chunk, RetryConfig};
use std::future::Future;
use std::sync::Arc;
use tokio::time::sleep;

/// 一个块的重试状态
#[derive(Debug, Default)]
struct RetryState {
    attempts: usize,
    last_error: Option<String>,
}

/// 固定间隔的重试机制
///
/// 根据每次尝试返回的 [`AttemptOutcome`] 决定下一步：成功立即返回，
/// `TransientFailure` 等待 `config.delay()` 后重试，`FatalFailure` 立即放弃。
/// 最多尝试 `config.max_attempts` 次（至少一次）。重试间隔无效时不发起任何尝试。
///
/// # 参数
///
/// * `operation` - 要执行的异步操作
/// * `config` - 重试配置
/// * `chunk_index` - 块序号（从0开始），用于错误信息
/// * `total_chunks` - 总块数
pub async fn retry_with_delay<F, Fut>(
    mut operation: F,
    config: &RetryConfig,
    chunk_index: usize,
    total_chunks: usize,
) -> Result<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AttemptOutcome>,
{
    let delay = config.delay()?;
    let max_attempts = config.max_attempts.max(1);
    let position = chunk_index + 1;
    let mut state = RetryState::default();

    while state.attempts < max_attempts {
        state.attempts += 1;

        match operation().await {
            AttemptOutcome::Success(text) => return Ok(text),
            AttemptOutcome::FatalFailure(message) => {
                tracing::error!(
                    "块 {}/{} 不可重试的错误: {}",
                    position,
                    total_chunks,
                    message
                );
                return Err(TranslationError::Fatal {
                    index: position,
                    total: total_chunks,
                    message,
                });
            }
            AttemptOutcome::TransientFailure(message) => {
                tracing::warn!(
                    "块 {}/{} 第 {}/{} 次尝试失败: {}",
                    position,
                    total_chunks,
                    state.attempts,
                    max_attempts,
                    message
                );
                state.last_error = Some(message);
                if state.attempts < max_attempts {
                    tracing::info!("{:?} 后重试...", delay);
                    sleep(delay).await;
                }
            }
        }
    }

    Err(TranslationError::ChunkFailed {
        index: position,
        total: total_chunks,
        attempts: state.attempts,
        last_error: state.last_error.unwrap_or_default(),
    })
}

/// 逐块翻译器
///
/// 块按顺序逐个翻译，同一时刻最多一个后端请求。
///
/// # 示例
///
/// ```rust,no_run
/// use pptx_translator::{AnthropicBackend, ChunkTranslator, Cl100kTokenizer, TranslatorConfig};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = TranslatorConfig::default();
///     let backend = AnthropicBackend::new(config.backend.clone())?;
///     let translator = ChunkTranslator::new(
///         Arc::new(backend),
///         Arc::new(Cl100kTokenizer::new()?),
///         config.chunking.max_tokens,
///         config.retry.clone(),
///     );
///
///     let result = translator.translate("Hello, world!", "French").await?;
///     println!("Translation: {}", result);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct ChunkTranslator {
    backend: Arc<dyn TranslationBackend>,
    tokenizer: Arc<dyn Tokenizer>,
    max_tokens: usize,
    retry: RetryConfig,
}

impl ChunkTranslator {
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        tokenizer: Arc<dyn Tokenizer>,
        max_tokens: usize,
        retry: RetryConfig,
    ) -> Self {
        Self {
            backend,
            tokenizer,
            max_tokens,
            retry,
        }
    }

    /// 翻译文本
    ///
    /// # 参数
    ///
    /// * `text` - 要翻译的文本
    /// * `language` - 目标语言（直接写入翻译指令，如 "French"）
    ///
    /// # 返回
    ///
    /// * `Ok(String)` - 各块译文以单个空格拼接的结果
    /// * `Err(TranslationError)` - 某块重试耗尽或遇到不可重试错误
    pub async fn translate(&self, text: &str, language: &str) -> Result<String> {
        let chunker = TextChunker::new(self.tokenizer.as_ref(), self.max_tokens);
        let chunks = chunker.chunks(text).collect::<Result<Vec<Chunk>>>()?;
        let total = chunks.len();
        tracing::debug!("文本长度 {} 字节，分为 {} 块", text.len(), total);

        let prompt = system_prompt(language);
        let mut translated = Vec::with_capacity(total);

        for chunk in &chunks {
            let content = user_content(&chunk.text);
            let result = retry_with_delay(
                || self.backend.call(&prompt, &content),
                &self.retry,
                chunk.index,
                total,
            )
            .await?;

            tracing::info!("Chunk {}/{} translated successfully.", chunk.index + 1, total);
            translated.push(result);
        }

        Ok(reassemble(translated))
    }
}
