//! 分词器模块
//!
//! 按token计数切分文本，与后端的上下文窗口限制保持一致。

use crate::error::{Result, TranslationError};
use tiktoken_rs::CoreBPE;

/// 子词分词器
///
/// `decode(encode(x))` 必须与 `x` 完全一致，分块的无损重建依赖于此。
/// 对于在字符中间结束的token序列，`decode` 返回错误。
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Vec<u32>;

    fn decode(&self, tokens: &[u32]) -> Result<String>;
}

/// 基于 `cl100k_base` 编码的分词器
pub struct Cl100kTokenizer {
    bpe: CoreBPE,
}

impl Cl100kTokenizer {
    /// 加载 `cl100k_base` 词表
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| TranslationError::Tokenizer(format!("加载cl100k_base失败: {}", e)))?;
        Ok(Self { bpe })
    }
}

impl Tokenizer for Cl100kTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe.encode_ordinary(text)
    }

    fn decode(&self, tokens: &[u32]) -> Result<String> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|e| TranslationError::Tokenizer(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cl100k_round_trips_mixed_scripts() {
        let tokenizer = Cl100kTokenizer::new().unwrap();
        for text in ["Hello, world.", "Grüße aus Köln. 東京へようこそ。", "", "  spaced\n\tout  "] {
            let tokens = tokenizer.encode(text);
            assert_eq!(tokenizer.decode(&tokens).unwrap(), text);
        }
    }
}
