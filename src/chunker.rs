//! 文本分块模块
//!
//! 将长文本按token数切分为若干块，优先在句号处断开；以及将翻译后的块重新拼接。

use crate::error::Result;
use crate::tokenizer::Tokenizer;
use crate::types::Chunk;

/// 默认每块最大token数
pub const DEFAULT_MAX_TOKENS: usize = 1750;

/// 按token计数的文本分块器
///
/// # 示例
///
/// ```rust
/// use pptx_translator::{Cl100kTokenizer, TextChunker};
///
/// let tokenizer = Cl100kTokenizer::new().unwrap();
/// let chunker = TextChunker::new(&tokenizer, 1750);
/// let chunks: Vec<_> = chunker.chunks("Short text.").collect::<Result<_, _>>().unwrap();
/// assert_eq!(chunks.len(), 1);
/// ```
pub struct TextChunker<'a, T: Tokenizer + ?Sized> {
    tokenizer: &'a T,
    max_tokens: usize,
}

impl<'a, T: Tokenizer + ?Sized> TextChunker<'a, T> {
    /// `max_tokens` 为0时按1处理
    pub fn new(tokenizer: &'a T, max_tokens: usize) -> Self {
        Self {
            tokenizer,
            max_tokens: max_tokens.max(1),
        }
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// 惰性地切分文本
    ///
    /// 按顺序拼接所有块即得到原文。
    pub fn chunks(&self, text: &str) -> Chunks<'a, T> {
        Chunks {
            tokenizer: self.tokenizer,
            max_tokens: self.max_tokens,
            tokens: self.tokenizer.encode(text).into_iter(),
            current: Vec::new(),
            next_index: 0,
        }
    }
}

/// [`TextChunker::chunks`] 返回的迭代器
pub struct Chunks<'a, T: Tokenizer + ?Sized> {
    tokenizer: &'a T,
    max_tokens: usize,
    tokens: std::vec::IntoIter<u32>,
    current: Vec<u32>,
    next_index: usize,
}

impl<T: Tokenizer + ?Sized> Chunks<'_, T> {
    fn emit(&mut self, text: String) -> Chunk {
        let chunk = Chunk {
            index: self.next_index,
            text,
        };
        self.next_index += 1;
        chunk
    }
}

impl<T: Tokenizer + ?Sized> Iterator for Chunks<'_, T> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(token) = self.tokens.next() {
            self.current.push(token);
            if self.current.len() < self.max_tokens {
                continue;
            }

            // 累积的token在字符中间结束时无法解码，继续累积
            let Ok(text) = self.tokenizer.decode(&self.current) else {
                continue;
            };

            match text.rfind('.') {
                Some(pos) => {
                    let (head, tail) = text.split_at(pos + 1);
                    self.current = self.tokenizer.encode(tail);
                    tracing::trace!(
                        "在句号处切分第 {} 块，剩余 {} 个token",
                        self.next_index + 1,
                        self.current.len()
                    );
                    return Some(Ok(self.emit(head.to_string())));
                }
                None => {
                    self.current.clear();
                    return Some(Ok(self.emit(text)));
                }
            }
        }

        if self.current.is_empty() {
            return None;
        }

        let rest = std::mem::take(&mut self.current);
        Some(self.tokenizer.decode(&rest).map(|text| self.emit(text)))
    }
}

/// 用单个空格按原顺序拼接翻译后的块
pub fn reassemble<I, S>(chunks: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, chunk) in chunks.into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(chunk.as_ref());
    }
    out
}
