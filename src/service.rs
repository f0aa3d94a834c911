//! 翻译服务
//!
//! 在逐块翻译器之前加一层缓存：命中直接返回，未命中时翻译、写入缓存再返回。

use crate::cache::TranslationCache;
use crate::error::Result;
use crate::translator::ChunkTranslator;
use crate::types::TranslationRequest;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 带缓存的翻译服务
///
/// 缓存由调用方显式创建并传入，测试中可以每次使用新的缓存。
#[derive(Clone)]
pub struct TranslationService {
    translator: ChunkTranslator,
    cache: Arc<TranslationCache>,
    /// 未命中时的“检查-翻译-写入”在此锁内完成，同一文本不会被并发重复翻译
    fill: Arc<Mutex<()>>,
}

impl TranslationService {
    pub fn new(translator: ChunkTranslator, cache: Arc<TranslationCache>) -> Self {
        Self {
            translator,
            cache,
            fill: Arc::new(Mutex::new(())),
        }
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// 获取译文
    ///
    /// 翻译失败时不写入缓存，错误原样返回。
    pub async fn get(&self, text: &str, target_language: &str) -> Result<String> {
        let request = TranslationRequest::new(text, target_language);
        if let Some(hit) = self.cache.lookup(&request).await {
            tracing::debug!("缓存命中 ({} 字节)", text.len());
            return Ok(hit);
        }

        let _guard = self.fill.lock().await;
        if let Some(hit) = self.cache.peek(&request).await {
            return Ok(hit);
        }

        tracing::debug!("缓存未命中，开始翻译 ({} 字节)", text.len());
        let translated = self.translator.translate(text, target_language).await?;
        self.cache.insert(request, translated.clone()).await;
        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AttemptOutcome;
    use crate::chunker::tests::CharTokenizer;
    use crate::error::TranslationError;
    use crate::translator::tests::ScriptedBackend;
    use crate::types::RetryConfig;

    fn service(backend: Arc<ScriptedBackend>, capacity: usize) -> TranslationService {
        let retry = RetryConfig {
            max_attempts: 2,
            delay_secs: 0.0,
        };
        let translator = ChunkTranslator::new(backend, Arc::new(CharTokenizer), 100, retry);
        TranslationService::new(translator, Arc::new(TranslationCache::new(capacity)))
    }

    #[tokio::test]
    async fn second_get_is_a_pure_cache_hit() {
        let backend = Arc::new(ScriptedBackend::default());
        let service = service(backend.clone(), 10);

        let first = service.get("Hello.", "French").await.unwrap();
        let second = service.get("Hello.", "French").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.call_count(), 1);
        assert_eq!(service.cache().stats().await.hits, 1);
    }

    #[tokio::test]
    async fn different_language_is_a_different_entry() {
        let backend = Arc::new(ScriptedBackend::default());
        let service = service(backend.clone(), 10);

        service.get("Hello.", "French").await.unwrap();
        service.get("Hello.", "German").await.unwrap();
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let backend = Arc::new(ScriptedBackend::with_script(vec![
            AttemptOutcome::TransientFailure("busy".into()),
            AttemptOutcome::TransientFailure("busy".into()),
        ]));
        let service = service(backend.clone(), 10);

        let err = service.get("Hello.", "French").await.unwrap_err();
        assert!(matches!(err, TranslationError::ChunkFailed { .. }));
        assert!(service.cache().is_empty().await);

        // 脚本耗尽后后端恢复正常
        assert_eq!(service.get("Hello.", "French").await.unwrap(), "[Hello.]");
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn evicted_entries_are_translated_again() {
        let backend = Arc::new(ScriptedBackend::default());
        let service = service(backend.clone(), 1);

        service.get("one", "French").await.unwrap();
        service.get("two", "French").await.unwrap();
        service.get("one", "French").await.unwrap();
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn concurrent_gets_translate_once() {
        let backend = Arc::new(ScriptedBackend::default());
        let service = service(backend.clone(), 10);

        let (a, b) = tokio::join!(service.get("Same.", "French"), service.get("Same.", "French"));
        assert_eq!(a.unwrap(), b.unwrap());
        // 两次查找都未命中：第二个调用在第一个请求进行中到达
        let stats = service.cache().stats().await;
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.insertions, 1);
        assert_eq!(backend.call_count(), 1);
    }
}
