//! 翻译缓存
//!
//! 以 (原文, 目标语言) 为键的有界LRU缓存，进程内有效，不做持久化。

use crate::types::TranslationRequest;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;

/// 缓存统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
}

struct Inner {
    entries: LruCache<TranslationRequest, String>,
    stats: CacheStats,
}

/// 有界翻译缓存
///
/// 达到容量后插入新条目会淘汰最久未使用的条目。读写都经过同一把锁，
/// 可以在多个任务间共享。
pub struct TranslationCache {
    inner: Mutex<Inner>,
    capacity: NonZeroUsize,
}

impl TranslationCache {
    /// 容量为0时按1处理
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// 查找缓存，命中时刷新该条目的使用时间
    pub async fn lookup(&self, request: &TranslationRequest) -> Option<String> {
        let mut inner = self.inner.lock().await;
        match inner.entries.get(request).cloned() {
            Some(value) => {
                inner.stats.hits += 1;
                Some(value)
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// 写入一个完整的译文
    pub async fn insert(&self, request: TranslationRequest, translated: String) {
        let mut inner = self.inner.lock().await;
        inner.stats.insertions += 1;
        if let Some((evicted, _)) = inner.entries.push(request.clone(), translated) {
            // 同键覆盖也会返回旧值，不算淘汰
            if evicted != request {
                inner.stats.evictions += 1;
                tracing::debug!("缓存已满，淘汰 {} 字节的条目", evicted.text.len());
            }
        }
    }

    /// 查找但不刷新使用时间，也不计入统计
    pub async fn peek(&self, request: &TranslationRequest) -> Option<String> {
        self.inner.lock().await.entries.peek(request).cloned()
    }

    pub async fn contains(&self, request: &TranslationRequest) -> bool {
        self.inner.lock().await.entries.contains(request)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats.clone()
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(crate::types::CacheConfig::default().capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(text: &str) -> TranslationRequest {
        TranslationRequest::new(text, "French")
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = TranslationCache::new(4);
        assert_eq!(cache.lookup(&req("Hello")).await, None);
        cache.insert(req("Hello"), "Bonjour".into()).await;
        assert_eq!(cache.lookup(&req("Hello")).await.as_deref(), Some("Bonjour"));

        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses, stats.insertions), (1, 1, 1));
    }

    #[tokio::test]
    async fn keys_are_exact_text_and_language() {
        let cache = TranslationCache::new(4);
        cache.insert(req("Hello"), "Bonjour".into()).await;
        assert_eq!(cache.lookup(&req("Hello ")).await, None);
        assert_eq!(cache.lookup(&req("hello")).await, None);
        assert_eq!(cache.lookup(&TranslationRequest::new("Hello", "German")).await, None);
    }

    #[tokio::test]
    async fn evicts_least_recently_used_once_full() {
        let cache = TranslationCache::new(2);
        cache.insert(req("a"), "A".into()).await;
        cache.insert(req("b"), "B".into()).await;
        // 访问a，使b成为最久未使用
        assert!(cache.lookup(&req("a")).await.is_some());
        cache.insert(req("c"), "C".into()).await;

        assert!(cache.contains(&req("a")).await);
        assert!(!cache.contains(&req("b")).await);
        assert!(cache.contains(&req("c")).await);
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn overwriting_a_key_is_not_an_eviction() {
        let cache = TranslationCache::new(1);
        cache.insert(req("a"), "A".into()).await;
        cache.insert(req("a"), "A2".into()).await;
        assert_eq!(cache.stats().await.evictions, 0);
        assert_eq!(cache.lookup(&req("a")).await.as_deref(), Some("A2"));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cache = TranslationCache::new(0);
        assert_eq!(cache.capacity(), 1);
        assert!(tokio_test::block_on(cache.is_empty()));
    }
}
