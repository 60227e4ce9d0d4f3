//! # 解码缓存模块
//!
//! ## 设计思路
//!
//! 以 `(来源身份, 是否镜像)` 为键缓存解码后的像素，避免同一气泡反复渲染时重复解码。
//! 镜像与非镜像是两个独立条目：缓存只存放调用方交给它的字节，从不自行计算镜像。
//!
//! ## 实现思路
//!
//! - `RwLock` 读写分离：`get` 只拿读锁，可并发；`put` / 淘汰拿写锁，串行。
//! - 读路径无法修改 `LruCache` 的顺序，因此每个条目带一个原子访问时间戳，
//!   `get` 命中时只更新时间戳；写路径在需要淘汰前按 `(访问时间, 插入序号)` 同步一次顺序。
//! - 条目插入后不可变，替换而非原地修改，读方不会看到写了一半的缓冲区。
//! - 解码失败从不写入占位条目（由调用方保证只 `put` 成功结果）。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use lru::LruCache;

use crate::decode::{DecodedImage, ImageSource, SourceId};

/// 缓存键：来源身份 + 镜像标记。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: SourceId,
    pub mirror: bool,
}

impl CacheKey {
    pub fn new(source: SourceId, mirror: bool) -> Self {
        Self { source, mirror }
    }

    pub fn for_source(source: &ImageSource, mirror: bool) -> Self {
        Self::new(source.id(), mirror)
    }
}

/// 命中 / 未命中 / 淘汰计数快照。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct CacheEntry {
    image: Arc<DecodedImage>,
    last_access: AtomicU64,
    seq: u64,
}

struct CacheState {
    entries: LruCache<CacheKey, CacheEntry>,
    total_bytes: usize,
    next_seq: u64,
}

/// 有界 LRU 解码缓存。
///
/// 由应用启动时创建并注入 `BubbleFactory`，关闭时 `clear`。
pub struct DecodeCache {
    budget_bytes: usize,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    state: RwLock<CacheState>,
}

impl DecodeCache {
    /// 创建缓存，`budget_bytes` 为所有条目像素字节数之和的上限。
    pub fn new(budget_bytes: usize) -> Self {
        Self {
            budget_bytes,
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            state: RwLock::new(CacheState {
                entries: LruCache::unbounded(),
                total_bytes: 0,
                next_seq: 0,
            }),
        }
    }

    /// 查询缓存，命中时刷新访问时间并返回共享引用；未命中无副作用。
    pub fn get(&self, key: &CacheKey) -> Option<Arc<DecodedImage>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match state.entries.peek(key) {
            Some(entry) => {
                entry.last_access.store(self.tick(), Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                log::debug!("♻️ 命中解码缓存 - {} mirror={}", key.source, key.mirror);
                Some(Arc::clone(&entry.image))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// 插入或替换条目；总字节数超出预算时按最久未访问顺序淘汰。
    ///
    /// 单个条目本身超过预算时，插入后会被立即淘汰。
    pub fn put(&self, key: CacheKey, image: Arc<DecodedImage>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let bytes = image.byte_len();
        let seq = state.next_seq;
        state.next_seq += 1;

        let entry = CacheEntry {
            image,
            last_access: AtomicU64::new(self.tick()),
            seq,
        };

        if let Some(old) = state.entries.put(key, entry) {
            state.total_bytes -= old.image.byte_len();
        }
        state.total_bytes += bytes;

        if state.total_bytes > self.budget_bytes {
            self.evict_to_budget(&mut state);
        }
    }

    /// 是否存在条目，不刷新访问时间。
    pub fn contains(&self, key: &CacheKey) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.entries.contains(key)
    }

    /// 清空所有条目，释放缓冲区引用。
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let released = state.entries.len();
        state.entries.clear();
        state.total_bytes = 0;
        log::info!("🧹 解码缓存已清空，释放 {} 个条目", released);
    }

    pub fn len(&self) -> usize {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_bytes(&self) -> usize {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.total_bytes
    }

    pub fn budget_bytes(&self) -> usize {
        self.budget_bytes
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn evict_to_budget(&self, state: &mut CacheState) {
        // 把读路径记录的访问时间同步进 LRU 顺序，最久未访问的排在最前
        let mut order: Vec<(u64, u64, CacheKey)> = state
            .entries
            .iter()
            .map(|(key, entry)| (entry.last_access.load(Ordering::Relaxed), entry.seq, key.clone()))
            .collect();
        order.sort_unstable_by_key(|(access, seq, _)| (*access, *seq));
        for (_, _, key) in &order {
            state.entries.promote(key);
        }

        while state.total_bytes > self.budget_bytes {
            let Some((key, entry)) = state.entries.pop_lru() else {
                break;
            };
            let bytes = entry.image.byte_len();
            state.total_bytes -= bytes;
            self.evictions.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                "🗑️ 淘汰解码缓存 - {} mirror={} 释放 {}KB（剩余 {}KB / 预算 {}KB）",
                key.source,
                key.mirror,
                bytes / 1024,
                state.total_bytes / 1024,
                self.budget_bytes / 1024
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn key(name: &str, mirror: bool) -> CacheKey {
        CacheKey::new(SourceId::File(PathBuf::from(name)), mirror)
    }

    /// `side x side` 的 RGBA 缓冲区，占 `side * side * 4` 字节。
    fn image(side: u32) -> Arc<DecodedImage> {
        Arc::new(
            DecodedImage::from_rgba(side, side, vec![0; (side * side * 4) as usize])
                .expect("valid image"),
        )
    }

    #[test]
    fn miss_then_hit() {
        let cache = DecodeCache::new(1024);
        assert!(cache.get(&key("a.png", false)).is_none());

        cache.put(key("a.png", false), image(4));
        let hit = cache.get(&key("a.png", false)).expect("cached");
        assert_eq!(hit.width(), 4);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1, evictions: 0 });
    }

    #[test]
    fn mirror_is_part_of_the_key() {
        let cache = DecodeCache::new(1024);
        cache.put(key("a.png", false), image(4));
        assert!(cache.get(&key("a.png", true)).is_none());

        cache.put(key("a.png", true), image(2));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key("a.png", true)).expect("mirror").width(), 2);
        assert_eq!(cache.get(&key("a.png", false)).expect("plain").width(), 4);
    }

    #[test]
    fn replace_updates_accounting() {
        let cache = DecodeCache::new(1024);
        cache.put(key("a.png", false), image(4));
        cache.put(key("a.png", false), image(2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.total_bytes(), 16);
    }

    #[test]
    fn evicts_least_recently_accessed_not_oldest_inserted() {
        // 每个条目 64 字节，预算容纳 3 个
        let cache = DecodeCache::new(192);
        cache.put(key("a", false), image(4));
        cache.put(key("b", false), image(4));
        cache.put(key("c", false), image(4));

        assert!(cache.get(&key("a", false)).is_some());
        cache.put(key("d", false), image(4));

        assert!(cache.contains(&key("a", false)));
        assert!(!cache.contains(&key("b", false)));
        assert!(cache.contains(&key("c", false)));
        assert!(cache.contains(&key("d", false)));
        assert!(cache.total_bytes() <= cache.budget_bytes());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn miss_does_not_promote() {
        let cache = DecodeCache::new(128);
        cache.put(key("a", false), image(4));
        cache.put(key("b", false), image(4));
        assert!(cache.get(&key("zzz", false)).is_none());
        cache.put(key("c", false), image(4));
        assert!(!cache.contains(&key("a", false)));
    }

    #[test]
    fn oversized_entry_does_not_stay() {
        let cache = DecodeCache::new(32);
        cache.put(key("huge", false), image(8));
        assert!(cache.is_empty());
        assert_eq!(cache.total_bytes(), 0);
    }

    #[test]
    fn clear_releases_everything() {
        let cache = DecodeCache::new(1024);
        let held = image(4);
        cache.put(key("a", false), Arc::clone(&held));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(Arc::strong_count(&held), 1);
    }

    #[test]
    fn concurrent_readers_share_entries() {
        let cache = Arc::new(DecodeCache::new(4096));
        cache.put(key("shared", false), image(4));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    (0..100).all(|_| cache.get(&key("shared", false)).is_some())
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().expect("reader thread"));
        }
        assert_eq!(cache.stats().hits, 800);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Put(u8),
        Get(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![(0u8..12).prop_map(Op::Put), (0u8..12).prop_map(Op::Get)]
    }

    proptest! {
        #[test]
        fn total_never_exceeds_budget(
            ops in prop::collection::vec(op(), 1..200),
            budget in 0usize..1024,
        ) {
            let cache = DecodeCache::new(budget);
            for op in ops {
                match op {
                    Op::Put(id) => {
                        cache.put(key(&id.to_string(), false), image(2 + (id as u32 % 3)))
                    }
                    Op::Get(id) => { let _ = cache.get(&key(&id.to_string(), false)); }
                }
                prop_assert!(cache.total_bytes() <= budget);
            }
        }

        #[test]
        fn most_recent_access_survives_equal_footprint(ops in prop::collection::vec(op(), 1..200)) {
            // 等大条目，预算容纳 4 个：最近访问的条目只有在其余条目都被淘汰后才会被淘汰
            let cache = DecodeCache::new(4 * 64);
            let mut last_touched = None;
            for op in ops {
                match op {
                    Op::Put(id) => {
                        cache.put(key(&id.to_string(), false), image(4));
                        last_touched = Some(id);
                    }
                    Op::Get(id) => {
                        if cache.get(&key(&id.to_string(), false)).is_some() {
                            last_touched = Some(id);
                        }
                    }
                }
                if let Some(id) = last_touched {
                    prop_assert!(cache.contains(&key(&id.to_string(), false)));
                }
            }
        }
    }
}
