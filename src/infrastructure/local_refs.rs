//! 本地引用存储 - 基础设施层
//!
//! 持有内存中的图片数据，只暴露"创建 / 解析 / 释放引用"的能力

use crate::models::ImageBlob;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// 本地引用前缀
pub const LOCAL_REF_SCHEME: &str = "blob:";

/// 本地引用存储
///
/// 职责：
/// - 为内存中的图片分配 `blob:<uuid>` 引用
/// - 按引用取回图片数据
/// - 释放引用，避免长时间会话中内存不断增长
/// - 不认识 ScanItem / 队列
#[derive(Clone, Default)]
pub struct LocalRefStore {
    entries: Arc<Mutex<HashMap<String, ImageBlob>>>,
}

impl LocalRefStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ImageBlob>> {
        // 临界区内没有会 panic 的逻辑，中毒时直接取回数据
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 为图片创建新的本地引用
    pub fn create(&self, blob: &ImageBlob) -> String {
        let reference = format!("{}{}", LOCAL_REF_SCHEME, Uuid::new_v4());
        self.lock().insert(reference.clone(), blob.clone());
        debug!("创建本地引用: {} ({})", reference, blob.name);
        reference
    }

    /// 解析本地引用
    pub fn resolve(&self, reference: &str) -> Option<ImageBlob> {
        self.lock().get(reference).cloned()
    }

    /// 释放本地引用，返回是否确实释放了
    ///
    /// 非本地引用（http 地址、文件路径）直接忽略
    pub fn revoke(&self, reference: &str) -> bool {
        if !is_local_ref(reference) {
            return false;
        }
        let removed = self.lock().remove(reference).is_some();
        if removed {
            debug!("释放本地引用: {}", reference);
        }
        removed
    }

    /// 当前存活的引用数量
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }
}

/// 是否为本存储分配的引用
pub fn is_local_ref(location: &str) -> bool {
    location.starts_with(LOCAL_REF_SCHEME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_resolve_revoke() {
        let store = LocalRefStore::new();
        let blob = ImageBlob::new("scan1.jpg", vec![1, 2, 3]);

        let reference = store.create(&blob);
        assert!(is_local_ref(&reference));
        assert_eq!(store.resolve(&reference), Some(blob));
        assert_eq!(store.live_count(), 1);

        assert!(store.revoke(&reference));
        assert!(!store.revoke(&reference));
        assert!(store.resolve(&reference).is_none());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn foreign_locations_are_ignored() {
        let store = LocalRefStore::new();
        assert!(!store.revoke("https://example.com/a.png"));
        assert!(store.resolve("/tmp/a.png").is_none());
    }

    #[test]
    fn each_blob_gets_a_fresh_reference() {
        let store = LocalRefStore::new();
        let blob = ImageBlob::new("a.png", vec![]);
        assert_ne!(store.create(&blob), store.create(&blob));
        assert_eq!(store.live_count(), 2);
    }
}
