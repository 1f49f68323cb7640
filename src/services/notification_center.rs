//! 通知中心 - 业务能力层
//!
//! 只负责"短暂通知"能力：推送、到期自动移除、手动关闭

use crate::models::{Notification, NotificationKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    live: Vec<Notification>,
    timers: HashMap<String, AbortHandle>,
    success_created: usize,
    error_created: usize,
}

/// 通知中心
///
/// 职责：
/// - 为每条通知分配唯一 id
/// - 到期后自动移除（到期任务在手动关闭或清空时取消）
/// - 不关心通知来自哪个条目
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Mutex<Inner>>,
    ttl: Duration,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 推送通知，返回通知 id
    pub fn notify(&self, message: impl Into<String>, kind: NotificationKind) -> String {
        let id = Uuid::new_v4().to_string();
        let message = message.into();

        match kind {
            NotificationKind::Success => info!("🔔 {}", message),
            NotificationKind::Error => warn!("🔔 {}", message),
        }

        let mut inner = self.lock();
        inner.live.push(Notification {
            id: id.clone(),
            message,
            kind,
        });
        match kind {
            NotificationKind::Success => inner.success_created += 1,
            NotificationKind::Error => inner.error_created += 1,
        }

        // 没有运行时就不安排到期任务，通知保留到手动关闭
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let center = self.clone();
            let expiring_id = id.clone();
            let ttl = self.ttl;
            let task = handle.spawn(async move {
                tokio::time::sleep(ttl).await;
                center.expire(&expiring_id);
            });
            inner.timers.insert(id.clone(), task.abort_handle());
        }

        id
    }

    fn expire(&self, id: &str) {
        let mut inner = self.lock();
        inner.timers.remove(id);
        inner.live.retain(|n| n.id != id);
    }

    /// 手动关闭通知；已不存在的 id 直接忽略
    pub fn dismiss(&self, id: &str) {
        let mut inner = self.lock();
        if let Some(timer) = inner.timers.remove(id) {
            timer.abort();
        }
        inner.live.retain(|n| n.id != id);
    }

    /// 清空所有通知并取消所有到期任务
    pub fn clear(&self) {
        let mut inner = self.lock();
        for (_, timer) in inner.timers.drain() {
            timer.abort();
        }
        inner.live.clear();
        inner.success_created = 0;
        inner.error_created = 0;
    }

    /// 当前存活的通知
    pub fn live(&self) -> Vec<Notification> {
        self.lock().live.clone()
    }

    /// 自上次清空以来创建过的某类通知数量
    pub fn created_count(&self, kind: NotificationKind) -> usize {
        let inner = self.lock();
        match kind {
            NotificationKind::Success => inner.success_created,
            NotificationKind::Error => inner.error_created,
        }
    }

    /// 尚未触发的到期任务数量
    pub fn pending_timers(&self) -> usize {
        self.lock().timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    const TTL: Duration = Duration::from_secs(3);

    #[tokio::test(start_paused = true)]
    async fn expires_after_ttl() {
        let center = NotificationCenter::new(TTL);
        let id = center.notify("图片 a.jpg 处理完成", NotificationKind::Success);

        sleep(Duration::from_millis(2900)).await;
        assert!(center.live().iter().any(|n| n.id == id));

        sleep(Duration::from_millis(200)).await;
        assert!(center.live().is_empty());
        assert_eq!(center.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_removes_immediately_and_stays_gone() {
        let center = NotificationCenter::new(TTL);
        let id = center.notify("图片 a.jpg 处理失败", NotificationKind::Error);

        sleep(Duration::from_secs(1)).await;
        center.dismiss(&id);
        assert!(center.live().is_empty());
        assert_eq!(center.pending_timers(), 0);

        sleep(Duration::from_secs(5)).await;
        assert!(center.live().is_empty());

        // 重复关闭不报错
        center.dismiss(&id);
        center.dismiss("unknown");
    }

    #[tokio::test(start_paused = true)]
    async fn ids_are_unique_and_counts_tracked() {
        let center = NotificationCenter::new(TTL);
        let a = center.notify("a", NotificationKind::Success);
        let b = center.notify("b", NotificationKind::Success);
        let _c = center.notify("c", NotificationKind::Error);

        assert_ne!(a, b);
        assert_eq!(center.live().len(), 3);
        assert_eq!(center.created_count(NotificationKind::Success), 2);
        assert_eq!(center.created_count(NotificationKind::Error), 1);

        sleep(Duration::from_secs(4)).await;
        assert!(center.live().is_empty());
        assert_eq!(center.created_count(NotificationKind::Success), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_cancels_timers() {
        let center = NotificationCenter::new(TTL);
        center.notify("a", NotificationKind::Success);
        center.notify("b", NotificationKind::Error);

        center.clear();
        assert!(center.live().is_empty());
        assert_eq!(center.pending_timers(), 0);
        assert_eq!(center.created_count(NotificationKind::Error), 0);

        let late = center.notify("c", NotificationKind::Success);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(center.live()[0].id, late);
    }

    #[test]
    fn without_runtime_notifications_persist() {
        let center = NotificationCenter::new(TTL);
        let id = center.notify("offline", NotificationKind::Success);
        assert_eq!(center.pending_timers(), 0);
        center.dismiss(&id);
        assert!(center.live().is_empty());
    }
}
