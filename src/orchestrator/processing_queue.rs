//! 处理队列 - 编排层
//!
//! ## 职责
//!
//! 本模块持有全部扫描条目及其状态，负责把每个条目严格按顺序推进：
//!
//! ```text
//! idle → uploading → detecting → cropped
//!            ↓           ↓
//!          error       error
//! ```
//!
//! ## 顺序保证
//!
//! - 开始处理时只对当时处于 `idle` 的条目 id 拍一次快照，之后新增的条目不进入本批
//! - 快照中的条目逐个处理，前一个到达终态（或被跳过）之前，后一个不会开始上传
//! - 每个条目开始前按 id 重新查找，已被用户删除的直接跳过
//! - 针对已删除条目的状态更新静默忽略，不中断正在进行的网络请求
//! - 任何单个条目的失败都不会中断整个批次
//!
//! ## 资源
//!
//! 状态锁只在同步的短临界区内持有，从不跨越 `.await`。
//! 条目被删除或队列被重置时释放其本地引用。

use crate::clients::ScanApi;
use crate::error::{ScanError, ScanResult};
use crate::infrastructure::{is_local_ref, LocalRefStore};
use crate::models::{
    ImageBlob, Notification, NotificationKind, ProcessedResult, ProcessingStatus, ScanItem,
};
use crate::services::NotificationCenter;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Default)]
struct QueueState {
    items: Vec<ScanItem>,
    is_processing: bool,
    has_started: bool,
    /// 每次重置加一，旧批次据此判断自己是否已过期
    generation: u64,
}

/// 单个批次的处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub attempted: usize,
    pub cropped: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// 处理进度（只统计非 idle 条目）
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    pub percent: u32,
    pub in_flight: bool,
}

enum ItemOutcome {
    Cropped,
    Failed,
    Skipped,
}

/// 上传前从条目中取出的数据
struct UploadSource {
    display_name: String,
    source_blob: Option<ImageBlob>,
    original_location: String,
}

/// 处理队列
///
/// 可以廉价 clone，所有 clone 共享同一份状态
pub struct ProcessingQueue<S> {
    state: Arc<Mutex<QueueState>>,
    api: Arc<S>,
    local_refs: LocalRefStore,
    notifications: NotificationCenter,
    pacing_delay: Duration,
}

impl<S> Clone for ProcessingQueue<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            api: Arc::clone(&self.api),
            local_refs: self.local_refs.clone(),
            notifications: self.notifications.clone(),
            pacing_delay: self.pacing_delay,
        }
    }
}

impl<S: ScanApi> ProcessingQueue<S> {
    /// 创建空队列
    pub fn new(api: S, pacing_delay: Duration, notification_ttl: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            api: Arc::new(api),
            local_refs: LocalRefStore::new(),
            notifications: NotificationCenter::new(notification_ttl),
            pacing_delay,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ========== 条目管理 ==========

    /// 添加本地文件，每个文件生成一个 idle 条目
    pub fn add_files(&self, files: Vec<ImageBlob>) -> Vec<String> {
        let new_items: Vec<ScanItem> = files
            .into_iter()
            .map(|blob| {
                let reference = self.local_refs.create(&blob);
                ScanItem::from_blob(blob, reference)
            })
            .collect();

        let ids: Vec<String> = new_items.iter().map(|item| item.id.clone()).collect();
        debug!("添加 {} 个文件条目", ids.len());
        self.lock().items.extend(new_items);
        ids
    }

    /// 由已有图片地址添加一个条目
    pub fn add_generated_item(&self, url: impl Into<String>) -> String {
        let millis = chrono::Utc::now().timestamp_millis().to_string();
        let suffix = &millis[millis.len().saturating_sub(4)..];
        let item = ScanItem::from_url(url, format!("AI_Sample_{}.png", suffix));
        let id = item.id.clone();
        debug!("添加生成条目: {} ({})", item.display_name, item.original_location);
        self.lock().items.push(item);
        id
    }

    /// 删除条目；重复删除同一个 id 是空操作
    pub fn remove_item(&self, id: &str) -> bool {
        let removed = {
            let mut state = self.lock();
            state
                .items
                .iter()
                .position(|item| item.id == id)
                .map(|index| state.items.remove(index))
        };

        match removed {
            Some(item) => {
                self.local_refs.revoke(&item.original_location);
                info!("🗑️ 已移除: {}", item.display_name);
                true
            }
            None => false,
        }
    }

    /// 清空所有条目、标记和通知
    pub fn reset_all(&self) {
        let items = {
            let mut state = self.lock();
            state.is_processing = false;
            state.has_started = false;
            state.generation += 1;
            std::mem::take(&mut state.items)
        };
        for item in &items {
            self.local_refs.revoke(&item.original_location);
        }
        self.notifications.clear();
        info!("🔄 队列已重置，释放 {} 个条目", items.len());
    }

    /// 手动关闭通知
    pub fn dismiss_notification(&self, id: &str) {
        self.notifications.dismiss(id);
    }

    // ========== 只读视图 ==========

    pub fn items(&self) -> Vec<ScanItem> {
        self.lock().items.clone()
    }

    pub fn item(&self, id: &str) -> Option<ScanItem> {
        self.lock().items.iter().find(|item| item.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.live()
    }

    pub fn notification_center(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn api(&self) -> &S {
        &self.api
    }

    pub fn local_refs(&self) -> &LocalRefStore {
        &self.local_refs
    }

    pub fn is_processing(&self) -> bool {
        self.lock().is_processing
    }

    pub fn has_started(&self) -> bool {
        self.lock().has_started
    }

    pub fn progress(&self) -> Progress {
        let state = self.lock();
        let active: Vec<&ScanItem> = state
            .items
            .iter()
            .filter(|item| item.status != ProcessingStatus::Idle)
            .collect();

        let total = active.len();
        let completed = active
            .iter()
            .filter(|item| item.status == ProcessingStatus::Cropped)
            .count();
        let failed = active
            .iter()
            .filter(|item| item.status == ProcessingStatus::Error)
            .count();
        let percent = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        };

        Progress {
            completed,
            failed,
            total,
            percent,
            in_flight: active.iter().any(|item| item.status.is_in_flight()),
        }
    }

    // ========== 顺序处理 ==========

    /// 处理当前所有 idle 条目
    pub async fn start_processing(&self) -> BatchSummary {
        let (snapshot, generation) = {
            let mut state = self.lock();
            if state.is_processing {
                warn!("⚠️ 已有批次在处理中，忽略本次启动");
                return BatchSummary::default();
            }

            let ids: Vec<String> = state
                .items
                .iter()
                .filter(|item| item.status == ProcessingStatus::Idle)
                .map(|item| item.id.clone())
                .collect();
            if ids.is_empty() {
                return BatchSummary::default();
            }

            state.has_started = true;
            state.is_processing = true;
            (ids, state.generation)
        };

        info!("🚀 开始处理 {} 张图片", snapshot.len());
        let mut summary = BatchSummary::default();

        for item_id in &snapshot {
            match self.process_item(item_id).await {
                ItemOutcome::Skipped => {
                    summary.skipped += 1;
                    continue;
                }
                ItemOutcome::Cropped => {
                    summary.attempted += 1;
                    summary.cropped += 1;
                }
                ItemOutcome::Failed => {
                    summary.attempted += 1;
                    summary.failed += 1;
                }
            }

            tokio::time::sleep(self.pacing_delay).await;
        }

        {
            let mut state = self.lock();
            // 批次期间被重置过的话，标记归新状态所有
            if state.generation == generation {
                state.is_processing = false;
            }
        }

        info!(
            "✓ 批次完成: 成功 {} / 失败 {} / 跳过 {}",
            summary.cropped, summary.failed, summary.skipped
        );
        summary
    }

    async fn process_item(&self, item_id: &str) -> ItemOutcome {
        let source = {
            let state = self.lock();
            match state.items.iter().find(|item| item.id == item_id) {
                Some(item) => UploadSource {
                    display_name: item.display_name.clone(),
                    source_blob: item.source_blob.clone(),
                    original_location: item.original_location.clone(),
                },
                None => {
                    debug!("条目 {} 已被移除，跳过", item_id);
                    return ItemOutcome::Skipped;
                }
            }
        };
        let name = source.display_name.clone();

        // 1. 上传
        self.update_item(item_id, |item| item.status = ProcessingStatus::Uploading);
        info!("[图片 {}] 📤 正在上传...", name);

        let remote_path = match self.upload(source).await {
            Ok(path) => path,
            Err(e) => return self.fail(item_id, &name, e),
        };

        // 2. 检测 + 裁剪
        self.update_item(item_id, |item| {
            item.status = ProcessingStatus::Detecting;
            item.remote_location = Some(remote_path.clone());
        });
        info!("[图片 {}] 🔍 上传完成 ({})，正在识别...", name, remote_path);

        let first = self
            .api
            .predict_and_crop(std::slice::from_ref(&remote_path))
            .await
            .and_then(|results| results.into_iter().next().ok_or(ScanError::EmptyResult));

        match first {
            Ok(result) => {
                let processed = ProcessedResult {
                    preview_location: result.preview_url,
                    cropped_location: result.cropped_url,
                };
                self.update_item(item_id, move |item| {
                    item.status = ProcessingStatus::Cropped;
                    item.results = vec![processed];
                    item.error_message = None;
                });
                info!("[图片 {}] ✅ 处理完成", name);
                self.notifications
                    .notify(format!("图片 {} 处理完成", name), NotificationKind::Success);
                ItemOutcome::Cropped
            }
            Err(e) => self.fail(item_id, &name, e),
        }
    }

    /// 上传条目数据；没有本地文件时先取回原图
    async fn upload(&self, source: UploadSource) -> ScanResult<String> {
        let blob = match source.source_blob {
            Some(blob) => blob,
            None => {
                let bytes = self.resolve_bytes(&source.original_location).await?;
                ImageBlob::new(source.display_name, bytes)
            }
        };
        self.api.upload_image(&blob).await
    }

    async fn resolve_bytes(&self, location: &str) -> ScanResult<Vec<u8>> {
        if is_local_ref(location) {
            return self
                .local_refs
                .resolve(location)
                .map(|blob| blob.bytes)
                .ok_or_else(|| ScanError::conversion(format!("{} 已释放", location)));
        }
        self.api.fetch_bytes(location).await
    }

    fn fail(&self, item_id: &str, name: &str, err: ScanError) -> ItemOutcome {
        error!("[图片 {}] ❌ 处理失败 ({}): {}", name, err.kind(), err);
        let message = err.to_string();
        self.update_item(item_id, move |item| {
            item.status = ProcessingStatus::Error;
            item.error_message = Some(message);
        });
        self.notifications
            .notify(format!("图片 {} 处理失败", name), NotificationKind::Error);
        ItemOutcome::Failed
    }

    /// 按 id 更新条目，条目已不存在时静默忽略
    fn update_item(&self, item_id: &str, apply: impl FnOnce(&mut ScanItem)) -> bool {
        let mut state = self.lock();
        match state.items.iter_mut().find(|item| item.id == item_id) {
            Some(item) => {
                apply(item);
                true
            }
            None => {
                debug!("条目 {} 已不存在，忽略状态更新", item_id);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EngineResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 总是成功的内存引擎
    #[derive(Default)]
    struct OkEngine {
        uploads: AtomicUsize,
        predictions: AtomicUsize,
    }

    impl ScanApi for OkEngine {
        async fn upload_image(&self, blob: &ImageBlob) -> ScanResult<String> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(format!("/srv/{}", blob.name))
        }

        async fn predict_and_crop(&self, remote_paths: &[String]) -> ScanResult<Vec<EngineResult>> {
            self.predictions.fetch_add(1, Ordering::SeqCst);
            Ok(remote_paths
                .iter()
                .map(|p| EngineResult {
                    source_url: p.clone(),
                    preview_url: format!("{}.predict.png", p),
                    cropped_url: format!("{}.crop.png", p),
                })
                .collect())
        }

        async fn fetch_bytes(&self, _location: &str) -> ScanResult<Vec<u8>> {
            Ok(vec![0xAB])
        }
    }

    fn queue() -> ProcessingQueue<OkEngine> {
        ProcessingQueue::new(
            OkEngine::default(),
            Duration::from_millis(300),
            Duration::from_secs(3),
        )
    }

    fn blob(name: &str) -> ImageBlob {
        ImageBlob::new(name, vec![1, 2, 3])
    }

    #[tokio::test(start_paused = true)]
    async fn empty_start_is_a_noop() {
        let queue = queue();
        let summary = queue.start_processing().await;

        assert_eq!(summary, BatchSummary::default());
        assert!(!queue.has_started());
        assert!(!queue.is_processing());
        assert_eq!(queue.api.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn processes_items_in_order() {
        let queue = queue();
        queue.add_files(vec![blob("a.jpg"), blob("b.jpg")]);

        let summary = queue.start_processing().await;

        assert_eq!(summary.cropped, 2);
        assert!(queue.has_started());
        assert!(!queue.is_processing());
        let items = queue.items();
        assert_eq!(items[0].remote_location.as_deref(), Some("/srv/a.jpg"));
        assert_eq!(items[1].results[0].cropped_location, "/srv/b.jpg.crop.png");
        assert_eq!(queue.api.predictions.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn generated_items_are_named_and_fetched() {
        let queue = queue();
        let id = queue.add_generated_item("https://cdn.example.com/x.png");

        let item = queue.item(&id).unwrap();
        assert!(item.display_name.starts_with("AI_Sample_"));
        assert!(item.display_name.ends_with(".png"));
        assert_eq!(item.display_name.len(), "AI_Sample_0000.png".len());
        assert!(item.source_blob.is_none());

        queue.start_processing().await;
        assert_eq!(queue.item(&id).unwrap().status, ProcessingStatus::Cropped);
    }

    #[tokio::test(start_paused = true)]
    async fn remove_releases_local_reference() {
        let queue = queue();
        let ids = queue.add_files(vec![blob("a.jpg"), blob("b.jpg")]);
        assert_eq!(queue.local_refs().live_count(), 2);

        assert!(queue.remove_item(&ids[0]));
        assert!(!queue.remove_item(&ids[0]));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.local_refs().live_count(), 1);

        queue.reset_all();
        assert_eq!(queue.local_refs().live_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_counts_only_active_items() {
        let queue = queue();
        queue.add_files(vec![blob("a.jpg")]);
        assert_eq!(queue.progress(), Progress::default());

        queue.start_processing().await;
        queue.add_files(vec![blob("b.jpg")]);

        let progress = queue.progress();
        assert_eq!(progress.total, 1);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.percent, 100);
        assert!(!progress.in_flight);
    }
}
