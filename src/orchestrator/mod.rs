//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `processing_queue` - 处理队列
//! - 持有所有扫描条目（Vec<ScanItem>）及批次标记
//! - 快照 idle 条目，逐个执行 上传 → 识别裁剪
//! - 容忍处理过程中删除条目
//! - 推送成功/失败通知
//!
//! ### `batch_processor` - 命令行应用
//! - 管理应用生命周期（初始化、运行、导出）
//! - 从输入目录加载图片并加入队列
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (App)
//!     ↓
//! processing_queue (处理 Vec<ScanItem>)
//!     ↓
//! services (能力层：notification / export)
//!     ↓
//! clients (ScanApi) + infrastructure (LocalRefStore)
//! ```

pub mod batch_processor;
pub mod processing_queue;

// 重新导出主要类型
pub use batch_processor::App;
pub use processing_queue::{BatchSummary, ProcessingQueue, Progress};
