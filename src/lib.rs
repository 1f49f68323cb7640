//! # Doc Scan Queue
//!
//! 一个批量上传文档图片、调用远程服务识别边界并裁剪的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有内存中的图片数据，只暴露能力
//! - `LocalRefStore` - 分配 / 解析 / 释放 `blob:` 本地引用
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - 与远程扫描服务通信
//! - `ScanApi` - 上传、识别裁剪、读取图片数据三种能力
//! - `ScanClient` - 基于 reqwest 的 HTTP 实现
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `NotificationCenter` - 短暂通知，到期自动移除
//! - `ResultExporter` - 保存裁剪结果
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/processing_queue` - 处理队列，严格顺序推进每个条目
//! - `orchestrator/batch_processor` - 命令行应用，加载图片、启动批次、导出结果
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use clients::{ScanApi, ScanClient};
pub use config::Config;
pub use error::{ScanError, ScanResult};
pub use infrastructure::LocalRefStore;
pub use models::{
    EngineResult, ImageBlob, Notification, NotificationKind, ProcessedResult, ProcessingStatus,
    ScanItem,
};
pub use orchestrator::{App, BatchSummary, ProcessingQueue, Progress};
pub use services::{NotificationCenter, ResultExporter};
