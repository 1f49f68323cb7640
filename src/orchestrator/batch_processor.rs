//! 批量扫描处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，扮演界面层的角色向队列发出操作。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写入日志文件头、创建扫描服务客户端和处理队列
//! 2. **批量加载**：扫描输入目录中的图片，加入队列；附加配置中的图片地址
//! 3. **顺序处理**：启动一个批次，等待队列处理完所有条目
//! 4. **结果导出**：把裁剪结果保存到输出目录
//! 5. **全局统计**：汇总并输出处理结果

use crate::clients::ScanClient;
use crate::config::Config;
use crate::orchestrator::processing_queue::{BatchSummary, ProcessingQueue};
use crate::services::ResultExporter;
use crate::utils::logging::{
    init_log_file, log_item_finished, log_items_loaded, log_startup, print_final_stats,
};
use anyhow::Result;
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    queue: ProcessingQueue<ScanClient>,
    client: ScanClient,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config.scan_api_base_url, &config.input_folder);

        let client = ScanClient::new(&config)?;
        let queue = ProcessingQueue::new(
            client.clone(),
            config.pacing_delay(),
            config.notification_ttl(),
        );

        Ok(Self {
            config,
            queue,
            client,
        })
    }

    pub fn queue(&self) -> &ProcessingQueue<ScanClient> {
        &self.queue
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<BatchSummary> {
        let added = self.load_items().await?;

        if added == 0 {
            warn!("⚠️ 没有找到待处理的图片，程序结束");
            return Ok(BatchSummary::default());
        }

        log_items_loaded(added);

        let summary = self.queue.start_processing().await;

        let items = self.queue.items();
        let unfinished = items
            .iter()
            .filter(|item| !log_item_finished(item, self.config.verbose_logging))
            .count();
        if unfinished > 0 {
            warn!("⚠️ {} 张图片未处理完成", unfinished);
        }

        let exporter = ResultExporter::new(&self.config.output_folder);
        let written = exporter.export(&self.client, &items).await?;

        print_final_stats(
            &summary,
            &self.queue.progress(),
            written.len(),
            &self.config.output_log_file,
        );

        Ok(summary)
    }

    /// 加载输入目录中的图片和额外地址，返回加入队列的数量
    async fn load_items(&self) -> Result<usize> {
        info!("\n📁 正在扫描待处理的图片...");

        let blobs = if std::path::Path::new(&self.config.input_folder).exists() {
            crate::models::load_all_images(&self.config.input_folder).await?
        } else {
            warn!("输入目录不存在: {}", self.config.input_folder);
            Vec::new()
        };

        let mut added = self.queue.add_files(blobs).len();
        for url in &self.config.extra_image_urls {
            self.queue.add_generated_item(url.clone());
            added += 1;
        }

        Ok(added)
    }
}
