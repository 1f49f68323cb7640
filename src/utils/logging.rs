//! 日志工具模块
//!
//! 提供日志格式化和输出的辅助函数

use crate::models::{ProcessingStatus, ScanItem};
use crate::orchestrator::{BatchSummary, Progress};
use anyhow::Result;
use std::fs;
use tracing::{info, warn};

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n图片扫描处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `base_url`: 扫描服务地址
/// - `input_folder`: 输入目录
pub fn log_startup(base_url: &str, input_folder: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 顺序扫描处理模式");
    info!("🌐 扫描服务: {}", base_url);
    info!("📂 输入目录: {}", input_folder);
    info!("{}", "=".repeat(60));
}

/// 记录图片加载信息
pub fn log_items_loaded(total: usize) {
    info!("✓ 找到 {} 张待处理的图片", total);
    info!("💡 将逐张上传并识别\n");
}

/// 记录单个条目的最终状态
///
/// # 参数
/// - `item`: 扫描条目
/// - `verbose`: 是否输出结果地址
///
/// # 返回
/// 条目是否已到达终态
pub fn log_item_finished(item: &ScanItem, verbose: bool) -> bool {
    if !item.status.is_terminal() {
        info!("⏸️ {} -> {}", item.display_name, item.status);
        return false;
    }

    if item.status == ProcessingStatus::Cropped {
        info!("✅ {} -> {} 个结果", item.display_name, item.results.len());
        if verbose {
            for (i, result) in item.results.iter().enumerate() {
                info!(
                    "   {}. 预览: {} | 裁剪: {}",
                    i + 1,
                    result.preview_location,
                    result.cropped_location
                );
            }
        }
    } else {
        warn!(
            "❌ {} -> {}",
            item.display_name,
            truncate_text(item.error_message.as_deref().unwrap_or_default(), 120)
        );
    }
    true
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 批次统计
/// - `progress`: 队列进度
/// - `exported`: 导出的文件数
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(
    summary: &BatchSummary,
    progress: &Progress,
    exported: usize,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{} ({}%)", progress.completed, progress.total, progress.percent);
    info!("❌ 失败: {}", summary.failed);
    info!("⏭️ 跳过: {}", summary.skipped);
    info!("💾 导出: {} 个文件", exported);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
