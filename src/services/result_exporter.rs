//! 结果导出服务 - 业务能力层
//!
//! 只负责"把裁剪结果保存到本地"能力

use crate::clients::ScanApi;
use crate::models::{ProcessingStatus, ScanItem};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 结果导出服务
///
/// 职责：
/// - 下载每个已裁剪条目的裁剪图
/// - 按 `原名_processed[_序号].扩展名` 命名写入输出目录
/// - 单个文件下载失败只记录警告
pub struct ResultExporter {
    output_folder: PathBuf,
}

impl ResultExporter {
    pub fn new(output_folder: impl Into<PathBuf>) -> Self {
        Self {
            output_folder: output_folder.into(),
        }
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    /// 导出所有已裁剪条目，返回写入的文件路径
    pub async fn export<S: ScanApi>(&self, api: &S, items: &[ScanItem]) -> Result<Vec<PathBuf>> {
        let cropped: Vec<&ScanItem> = items
            .iter()
            .filter(|item| item.status == ProcessingStatus::Cropped)
            .collect();

        if cropped.is_empty() {
            return Ok(Vec::new());
        }

        tokio::fs::create_dir_all(&self.output_folder)
            .await
            .with_context(|| format!("无法创建输出目录: {}", self.output_folder.display()))?;

        let mut written = Vec::new();
        for item in cropped {
            let total = item.results.len();
            for (index, result) in item.results.iter().enumerate() {
                if result.cropped_location.is_empty() {
                    continue;
                }

                let bytes = match api.fetch_bytes(&result.cropped_location).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("⚠️ 下载失败 {}: {}", result.cropped_location, e);
                        continue;
                    }
                };

                let path = self
                    .output_folder
                    .join(export_name(&item.display_name, index, total));
                tokio::fs::write(&path, bytes)
                    .await
                    .with_context(|| format!("无法写入文件: {}", path.display()))?;
                info!("💾 已保存: {}", path.display());
                written.push(path);
            }
        }

        Ok(written)
    }
}

/// 生成导出文件名
///
/// 只有一个结果时不加序号
pub fn export_name(display_name: &str, index: usize, total: usize) -> String {
    let (stem, ext) = match display_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, ext),
        _ => (display_name, "jpg"),
    };
    let suffix = if total > 1 {
        format!("_{}", index + 1)
    } else {
        String::new()
    };
    format!("{}_processed{}.{}", stem, suffix, ext)
}
