//! 扫描条目数据模型

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// 处理状态
///
/// `Detected` 和 `Cropping` 保留在词表中供其他流程使用，队列自身不会设置它们
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Idle,
    Uploading,
    Detecting,
    Detected,
    Cropping,
    Cropped,
    Error,
}

impl ProcessingStatus {
    /// 是否为终态
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessingStatus::Cropped | ProcessingStatus::Error)
    }

    /// 是否正在与服务端交互
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            ProcessingStatus::Uploading | ProcessingStatus::Detecting | ProcessingStatus::Cropping
        )
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessingStatus::Idle => "idle",
            ProcessingStatus::Uploading => "uploading",
            ProcessingStatus::Detecting => "detecting",
            ProcessingStatus::Detected => "detected",
            ProcessingStatus::Cropping => "cropping",
            ProcessingStatus::Cropped => "cropped",
            ProcessingStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// 本地图片数据（相当于浏览器中的 File）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub name: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl ImageBlob {
    /// 根据文件名推断 MIME 类型
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = mime_for_name(&name).to_string();
        Self { name, bytes, mime }
    }
}

/// 按扩展名推断图片 MIME 类型
pub fn mime_for_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// 单个裁剪结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedResult {
    /// 带检测框的预览图
    pub preview_location: String,
    /// 最终裁剪图
    pub cropped_location: String,
}

/// 扫描条目
#[derive(Debug, Clone, Serialize)]
pub struct ScanItem {
    pub id: String,
    #[serde(skip)]
    pub source_blob: Option<ImageBlob>,
    pub original_location: String,
    pub remote_location: Option<String>,
    pub display_name: String,
    pub status: ProcessingStatus,
    pub results: Vec<ProcessedResult>,
    pub error_message: Option<String>,
}

impl ScanItem {
    /// 由本地文件创建条目
    pub fn from_blob(blob: ImageBlob, original_location: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            display_name: blob.name.clone(),
            source_blob: Some(blob),
            original_location,
            remote_location: None,
            status: ProcessingStatus::Idle,
            results: Vec::new(),
            error_message: None,
        }
    }

    /// 由已有地址创建条目
    pub fn from_url(url: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source_blob: None,
            original_location: url.into(),
            remote_location: None,
            display_name: display_name.into(),
            status: ProcessingStatus::Idle,
            results: Vec::new(),
            error_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_is_guessed_case_insensitively() {
        assert_eq!(mime_for_name("scan1.JPG"), "image/jpeg");
        assert_eq!(mime_for_name("a.b.png"), "image/png");
        assert_eq!(mime_for_name("noext"), "application/octet-stream");
    }

    #[test]
    fn new_items_are_idle_with_distinct_ids() {
        let a = ScanItem::from_url("http://x/a.png", "a.png");
        let b = ScanItem::from_url("http://x/a.png", "a.png");
        assert_eq!(a.status, ProcessingStatus::Idle);
        assert!(a.results.is_empty());
        assert!(a.error_message.is_none());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn terminal_statuses() {
        assert!(ProcessingStatus::Cropped.is_terminal());
        assert!(ProcessingStatus::Error.is_terminal());
        assert!(!ProcessingStatus::Detecting.is_terminal());
        assert!(ProcessingStatus::Cropping.is_in_flight());
        assert!(!ProcessingStatus::Detected.is_in_flight());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ProcessingStatus::Cropped).unwrap();
        assert_eq!(json, "\"cropped\"");
    }
}
