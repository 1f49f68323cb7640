//! 错误类型
//!
//! 单个图片在流水线中可能遇到的所有错误。
//! 这些错误在条目层面统一收敛为 `error` 状态 + 错误信息 + 错误通知，
//! 不会中断整个批次。

use thiserror::Error;

/// 扫描流水线错误
#[derive(Debug, Error)]
pub enum ScanError {
    /// 上传失败（网络错误、服务端显式报错、缺少 local_path）
    #[error("{message}")]
    Upload { message: String },

    /// 无法从非文件来源构造上传数据
    #[error("Failed to prepare image for upload: {message}")]
    Conversion { message: String },

    /// 识别/裁剪请求失败或响应无法解析
    #[error("Prediction failed: {message}")]
    Prediction { message: String },

    /// 引擎成功返回但结果为空
    #[error("No results returned from API")]
    EmptyResult,
}

impl ScanError {
    /// 创建上传错误
    pub fn upload(message: impl Into<String>) -> Self {
        ScanError::Upload {
            message: message.into(),
        }
    }

    /// 创建转换错误
    pub fn conversion(message: impl Into<String>) -> Self {
        ScanError::Conversion {
            message: message.into(),
        }
    }

    /// 创建识别错误
    pub fn prediction(message: impl Into<String>) -> Self {
        ScanError::Prediction {
            message: message.into(),
        }
    }

    /// 错误类别（仅用于日志）
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::Upload { .. } => "upload",
            ScanError::Conversion { .. } => "conversion",
            ScanError::Prediction { .. } => "prediction",
            ScanError::EmptyResult => "empty_result",
        }
    }
}

/// 流水线结果类型
pub type ScanResult<T> = Result<T, ScanError>;
