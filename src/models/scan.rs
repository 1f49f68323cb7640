//! 扫描服务的请求/响应结构

use serde::{Deserialize, Serialize};

/// `/api/upload` 响应
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub local_path: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `/api/predict_and_crop` 请求体
#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest<'a> {
    pub images: &'a [String],
}

/// `/api/predict_and_crop` 响应
#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<BackendScanResult>>,
}

/// 引擎返回的单个结果（原始字段名）
#[derive(Debug, Clone, Deserialize)]
pub struct BackendScanResult {
    #[serde(default)]
    pub img: String,
    #[serde(default)]
    pub predict_img: String,
    #[serde(default)]
    pub crop_img: String,
}

/// 归一化后的引擎结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResult {
    pub source_url: String,
    pub preview_url: String,
    pub cropped_url: String,
}

impl From<BackendScanResult> for EngineResult {
    fn from(r: BackendScanResult) -> Self {
        Self {
            source_url: r.img,
            preview_url: r.predict_img,
            cropped_url: r.crop_img,
        }
    }
}
