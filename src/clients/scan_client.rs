/// 扫描服务 API 客户端
///
/// 封装所有与边界检测/裁剪服务相关的调用逻辑
use crate::config::Config;
use crate::error::{ScanError, ScanResult};
use crate::models::scan::{PredictRequest, PredictResponse, UploadResponse};
use crate::models::{EngineResult, ImageBlob};
use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use tracing::{debug, error};

/// 扫描服务能力
///
/// 队列只通过这个 trait 访问远程引擎，测试中可以换成内存实现
#[allow(async_fn_in_trait)]
pub trait ScanApi {
    /// 上传单张图片，返回服务端路径
    async fn upload_image(&self, blob: &ImageBlob) -> ScanResult<String>;

    /// 对已上传的图片执行检测和裁剪
    async fn predict_and_crop(&self, remote_paths: &[String]) -> ScanResult<Vec<EngineResult>>;

    /// 读取某个地址背后的图片数据
    async fn fetch_bytes(&self, location: &str) -> ScanResult<Vec<u8>>;
}

/// 扫描服务 HTTP 客户端
#[derive(Clone)]
pub struct ScanClient {
    http: Client,
    base_url: String,
}

impl ScanClient {
    /// 创建新的扫描服务客户端
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self {
            http,
            base_url: config.scan_api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl ScanApi for ScanClient {
    async fn upload_image(&self, blob: &ImageBlob) -> ScanResult<String> {
        let url = self.endpoint("/api/upload");
        debug!("上传图片: {} ({} 字节) -> {}", blob.name, blob.bytes.len(), url);

        let part = Part::bytes(blob.bytes.clone())
            .file_name(blob.name.clone())
            .mime_str(&blob.mime)
            .map_err(|e| ScanError::upload(format!("Upload failed: {}", e)))?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("ScanService Upload Error: {}", e);
                ScanError::upload(format!("Upload failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("ScanService Upload Error: HTTP {}", status);
            return Err(ScanError::upload(format!(
                "Upload failed: {}",
                status_text(status)
            )));
        }

        let data: UploadResponse = response
            .json()
            .await
            .map_err(|e| ScanError::upload(format!("Upload failed: {}", e)))?;

        interpret_upload(data)
    }

    async fn predict_and_crop(&self, remote_paths: &[String]) -> ScanResult<Vec<EngineResult>> {
        let url = self.endpoint("/api/predict_and_crop");
        debug!("请求识别裁剪: {:?}", remote_paths);

        let response = self
            .http
            .post(&url)
            .json(&PredictRequest {
                images: remote_paths,
            })
            .send()
            .await
            .map_err(|e| {
                error!("ScanService Predict Error: {}", e);
                ScanError::prediction(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("ScanService Predict Error: HTTP {}", status);
            return Err(ScanError::prediction(status_text(status)));
        }

        let data: PredictResponse = response
            .json()
            .await
            .map_err(|e| ScanError::prediction(format!("malformed response: {}", e)))?;

        debug!("识别任务 {:?} 返回", data.task_id);
        Ok(interpret_predict(data))
    }

    async fn fetch_bytes(&self, location: &str) -> ScanResult<Vec<u8>> {
        let target = resolve_location(&self.base_url, location);
        debug!("读取图片数据: {:?}", target);

        match target {
            Location::Remote(url) => {
                let response = self
                    .http
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| ScanError::conversion(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ScanError::conversion(format!(
                        "GET {} returned {}",
                        url,
                        status_text(status)
                    )));
                }
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| ScanError::conversion(e.to_string()))?;
                Ok(bytes.to_vec())
            }
            Location::File(path) => tokio::fs::read(&path)
                .await
                .map_err(|e| ScanError::conversion(format!("{}: {}", path, e))),
        }
    }
}

/// 地址解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Remote(String),
    File(String),
}

/// 决定一个地址应该通过 HTTP 获取还是从本地文件读取
///
/// - `http(s)://` 直接请求
/// - 以 `/` 开头且配置了服务地址时，拼到服务地址后
/// - 其余（含 `file://`）按本地路径处理
pub fn resolve_location(base_url: &str, location: &str) -> Location {
    if location.starts_with("http://") || location.starts_with("https://") {
        Location::Remote(location.to_string())
    } else if location.starts_with('/') && !base_url.is_empty() {
        Location::Remote(format!("{}{}", base_url, location))
    } else {
        let path = location.strip_prefix("file://").unwrap_or(location);
        Location::File(path.to_string())
    }
}

/// 检查上传响应
pub fn interpret_upload(data: UploadResponse) -> ScanResult<String> {
    if data.status.as_deref() == Some("error") {
        return Err(ScanError::upload(
            data.message.unwrap_or_else(|| "Upload failed".to_string()),
        ));
    }

    match data.local_path {
        Some(path) if !path.is_empty() => Ok(path),
        _ => Err(ScanError::upload(
            "Upload successful but no local_path returned",
        )),
    }
}

/// 提取识别结果，缺少 results 字段视为空
pub fn interpret_predict(data: PredictResponse) -> Vec<EngineResult> {
    data.results
        .unwrap_or_default()
        .into_iter()
        .map(EngineResult::from)
        .collect()
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}
