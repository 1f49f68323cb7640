use crate::models::item::ImageBlob;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp", "tif", "tiff"];

/// 判断文件扩展名是否为支持的图片格式
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// 读取单个图片文件
pub async fn load_image(path: &Path) -> Result<ImageBlob> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("无法读取图片: {}", path.display()))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "image.jpg".to_string());

    Ok(ImageBlob::new(name, bytes))
}

/// 从文件夹中加载所有图片，按文件名排序
pub async fn load_all_images(folder_path: &str) -> Result<Vec<ImageBlob>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && is_supported_image(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut blobs = Vec::with_capacity(paths.len());
    for path in paths {
        match load_image(&path).await {
            Ok(blob) => {
                tracing::info!("正在加载: {} ({} 字节)", blob.name, blob.bytes.len());
                blobs.push(blob);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(blobs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_filter() {
        assert!(is_supported_image(Path::new("a/scan.JPG")));
        assert!(is_supported_image(Path::new("scan.tiff")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("README")));
    }

    #[tokio::test]
    async fn loads_only_images_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"png-bytes").unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"jpg-bytes").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();

        let blobs = load_all_images(dir.path().to_str().unwrap()).await.unwrap();

        let names: Vec<_> = blobs.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);
        assert_eq!(blobs[0].mime, "image/jpeg");
        assert_eq!(blobs[1].bytes, b"png-bytes");
    }

    #[tokio::test]
    async fn missing_folder_is_an_error() {
        let result = load_all_images("no/such/folder").await;
        tokio_test::assert_err!(result);
    }
}
