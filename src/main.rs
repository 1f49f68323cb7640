use anyhow::Result;
use doc_scan_queue::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 加载配置（可通过第一个参数指定配置文件）
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "scan_config.toml".to_string());
    let config = Config::load(&config_path)?;

    // 初始化并运行应用
    let _summary = App::initialize(config).await?.run().await?;

    Ok(())
}
