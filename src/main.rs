use anyhow::Result;
use batch_dispatch::utils::logging;
use batch_dispatch::{App, Config};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（CONFIG_FILE 不存在时使用默认值 + 环境变量）
    let config_path = PathBuf::from(std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string()));
    let config = Config::load(Some(&config_path))?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
