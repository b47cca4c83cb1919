//! 应用入口 - 编排层
//!
//! 负责组装所有能力并启动一次调度：
//!
//! 1. **应用初始化**：加载代理、构建分类器 / 探测 / 通知 / 运行记录
//! 2. **加载条目**：读取输入文件
//! 3. **委托调度**：交给 `Dispatcher` 切分并发处理

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::config::Config;
use crate::infrastructure::ProxyRotator;
use crate::models::{load_proxies, load_work_items};
use crate::orchestrator::dispatcher::{DispatchOptions, Dispatcher, RunSummary};
use crate::services::{Classifier, HttpProbe, JsonFileRunStore, LogNotifier};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    dispatcher: Dispatcher,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate().context("配置校验失败")?;
        logging::log_startup(&config);

        let proxies = match &config.proxy_file {
            Some(path) => load_proxies(Path::new(path)).await?,
            None => Vec::new(),
        };
        if proxies.is_empty() {
            warn!("⚠️ 没有可用代理，所有请求直接发出");
        }

        let classifier = Classifier::from_config(&config.rules).context("分类规则无效")?;
        let probe = HttpProbe::new(config.probe_url_template.clone()).context("无法创建 HTTP 客户端")?;

        let dispatcher = Dispatcher::new(
            DispatchOptions::from(&config),
            Arc::new(probe),
            Arc::new(ProxyRotator::new(proxies)),
            Arc::new(classifier),
            Arc::new(LogNotifier),
            Arc::new(JsonFileRunStore::new(&config.run_store_file)),
        );

        Ok(Self { config, dispatcher })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<Option<RunSummary>> {
        let items = load_work_items(Path::new(&self.config.input_file)).await?;

        if items.is_empty() {
            warn!("⚠️ 没有找到待处理的条目，程序结束");
            return Ok(None);
        }

        let summary = self.dispatcher.run(items).await?;
        Ok(Some(summary))
    }
}
