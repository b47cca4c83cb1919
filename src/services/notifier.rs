//! 带外通知能力

use async_trait::async_trait;
use tracing::info;

use crate::models::Category;

/// 通知接口，实现方负责把消息送达外部渠道
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, category: Category, message: &str) -> anyhow::Result<()>;
}

/// 只写日志的通知实现
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, category: Category, message: &str) -> anyhow::Result<()> {
        info!("🔔 [{}] {}", category, message);
        Ok(())
    }
}

/// 什么都不做
#[derive(Debug, Default, Clone)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _category: Category, _message: &str) -> anyhow::Result<()> {
        Ok(())
    }
}
