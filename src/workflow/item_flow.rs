//! 单个条目处理流程 - 流程层
//!
//! 流程顺序：
//! 1. 从轮换器取代理（可能没有）
//! 2. 在时限内调用外部探测，超时记为 `Error` / "Timeout"
//! 3. 按规则表分类原始结果
//! 4. 写入结果日志并更新计数
//! 5. 命中通知分类时发送通知
//!
//! 条目内的任何失败（包括探测 panic）都在这里变成 `Outcome`，不会向上传播。

use futures::FutureExt;
use rand::Rng;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::ProbeError;
use crate::infrastructure::ProxyRotator;
use crate::models::{Category, Outcome, ProxyHandle, WorkItem};
use crate::services::{Classifier, Notifier, Probe, ResultLogger};
use crate::utils::logging::truncate_text;
use crate::workflow::item_ctx::ItemCtx;

/// 单个条目处理流程
///
/// - 不持有条目列表
/// - 共享资源（代理池、日志、计数器）都通过 `Arc` 注入
pub struct ItemFlow {
    probe: Arc<dyn Probe>,
    rotator: Arc<ProxyRotator>,
    classifier: Arc<Classifier>,
    logger: Arc<ResultLogger>,
    notifier: Arc<dyn Notifier>,
    notify_categories: Vec<Category>,
    timeout: Duration,
    delay: Option<(Duration, Duration)>,
}

impl ItemFlow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        probe: Arc<dyn Probe>,
        rotator: Arc<ProxyRotator>,
        classifier: Arc<Classifier>,
        logger: Arc<ResultLogger>,
        notifier: Arc<dyn Notifier>,
        notify_categories: Vec<Category>,
        timeout: Duration,
        delay: Option<(Duration, Duration)>,
    ) -> Self {
        Self {
            probe,
            rotator,
            classifier,
            logger,
            notifier,
            notify_categories,
            timeout,
            delay,
        }
    }

    pub fn logger(&self) -> &ResultLogger {
        &self.logger
    }

    /// 处理一个条目并返回记录下来的结果
    pub async fn run(&self, item: &WorkItem, ctx: &ItemCtx) -> Outcome {
        let proxy = self.rotator.next();
        let outcome = self.evaluate(item, proxy.as_ref()).await;

        self.log_outcome(ctx, item, &outcome, proxy.as_ref());
        self.persist(item, &outcome, proxy.as_ref());

        if self.notify_categories.contains(&outcome.category) {
            let message = format!("{} | {}", item, outcome.message);
            if let Err(e) = self.notifier.notify(outcome.category, &message).await {
                warn!("{} ⚠️ 通知发送失败: {}", ctx, e);
            }
        }

        outcome
    }

    /// 调用外部探测并分类，不写日志
    pub async fn evaluate(&self, item: &WorkItem, proxy: Option<&ProxyHandle>) -> Outcome {
        let call = AssertUnwindSafe(self.probe.probe(item, proxy, self.timeout)).catch_unwind();

        match tokio::time::timeout(self.timeout, call).await {
            Err(_) => Outcome::from_probe_error(&ProbeError::Timeout),
            Ok(Err(panic)) => Outcome::panicked(panic_message(panic.as_ref())),
            Ok(Ok(Err(probe_error))) => Outcome::from_probe_error(&probe_error),
            Ok(Ok(Ok(raw))) => self.classifier.classify(&raw),
        }
    }

    /// 写入结果，失败时记录错误而不中断批次
    pub fn persist(&self, item: &WorkItem, outcome: &Outcome, proxy: Option<&ProxyHandle>) {
        if let Err(e) = self.logger.record(item, outcome, proxy) {
            error!("❌ 结果写入失败 ({}): {}", item, e);
        }
    }

    /// 条目间随机等待，未配置时立即返回
    pub async fn pause(&self) {
        let Some((min, max)) = self.delay else {
            return;
        };

        let millis = rand::thread_rng().gen_range(min.as_millis() as u64..=max.as_millis() as u64);
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    fn log_outcome(&self, ctx: &ItemCtx, item: &WorkItem, outcome: &Outcome, proxy: Option<&ProxyHandle>) {
        let icon = match outcome.category {
            Category::Success => "✅",
            Category::SoftFailure => "🔁",
            Category::HardFailure => "❌",
            Category::Error => "⚠️",
        };
        info!(
            "{} {} {} → {} ({}) 代理: {}",
            ctx,
            icon,
            truncate_text(item.as_str(), 40),
            outcome.category,
            truncate_text(&outcome.message, 80),
            proxy.map(|p| p.to_string()).unwrap_or_else(|| "无".to_string())
        );
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
