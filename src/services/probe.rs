//! 外部探测能力
//!
//! 调度器只认识 `Probe` 这一个接口：异步实现直接实现 trait，
//! 阻塞实现用 `BlockingProbe` 包一层，放到阻塞线程池里跑。

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ProbeError;
use crate::models::{ProxyHandle, WorkItem};

/// 外部调用返回的原始、未分类结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResult {
    /// 供分类规则匹配的文本
    pub text: String,
    /// 附带的结构化信息，原样并入 `Outcome::details`
    pub details: BTreeMap<String, JsonValue>,
}

impl RawResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// 外部探测能力
///
/// `timeout` 是调用方给出的时限，实现可以用它设置自己的请求超时；
/// 无论实现是否遵守，调用方都会在时限到达后强制放弃。
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(
        &self,
        item: &WorkItem,
        proxy: Option<&ProxyHandle>,
        timeout: Duration,
    ) -> Result<RawResult, ProbeError>;
}

/// 把阻塞函数适配成 `Probe`
pub struct BlockingProbe<F> {
    func: Arc<F>,
}

impl<F> BlockingProbe<F>
where
    F: Fn(&WorkItem, Option<&ProxyHandle>) -> Result<RawResult, ProbeError> + Send + Sync + 'static,
{
    pub fn new(func: F) -> Self {
        Self { func: Arc::new(func) }
    }
}

#[async_trait]
impl<F> Probe for BlockingProbe<F>
where
    F: Fn(&WorkItem, Option<&ProxyHandle>) -> Result<RawResult, ProbeError> + Send + Sync + 'static,
{
    async fn probe(
        &self,
        item: &WorkItem,
        proxy: Option<&ProxyHandle>,
        _timeout: Duration,
    ) -> Result<RawResult, ProbeError> {
        let func = self.func.clone();
        let item = item.clone();
        let proxy = proxy.cloned();

        match tokio::task::spawn_blocking(move || func(&item, proxy.as_ref())).await {
            Ok(result) => result,
            // 阻塞函数 panic：继续向上抛出，由条目边界统一转换
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(ProbeError::Transport(format!("阻塞任务被取消: {}", e))),
        }
    }
}
