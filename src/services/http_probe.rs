//! 基于 HTTP 的探测实现
//!
//! 对 `url_template` 发起 GET，`{item}` 被替换成 URL 编码后的条目。
//! 用于检查自己部署的服务（例如沙箱环境）的行为。

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::ProbeError;
use crate::models::{ProxyHandle, WorkItem};
use crate::services::probe::{Probe, RawResult};

/// HTTP 探测
pub struct HttpProbe {
    url_template: String,
    direct_client: Client,
}

impl HttpProbe {
    pub fn new(url_template: impl Into<String>) -> Result<Self, ProbeError> {
        let direct_client = Client::builder().build()?;
        Ok(Self {
            url_template: url_template.into(),
            direct_client,
        })
    }

    /// 生成请求地址
    pub fn url_for(&self, item: &WorkItem) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(item.as_str().as_bytes()).collect();
        self.url_template.replace("{item}", &encoded)
    }

    fn client_for(&self, proxy: Option<&ProxyHandle>) -> Result<Client, ProbeError> {
        let Some(proxy) = proxy else {
            return Ok(self.direct_client.clone());
        };

        let mut reqwest_proxy = reqwest::Proxy::all(proxy.url())
            .map_err(|e| ProbeError::Transport(format!("代理 {} 无效: {}", proxy, e)))?;
        if let (Some(user), Some(pass)) = (&proxy.username, &proxy.password) {
            reqwest_proxy = reqwest_proxy.basic_auth(user, pass);
        }

        Ok(Client::builder().proxy(reqwest_proxy).build()?)
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(
        &self,
        item: &WorkItem,
        proxy: Option<&ProxyHandle>,
        timeout: Duration,
    ) -> Result<RawResult, ProbeError> {
        let url = self.url_for(item);
        debug!("GET {} (代理: {:?})", url, proxy.map(|p| p.to_string()));

        let client = self.client_for(proxy)?;
        let response = client.get(&url).timeout(timeout).send().await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RawResult::new(format!("HTTP {}\n{}", status, body)).with_detail("status", status))
    }
}
