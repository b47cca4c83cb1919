//! 代理端点

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 代理句柄，加载后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyHandle {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyHandle {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            password: None,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// 代理地址（不含凭据，凭据通过 basic auth 单独传递）
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// 只显示 host:port，避免把密码写进日志
impl fmt::Display for ProxyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// 解析 `host:port` 或 `host:port:user:pass`
impl FromStr for ProxyHandle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        let (host, port) = match parts.as_slice() {
            [host, port] | [host, port, _, _] => (*host, *port),
            _ => return Err(format!("代理格式应为 host:port[:user:pass]，实际为 '{}'", s)),
        };

        if host.is_empty() {
            return Err(format!("代理主机为空: '{}'", s));
        }

        let port: u16 = port
            .parse()
            .map_err(|_| format!("代理端口无效: '{}'", port))?;

        let handle = ProxyHandle::new(host, port);
        match parts.as_slice() {
            [_, _, user, pass] => Ok(handle.with_credentials(*user, *pass)),
            _ => Ok(handle),
        }
    }
}
