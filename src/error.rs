//! 错误类型
//!
//! - `ProbeError`：外部探测调用本身的失败（超时、传输、协议）
//! - `AppError`：调度框架自身的错误（配置、文件、状态）
//!
//! 单个条目的错误永远不会越过调度器，它们在条目边界被转换成 `Outcome`。

use thiserror::Error;

/// 外部探测调用错误
#[derive(Debug, Error)]
pub enum ProbeError {
    /// 超过调用方给定的时限
    #[error("Timeout")]
    Timeout,

    /// 网络 / DNS / TLS 失败
    #[error("TransportError: {0}")]
    Transport(String),

    /// 响应结构不符合预期
    #[error("ProtocolError: {0}")]
    Protocol(String),
}

impl ProbeError {
    /// 写入结构化明细的 `kind` 字段
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Timeout => "timeout",
            ProbeError::Transport(_) => "transport",
            ProbeError::Protocol(_) => "protocol",
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeError::Timeout
        } else if err.is_decode() {
            ProbeError::Protocol(err.to_string())
        } else {
            ProbeError::Transport(err.to_string())
        }
    }
}

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 文件操作错误
    #[error("文件错误 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON 序列化 / 反序列化失败
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML 解析失败
    #[error("TOML解析失败: {0}")]
    Toml(#[from] toml::de::Error),

    /// 正则表达式无效
    #[error("无效的正则表达式: {0}")]
    Regex(#[from] regex::Error),

    /// 调度器状态不允许该操作
    #[error("状态错误: {0}")]
    InvalidState(String),

    /// 互斥锁被污染（持锁线程 panic）
    #[error("锁已被污染: {0}")]
    LockPoisoned(&'static str),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件错误
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
