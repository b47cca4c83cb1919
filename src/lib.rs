//! # Batch Dispatch
//!
//! 并发批量调度：把条目切分成批次并发处理，每个条目经过一次外部探测，
//! 按规则分类后写入分类日志和结构化日志。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `ProxyRotator` - 固定代理池，确定性轮询
//!
//! ### ② 业务能力层（Services）
//! - `Probe` / `HttpProbe` / `BlockingProbe` - 外部探测能力
//! - `Classifier` - 有序规则分类
//! - `ResultLogger` - 分类日志 + NDJSON + 计数器
//! - `Notifier` - 带外通知
//! - `RunStore` - 运行记录存储
//!
//! ### ③ 流程层（Workflow）
//! - `ItemFlow` - 单个条目：取代理 → 限时探测 → 分类 → 记录 → 通知
//!
//! ### ④ 编排层（Orchestration）
//! - `Dispatcher` - 切分批次、并发、汇合
//! - `App` - 组装并启动

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, ProbeError};
pub use infrastructure::ProxyRotator;
pub use models::{Category, Outcome, ProxyHandle, RunStats, WorkItem};
pub use orchestrator::{App, DispatchOptions, DispatchState, Dispatcher, RunSummary};
pub use services::{Classifier, Notifier, Probe, RawResult, ResultLogger, RunStore};
pub use workflow::{ItemCtx, ItemFlow};
