//! 编排层（Orchestration Layer）
//!
//! ### `batch_processor` - 应用入口
//! - 加载配置、代理、条目
//! - 组装探测 / 分类 / 通知 / 运行记录
//!
//! ### `dispatcher` - 批量调度器
//! - 切分批次、并发执行、等待汇合
//! - 输出统计
//!
//! ```text
//! batch_processor (组装资源)
//!     ↓
//! dispatcher (处理 Vec<WorkItem>，切分批次、并发、汇合)
//!     ↓
//! workflow::ItemFlow (处理单个 WorkItem)
//!     ↓
//! services (能力层：probe / classifier / result_logger / notifier / run_store)
//!     ↓
//! infrastructure (共享资源：ProxyRotator)
//! ```

pub mod batch_processor;
pub mod dispatcher;

pub use batch_processor::App;
pub use dispatcher::{partition, DispatchOptions, DispatchState, Dispatcher, RunSummary};
