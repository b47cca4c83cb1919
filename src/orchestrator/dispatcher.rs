//! 批量调度器 - 编排层
//!
//! ## 职责
//!
//! 1. **切分**：把条目列表切成 N 个连续批次（N = 并发数）
//! 2. **并发**：每个批次一个 `tokio::spawn` 任务，批次内顺序处理
//! 3. **汇合**：等待所有批次结束后才返回
//! 4. **统计**：写 `stats.json`、存入运行记录、输出汇总
//!
//! 状态只能前进：`Idle -> Running -> Complete`，没有暂停和恢复。
//! 没有全局取消，已开始的批次一定把分到的条目处理完。

use chrono::Local;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::ProxyRotator;
use crate::models::{Category, Outcome, RunStats, WorkItem};
use crate::services::{Classifier, Notifier, Probe, ResultLogger, RunStore};
use crate::utils::logging;
use crate::workflow::{ItemCtx, ItemFlow};

/// 调度器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Running,
    Complete,
}

/// 调度参数
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub concurrency: usize,
    pub probe_timeout: Duration,
    pub item_delay: Option<(Duration, Duration)>,
    pub notify_categories: Vec<Category>,
    pub output_dir: PathBuf,
}

impl From<&Config> for DispatchOptions {
    fn from(config: &Config) -> Self {
        Self {
            concurrency: config.concurrency,
            probe_timeout: config.probe_timeout(),
            item_delay: config.item_delay(),
            notify_categories: config.notify_categories.clone(),
            output_dir: config.output_path(),
        }
    }
}

/// 一次运行的结果
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// 运行目录名，同时作为运行记录的键
    pub run_id: String,
    pub run_dir: PathBuf,
    pub stats: RunStats,
}

/// 批量调度器
pub struct Dispatcher {
    options: DispatchOptions,
    probe: Arc<dyn Probe>,
    rotator: Arc<ProxyRotator>,
    classifier: Arc<Classifier>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn RunStore>,
    state: Mutex<DispatchState>,
}

impl Dispatcher {
    pub fn new(
        options: DispatchOptions,
        probe: Arc<dyn Probe>,
        rotator: Arc<ProxyRotator>,
        classifier: Arc<Classifier>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn RunStore>,
    ) -> Self {
        Self {
            options,
            probe,
            rotator,
            classifier,
            notifier,
            store,
            state: Mutex::new(DispatchState::Idle),
        }
    }

    pub fn state(&self) -> DispatchState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 处理全部条目，所有批次结束后返回
    ///
    /// 只能在 `Idle` 状态调用一次；运行结束后无论成败都进入 `Complete`。
    pub async fn run(&self, items: Vec<WorkItem>) -> AppResult<RunSummary> {
        self.transition(DispatchState::Idle, DispatchState::Running)?;
        let result = self.execute(items).await;
        self.transition(DispatchState::Running, DispatchState::Complete)?;
        result
    }

    async fn execute(&self, items: Vec<WorkItem>) -> AppResult<RunSummary> {
        let logger = Arc::new(ResultLogger::create(&self.options.output_dir, Local::now())?);
        let run_dir = logger.run_dir().to_path_buf();
        let run_id = run_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let flow = Arc::new(ItemFlow::new(
            self.probe.clone(),
            self.rotator.clone(),
            self.classifier.clone(),
            logger.clone(),
            self.notifier.clone(),
            self.options.notify_categories.clone(),
            self.options.probe_timeout,
            self.options.item_delay,
        ));

        let total = items.len();
        let batches = partition(items, self.options.concurrency);
        logging::log_items_loaded(total, self.rotator.len(), batches.len());

        self.run_batches(flow.clone(), batches, total).await;

        let stats = logger.finish()?;
        if stats.total != stats.category_sum() {
            return Err(AppError::InvalidState(format!(
                "计数不一致: total={} sum={}",
                stats.total,
                stats.category_sum()
            )));
        }

        match serde_json::to_value(&stats) {
            Ok(value) => {
                if let Err(e) = self.store.put(&run_id, value).await {
                    warn!("⚠️ 运行记录保存失败: {}", e);
                }
            }
            Err(e) => warn!("⚠️ 运行记录序列化失败: {}", e),
        }

        logging::print_final_stats(&stats, &run_dir);

        Ok(RunSummary {
            run_id,
            run_dir,
            stats,
        })
    }

    /// 每个批次一个任务，等待全部完成
    async fn run_batches(&self, flow: Arc<ItemFlow>, batches: Vec<Vec<WorkItem>>, total: usize) {
        let total_batches = batches.len();
        let mut handles = Vec::with_capacity(total_batches);
        let mut offset = 0;

        for (idx, batch) in batches.into_iter().enumerate() {
            let batch_num = idx + 1;
            let first_index = offset + 1;
            offset += batch.len();

            logging::log_batch_start(batch_num, total_batches, first_index, offset, total);

            let batch = Arc::new(batch);
            let progress = Arc::new(AtomicUsize::new(0));
            let handle = tokio::spawn(run_batch(
                flow.clone(),
                batch.clone(),
                progress.clone(),
                batch_num,
                first_index,
                total,
            ));
            handles.push((batch_num, batch, progress, handle));
        }

        for (batch_num, batch, progress, handle) in handles {
            if let Err(e) = handle.await {
                // 任务本身失败：把还没记录的条目补记为错误，保证每个条目恰好一个结果
                error!("[批次 {}] 任务执行失败: {}", batch_num, e);
                let done = progress.load(Ordering::SeqCst);
                let outcome = Outcome::new(Category::Error, "TaskFailed").with_detail("kind", "task_failed");
                for item in &batch[done..] {
                    flow.persist(item, &outcome, None);
                }
            }
        }
    }

    fn transition(&self, from: DispatchState, to: DispatchState) -> AppResult<()> {
        let mut state = self.state.lock().map_err(|_| AppError::LockPoisoned("dispatcher state"))?;
        if *state != from {
            return Err(AppError::InvalidState(format!(
                "调度器当前状态为 {:?}，无法进入 {:?}",
                *state, to
            )));
        }
        *state = to;
        Ok(())
    }
}

async fn run_batch(
    flow: Arc<ItemFlow>,
    batch: Arc<Vec<WorkItem>>,
    progress: Arc<AtomicUsize>,
    batch_num: usize,
    first_index: usize,
    total: usize,
) {
    for (i, item) in batch.iter().enumerate() {
        let ctx = ItemCtx::new(batch_num, first_index + i, total);
        flow.run(item, &ctx).await;
        progress.fetch_add(1, Ordering::SeqCst);

        if i + 1 < batch.len() {
            flow.pause().await;
        }
    }
    logging::log_batch_complete(batch_num, progress.load(Ordering::SeqCst), batch.len());
}

/// 把条目切成至多 `n` 个连续批次，各批次大小最多相差 1
///
/// 条目少于 `n` 时每个条目一个批次；`n == 0` 视为 1。
pub fn partition(items: Vec<WorkItem>, n: usize) -> Vec<Vec<WorkItem>> {
    if items.is_empty() {
        return Vec::new();
    }

    let batch_count = n.max(1).min(items.len());
    let base = items.len() / batch_count;
    let extra = items.len() % batch_count;

    let mut batches = Vec::with_capacity(batch_count);
    let mut iter = items.into_iter();
    for i in 0..batch_count {
        let size = base + usize::from(i < extra);
        batches.push(iter.by_ref().take(size).collect());
    }
    batches
}
