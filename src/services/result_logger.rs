//! 结果记录服务
//!
//! 每次运行一个目录（按启动时间命名），目录内：
//! - `success.txt` / `soft_failure.txt` / `hard_failure.txt` / `error.txt`：`条目 | 消息`
//! - `results.ndjson`：每个条目一行 JSON
//! - `stats.json`：计数快照
//!
//! 分类文件、结构化日志和计数器由同一把锁保护，锁只在单次 `record` 内持有。
//! 文件以追加方式打开，进程中途崩溃最多丢失正在写的那一条。

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{Category, Outcome, ProxyHandle, RunStats, WorkItem};

pub const RESULTS_FILE: &str = "results.ndjson";
pub const STATS_FILE: &str = "stats.json";

/// `results.ndjson` 中的一行
#[derive(Debug, Serialize)]
struct ResultRecord<'a> {
    item: &'a WorkItem,
    category: Category,
    message: &'a str,
    details: &'a BTreeMap<String, JsonValue>,
    proxy: Option<String>,
    timestamp: DateTime<Local>,
}

struct LoggerState {
    stats: RunStats,
    category_files: HashMap<Category, File>,
    results_file: File,
}

/// 结果记录服务
pub struct ResultLogger {
    run_dir: PathBuf,
    state: Mutex<LoggerState>,
}

impl ResultLogger {
    /// 在 `output_root` 下创建以启动时间命名的运行目录
    pub fn create(output_root: &Path, started_at: DateTime<Local>) -> AppResult<Self> {
        fs::create_dir_all(output_root)
            .map_err(|e| AppError::io(output_root.display().to_string(), e))?;

        let base_name = started_at.format("%Y%m%d_%H%M%S_%3f").to_string();
        let mut run_dir = output_root.join(&base_name);
        let mut suffix = 1;
        loop {
            match fs::create_dir(&run_dir) {
                Ok(()) => break,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    run_dir = output_root.join(format!("{}_{}", base_name, suffix));
                    suffix += 1;
                }
                Err(e) => return Err(AppError::io(run_dir.display().to_string(), e)),
            }
        }

        Self::open(run_dir, started_at)
    }

    /// 在已存在的目录中打开（追加）日志文件
    pub fn open(run_dir: PathBuf, started_at: DateTime<Local>) -> AppResult<Self> {
        let mut category_files = HashMap::new();
        for category in Category::ALL {
            let file = open_append(&run_dir.join(category.log_file_name()))?;
            category_files.insert(category, file);
        }
        let results_file = open_append(&run_dir.join(RESULTS_FILE))?;

        debug!("结果目录: {}", run_dir.display());

        Ok(Self {
            run_dir,
            state: Mutex::new(LoggerState {
                stats: RunStats::new(started_at),
                category_files,
                results_file,
            }),
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// 记录一个条目的结果
    ///
    /// 分类文件、`results.ndjson` 和计数器在同一次加锁内更新；
    /// 只有两次写入都成功才计数，保证计数与日志一致。
    pub fn record(
        &self,
        item: &WorkItem,
        outcome: &Outcome,
        proxy: Option<&ProxyHandle>,
    ) -> AppResult<()> {
        let text_line = format!("{} | {}\n", item, outcome.message.replace('\n', " "));

        let record = ResultRecord {
            item,
            category: outcome.category,
            message: &outcome.message,
            details: &outcome.details,
            proxy: proxy.map(|p| p.to_string()),
            timestamp: Local::now(),
        };
        let mut json_line = serde_json::to_string(&record)?;
        json_line.push('\n');

        let mut state = self.lock()?;
        let LoggerState {
            stats,
            category_files,
            results_file,
        } = &mut *state;

        let category_file = category_files
            .get_mut(&outcome.category)
            .ok_or_else(|| AppError::InvalidState(format!("缺少分类文件: {}", outcome.category)))?;
        category_file
            .write_all(text_line.as_bytes())
            .map_err(|e| self.file_error(&outcome.category.log_file_name(), e))?;
        results_file
            .write_all(json_line.as_bytes())
            .map_err(|e| self.file_error(RESULTS_FILE, e))?;

        stats.record(outcome.category);
        Ok(())
    }

    /// 当前计数快照
    pub fn snapshot(&self) -> AppResult<RunStats> {
        Ok(self.lock()?.stats.clone())
    }

    /// 把当前计数写入 `stats.json`
    pub fn flush(&self) -> AppResult<RunStats> {
        let state = self.lock()?;
        self.write_stats(&state.stats)?;
        Ok(state.stats.clone())
    }

    /// 标记结束时间并写入最终统计
    pub fn finish(&self) -> AppResult<RunStats> {
        let mut state = self.lock()?;
        state.stats.finished_at = Some(Local::now());
        self.write_stats(&state.stats)?;
        Ok(state.stats.clone())
    }

    fn write_stats(&self, stats: &RunStats) -> AppResult<()> {
        let path = self.run_dir.join(STATS_FILE);
        let content = serde_json::to_string_pretty(stats)?;
        fs::write(&path, content).map_err(|e| AppError::io(path.display().to_string(), e))
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, LoggerState>> {
        self.state
            .lock()
            .map_err(|_| AppError::LockPoisoned("result logger"))
    }

    fn file_error(&self, file_name: &str, source: std::io::Error) -> AppError {
        AppError::io(self.run_dir.join(file_name).display().to_string(), source)
    }
}

fn open_append(path: &Path) -> AppResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::io(path.display().to_string(), e))
}
