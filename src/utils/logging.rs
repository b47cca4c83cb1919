//! 日志工具模块
//!
//! 提供日志初始化以及格式化输出的辅助函数

use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::{Category, RunStats};

/// 初始化 tracing 输出
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。重复调用是安全的。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 并发批量调度模式");
    info!("📊 并发数: {}", config.concurrency);
    info!("⏱️ 单次调用时限: {} ms", config.probe_timeout_ms);
    info!("{}", "=".repeat(60));
}

/// 记录条目加载信息
pub fn log_items_loaded(total: usize, proxies: usize, batches: usize) {
    info!("✓ 找到 {} 个待处理条目", total);
    info!("🌐 可用代理: {}", proxies);
    info!("📋 切分为 {} 个批次并发处理\n", batches);
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_num`: 批次编号（从 1 开始）
/// - `total_batches`: 批次总数
/// - `start`: 起始条目编号
/// - `end`: 结束条目编号
/// - `total`: 条目总数
pub fn log_batch_start(batch_num: usize, total_batches: usize, start: usize, end: usize, total: usize) {
    info!(
        "📦 第 {}/{} 批开始: 条目 {}-{} / 共 {} 个",
        batch_num, total_batches, start, end, total
    );
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_num: usize, processed: usize, batch_size: usize) {
    info!("✓ 第 {} 批完成: {}/{}", batch_num, processed, batch_size);
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats, run_dir: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        stats
            .finished_at
            .unwrap_or_else(chrono::Local::now)
            .format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", stats.count(Category::Success), stats.total);
    info!("🔁 可重试失败: {}", stats.count(Category::SoftFailure));
    info!("❌ 确定失败: {}", stats.count(Category::HardFailure));
    info!("⚠️ 错误: {}", stats.count(Category::Error));
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", run_dir.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("abc", 5), "abc");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        assert_eq!(truncate_text("中文字符测试", 2), "中文...");
    }
}
