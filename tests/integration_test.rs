use async_trait::async_trait;
use batch_dispatch::services::{BlockingProbe, MemoryRunStore, NoopNotifier, Rule};
use batch_dispatch::{
    Category, Classifier, DispatchOptions, DispatchState, Dispatcher, Notifier, Probe, ProbeError,
    ProxyHandle, ProxyRotator, RawResult, RunStore, WorkItem,
};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 根据条目内容给出固定结果
struct DeterministicProbe;

#[async_trait]
impl Probe for DeterministicProbe {
    async fn probe(
        &self,
        item: &WorkItem,
        _proxy: Option<&ProxyHandle>,
        _timeout: Duration,
    ) -> Result<RawResult, ProbeError> {
        let n: usize = item.as_str().trim_start_matches("item-").parse().unwrap_or(0);
        match n % 5 {
            0 => Ok(RawResult::new("status=accepted")),
            1 => Ok(RawResult::new("status=retry-later")),
            2 => Ok(RawResult::new("status=rejected")),
            3 => Err(ProbeError::Transport("connection refused".to_string())),
            _ => Ok(RawResult::new("something unexpected")),
        }
    }
}

/// 指定条目永不返回，其它条目成功
struct HangingProbe {
    hang_on: &'static str,
}

#[async_trait]
impl Probe for HangingProbe {
    async fn probe(
        &self,
        item: &WorkItem,
        _proxy: Option<&ProxyHandle>,
        _timeout: Duration,
    ) -> Result<RawResult, ProbeError> {
        if item.as_str() == self.hang_on {
            futures::future::pending::<()>().await;
        }
        Ok(RawResult::new("status=accepted"))
    }
}

/// 记录每次调用拿到的代理
#[derive(Default)]
struct ProxyRecordingProbe {
    seen: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl Probe for ProxyRecordingProbe {
    async fn probe(
        &self,
        _item: &WorkItem,
        proxy: Option<&ProxyHandle>,
        _timeout: Duration,
    ) -> Result<RawResult, ProbeError> {
        self.seen.lock().unwrap().push(proxy.map(|p| p.host.clone()));
        Ok(RawResult::new("status=accepted"))
    }
}

#[derive(Default)]
struct CollectingNotifier {
    messages: Mutex<Vec<(Category, String)>>,
}

#[async_trait]
impl Notifier for CollectingNotifier {
    async fn notify(&self, category: Category, message: &str) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push((category, message.to_string()));
        Ok(())
    }
}

fn classifier() -> Arc<Classifier> {
    Arc::new(Classifier::new(vec![
        Rule::contains("accepted", Category::Success, "accepted"),
        Rule::contains("retry", Category::SoftFailure, "retry"),
        Rule::contains("rejected", Category::HardFailure, "rejected"),
    ]))
}

fn options(output_dir: &Path, concurrency: usize) -> DispatchOptions {
    DispatchOptions {
        concurrency,
        probe_timeout: Duration::from_millis(200),
        item_delay: None,
        notify_categories: vec![],
        output_dir: output_dir.to_path_buf(),
    }
}

fn dispatcher(output_dir: &Path, concurrency: usize, probe: Arc<dyn Probe>) -> Dispatcher {
    Dispatcher::new(
        options(output_dir, concurrency),
        probe,
        Arc::new(ProxyRotator::empty()),
        classifier(),
        Arc::new(NoopNotifier),
        Arc::new(MemoryRunStore::new()),
    )
}

fn items(n: usize) -> Vec<WorkItem> {
    (0..n).map(|i| WorkItem::new(format!("item-{}", i))).collect()
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_item_recorded_exactly_once() {
    let out = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(out.path(), 7, Arc::new(DeterministicProbe));

    let summary = dispatcher.run(items(103)).await.unwrap();

    assert_eq!(summary.stats.total, 103);
    assert_eq!(summary.stats.category_sum(), 103);

    let lines = read_lines(&summary.run_dir.join("results.ndjson"));
    assert_eq!(lines.len(), 103);

    let mut per_item: HashMap<String, usize> = HashMap::new();
    for line in &lines {
        let value: JsonValue = serde_json::from_str(line).unwrap();
        *per_item.entry(value["item"].as_str().unwrap().to_string()).or_default() += 1;
    }
    assert_eq!(per_item.len(), 103);
    assert!(per_item.values().all(|&c| c == 1));

    // 分类文件的行数之和也等于总数
    let text_lines: usize = Category::ALL
        .iter()
        .map(|c| read_lines(&summary.run_dir.join(c.log_file_name())).len())
        .sum();
    assert_eq!(text_lines, 103);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deterministic_rerun_gives_identical_counts() {
    let out = tempfile::tempdir().unwrap();

    let first = dispatcher(out.path(), 3, Arc::new(DeterministicProbe))
        .run(items(50))
        .await
        .unwrap();
    let second = dispatcher(out.path(), 9, Arc::new(DeterministicProbe))
        .run(items(50))
        .await
        .unwrap();

    assert_ne!(first.run_dir, second.run_dir);
    for category in Category::ALL {
        assert_eq!(first.stats.count(category), second.stats.count(category));
    }
    // 50 个条目按 n % 5 均分：1 成功 / 1 可重试 / 1 确定失败 / 2 错误（传输 + 未分类）
    assert_eq!(first.stats.success, 10);
    assert_eq!(first.stats.soft_failure, 10);
    assert_eq!(first.stats.hard_failure, 10);
    assert_eq!(first.stats.error, 20);
}

#[tokio::test]
async fn test_all_success_only_fills_success_log() {
    let out = tempfile::tempdir().unwrap();
    let probe = BlockingProbe::new(|_: &WorkItem, _: Option<&ProxyHandle>| {
        Ok(RawResult::new("status=accepted"))
    });
    let summary = dispatcher(out.path(), 4, Arc::new(probe))
        .run(items(25))
        .await
        .unwrap();

    assert_eq!(read_lines(&summary.run_dir.join("success.txt")).len(), 25);
    for category in [Category::SoftFailure, Category::HardFailure, Category::Error] {
        assert!(read_lines(&summary.run_dir.join(category.log_file_name())).is_empty());
    }
    assert_eq!(summary.stats.success, 25);
}

#[tokio::test]
async fn test_hung_call_is_timeout_and_batch_continues() {
    let out = tempfile::tempdir().unwrap();
    // 单批次，保证挂起的条目后面还有条目
    let dispatcher = dispatcher(out.path(), 1, Arc::new(HangingProbe { hang_on: "item-1" }));

    let summary = dispatcher.run(items(4)).await.unwrap();

    assert_eq!(summary.stats.error, 1);
    assert_eq!(summary.stats.success, 3);
    assert_eq!(read_lines(&summary.run_dir.join("error.txt")), vec!["item-1 | Timeout"]);
}

#[tokio::test]
async fn test_proxies_rotate_round_robin() {
    let out = tempfile::tempdir().unwrap();
    let probe = Arc::new(ProxyRecordingProbe::default());
    let pool = vec![
        ProxyHandle::new("a", 1),
        ProxyHandle::new("b", 2),
        ProxyHandle::new("c", 3),
    ];
    let dispatcher = Dispatcher::new(
        options(out.path(), 1),
        probe.clone(),
        Arc::new(ProxyRotator::new(pool)),
        classifier(),
        Arc::new(NoopNotifier),
        Arc::new(MemoryRunStore::new()),
    );

    dispatcher.run(items(7)).await.unwrap();

    let seen: Vec<String> = probe.seen.lock().unwrap().iter().map(|p| p.clone().unwrap()).collect();
    assert_eq!(seen, vec!["a", "b", "c", "a", "b", "c", "a"]);
}

#[tokio::test]
async fn test_dispatcher_state_and_single_use() {
    let out = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(out.path(), 2, Arc::new(DeterministicProbe));

    assert_eq!(dispatcher.state(), DispatchState::Idle);
    dispatcher.run(items(3)).await.unwrap();
    assert_eq!(dispatcher.state(), DispatchState::Complete);

    assert!(dispatcher.run(items(3)).await.is_err());
}

#[tokio::test]
async fn test_summary_saved_to_store_and_stats_file() {
    let out = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryRunStore::new());
    let notifier = Arc::new(CollectingNotifier::default());
    let mut opts = options(out.path(), 2);
    opts.notify_categories = vec![Category::HardFailure];

    let dispatcher = Dispatcher::new(
        opts,
        Arc::new(DeterministicProbe),
        Arc::new(ProxyRotator::empty()),
        classifier(),
        notifier.clone(),
        store.clone(),
    );
    let summary = dispatcher.run(items(10)).await.unwrap();

    let stored = store.get(&summary.run_id).await.unwrap().unwrap();
    assert_eq!(stored["total"], 10);
    assert!(!stored["finished_at"].is_null());

    let on_disk: JsonValue =
        serde_json::from_str(&std::fs::read_to_string(summary.run_dir.join("stats.json")).unwrap()).unwrap();
    assert_eq!(on_disk["hard_failure"], 2);

    let messages = notifier.messages.lock().unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|(c, m)| *c == Category::HardFailure && m.ends_with("| rejected")));
}

#[tokio::test]
async fn test_empty_input_still_completes() {
    let out = tempfile::tempdir().unwrap();
    let summary = dispatcher(out.path(), 4, Arc::new(DeterministicProbe))
        .run(Vec::new())
        .await
        .unwrap();

    assert_eq!(summary.stats.total, 0);
    assert!(summary.run_dir.join("stats.json").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_item_delay_is_applied_between_items() {
    let out = tempfile::tempdir().unwrap();
    let mut opts = options(out.path(), 1);
    opts.item_delay = Some((Duration::from_millis(20), Duration::from_millis(20)));
    let dispatcher = Dispatcher::new(
        opts,
        Arc::new(DeterministicProbe),
        Arc::new(ProxyRotator::empty()),
        classifier(),
        Arc::new(NoopNotifier),
        Arc::new(MemoryRunStore::new()),
    );

    let started = std::time::Instant::now();
    dispatcher.run(items(4)).await.unwrap();
    // 4 个条目之间 3 次等待
    assert!(started.elapsed() >= Duration::from_millis(60));
}
