use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::models::Category;
use crate::services::{Classifier, RuleConfig};

/// 程序配置
///
/// 加载顺序：默认值 → TOML 文件（可选）→ 环境变量
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 并发 worker 数量，即条目被切分的批次数
    pub concurrency: usize,
    /// 单次外部调用的时限（毫秒）
    pub probe_timeout_ms: u64,
    /// 条目之间随机等待的下限（毫秒）
    pub item_delay_min_ms: u64,
    /// 条目之间随机等待的上限（毫秒），上下限都为 0 时不等待
    pub item_delay_max_ms: u64,
    /// 输出根目录，每次运行在其中创建一个子目录
    pub output_dir: String,
    /// 条目文件
    pub input_file: String,
    /// 代理文件（可选）
    pub proxy_file: Option<String>,
    /// 运行记录文件
    pub run_store_file: String,
    /// 探测地址模板，`{item}` 会被替换
    pub probe_url_template: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 需要发送通知的分类
    pub notify_categories: Vec<Category>,
    /// 有序分类规则
    pub rules: Vec<RuleConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: 4,
            probe_timeout_ms: 10_000,
            item_delay_min_ms: 0,
            item_delay_max_ms: 0,
            output_dir: "output".to_string(),
            input_file: "items.txt".to_string(),
            proxy_file: None,
            run_store_file: "output/runs.json".to_string(),
            probe_url_template: "http://127.0.0.1:8080/check?item={item}".to_string(),
            verbose_logging: false,
            notify_categories: vec![Category::Success],
            rules: Classifier::default_rule_configs(),
        }
    }
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，文件中缺省的字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::io(path.display().to_string(), e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 文件存在时读取文件，然后叠加环境变量
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(p) if p.exists() => Self::from_toml_file(p)?,
            _ => Self::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn with_env_overrides(self) -> Self {
        Self {
            concurrency: env_parse("CONCURRENCY").unwrap_or(self.concurrency),
            probe_timeout_ms: env_parse("PROBE_TIMEOUT_MS").unwrap_or(self.probe_timeout_ms),
            item_delay_min_ms: env_parse("ITEM_DELAY_MIN_MS").unwrap_or(self.item_delay_min_ms),
            item_delay_max_ms: env_parse("ITEM_DELAY_MAX_MS").unwrap_or(self.item_delay_max_ms),
            output_dir: env_var("OUTPUT_DIR").unwrap_or(self.output_dir),
            input_file: env_var("INPUT_FILE").unwrap_or(self.input_file),
            proxy_file: env_var("PROXY_FILE").or(self.proxy_file),
            run_store_file: env_var("RUN_STORE_FILE").unwrap_or(self.run_store_file),
            probe_url_template: env_var("PROBE_URL_TEMPLATE").unwrap_or(self.probe_url_template),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            notify_categories: env_var("NOTIFY_CATEGORIES")
                .and_then(|v| {
                    v.split(',')
                        .filter(|s| !s.trim().is_empty())
                        .map(|s| s.parse::<Category>().ok())
                        .collect()
                })
                .unwrap_or(self.notify_categories),
            rules: self.rules,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.concurrency == 0 {
            return Err(AppError::Config("concurrency 必须大于 0".to_string()));
        }
        if self.probe_timeout_ms == 0 {
            return Err(AppError::Config("probe_timeout_ms 必须大于 0".to_string()));
        }
        if self.item_delay_min_ms > self.item_delay_max_ms {
            return Err(AppError::Config(format!(
                "item_delay_min_ms ({}) 不能大于 item_delay_max_ms ({})",
                self.item_delay_min_ms, self.item_delay_max_ms
            )));
        }
        Classifier::from_config(&self.rules)?;
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// 条目间等待区间，不需要等待时返回 `None`
    pub fn item_delay(&self) -> Option<(Duration, Duration)> {
        if self.item_delay_max_ms == 0 {
            return None;
        }
        Some((
            Duration::from_millis(self.item_delay_min_ms),
            Duration::from_millis(self.item_delay_max_ms),
        ))
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.parse().ok())
}
