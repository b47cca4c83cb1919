//! 条目处理结果

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ProbeError;

/// 结果分类，固定四种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Success,
    SoftFailure,
    HardFailure,
    Error,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Success,
        Category::SoftFailure,
        Category::HardFailure,
        Category::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Success => "success",
            Category::SoftFailure => "soft_failure",
            Category::HardFailure => "hard_failure",
            Category::Error => "error",
        }
    }

    /// 该分类对应的文本日志文件名
    pub fn log_file_name(&self) -> String {
        format!("{}.txt", self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("未知分类: '{}'", s))
    }
}

/// 单个条目的最终结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub category: Category,
    pub message: String,
    #[serde(default)]
    pub details: BTreeMap<String, JsonValue>,
}

impl Outcome {
    pub fn new(category: Category, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// 外部调用失败 → `Error`
    pub fn from_probe_error(err: &ProbeError) -> Self {
        Outcome::new(Category::Error, err.to_string()).with_detail("kind", err.kind())
    }

    /// 没有任何规则命中
    pub fn unclassified() -> Self {
        Outcome::new(Category::Error, "Unclassified").with_detail("kind", "unclassified")
    }

    /// 探测调用 panic
    pub fn panicked(reason: impl Into<String>) -> Self {
        Outcome::new(Category::Error, format!("Panic: {}", reason.into())).with_detail("kind", "panic")
    }
}
