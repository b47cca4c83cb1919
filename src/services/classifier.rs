//! 结果分类
//!
//! 一张有序的 (匹配条件, 分类) 规则表，按顺序求值，第一条命中的规则决定分类。
//! 规则顺序来自配置而不是代码顺序。

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{Category, Outcome};
use crate::services::probe::RawResult;

/// 匹配条件
#[derive(Debug, Clone)]
pub enum Matcher {
    /// 子串匹配（区分大小写）
    Contains(String),
    /// 正则匹配，需要忽略大小写时写 `(?i)`
    Pattern(Regex),
}

impl Matcher {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Matcher::Contains(needle) => text.contains(needle.as_str()),
            Matcher::Pattern(re) => re.is_match(text),
        }
    }
}

/// 一条分类规则
#[derive(Debug, Clone)]
pub struct Rule {
    pub matcher: Matcher,
    pub category: Category,
    /// 命中后作为 `Outcome::message`
    pub label: String,
}

impl Rule {
    pub fn contains(needle: impl Into<String>, category: Category, label: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::Contains(needle.into()),
            category,
            label: label.into(),
        }
    }

    pub fn pattern(pattern: &str, category: Category, label: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            matcher: Matcher::Pattern(Regex::new(pattern)?),
            category,
            label: label.into(),
        })
    }
}

/// 配置文件中的规则写法
///
/// ```toml
/// [[rules]]
/// category = "success"
/// pattern = "^HTTP 2\\d\\d"
/// label = "ok"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl RuleConfig {
    fn to_rule(&self, index: usize) -> AppResult<Rule> {
        let label = self
            .label
            .clone()
            .unwrap_or_else(|| self.category.as_str().to_string());

        match (&self.contains, &self.pattern) {
            (Some(needle), None) => Ok(Rule::contains(needle.clone(), self.category, label)),
            (None, Some(pattern)) => Rule::pattern(pattern, self.category, label),
            _ => Err(AppError::Config(format!(
                "第 {} 条规则必须且只能设置 contains 或 pattern 之一",
                index + 1
            ))),
        }
    }
}

/// 有序规则分类器
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn from_config(rules: &[RuleConfig]) -> AppResult<Self> {
        let rules = rules
            .iter()
            .enumerate()
            .map(|(i, r)| r.to_rule(i))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Self::new(rules))
    }

    /// 默认规则：按 `HTTP <status>` 前缀分类
    pub fn default_rule_configs() -> Vec<RuleConfig> {
        let rule = |category, pattern: &str, label: &str| RuleConfig {
            category,
            contains: None,
            pattern: Some(pattern.to_string()),
            label: Some(label.to_string()),
        };

        vec![
            rule(Category::Success, r"^HTTP 2\d\d", "ok"),
            rule(Category::SoftFailure, r"^HTTP 429", "rate limited"),
            rule(Category::SoftFailure, r"^HTTP 5\d\d", "server error"),
            rule(Category::HardFailure, r"^HTTP 4\d\d", "rejected"),
        ]
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// 分类原始结果，没有规则命中时返回 `Outcome::unclassified()`
    pub fn classify(&self, raw: &RawResult) -> Outcome {
        let mut outcome = match self
            .rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matcher.matches(&raw.text))
        {
            Some((index, rule)) => Outcome::new(rule.category, rule.label.clone())
                .with_detail("kind", "classified")
                .with_detail("rule", index),
            None => Outcome::unclassified(),
        };

        for (key, value) in &raw.details {
            outcome.details.entry(key.clone()).or_insert_with(|| value.clone());
        }
        outcome
    }
}
