//! 运行统计

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::outcome::Category;

/// 一次运行的计数器
///
/// 由 `ResultLogger` 在同一把锁下与日志文件一起更新，
/// 每次 `record` 之后 `total == category_sum()`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub total: usize,
    pub success: usize,
    pub soft_failure: usize,
    pub hard_failure: usize,
    pub error: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
}

impl RunStats {
    pub fn new(started_at: DateTime<Local>) -> Self {
        Self {
            total: 0,
            success: 0,
            soft_failure: 0,
            hard_failure: 0,
            error: 0,
            started_at,
            finished_at: None,
        }
    }

    pub fn record(&mut self, category: Category) {
        *self.counter_mut(category) += 1;
        self.total += 1;
    }

    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Success => self.success,
            Category::SoftFailure => self.soft_failure,
            Category::HardFailure => self.hard_failure,
            Category::Error => self.error,
        }
    }

    pub fn category_sum(&self) -> usize {
        Category::ALL.iter().map(|c| self.count(*c)).sum()
    }

    fn counter_mut(&mut self, category: Category) -> &mut usize {
        match category {
            Category::Success => &mut self.success,
            Category::SoftFailure => &mut self.soft_failure,
            Category::HardFailure => &mut self.hard_failure,
            Category::Error => &mut self.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_total_in_sync() {
        let mut stats = RunStats::new(Local::now());
        stats.record(Category::Success);
        stats.record(Category::Error);
        stats.record(Category::Error);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.count(Category::Error), 2);
        assert_eq!(stats.category_sum(), stats.total);
    }
}
