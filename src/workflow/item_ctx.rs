//! 条目处理上下文
//!
//! 封装"哪个批次的第几个条目"这一信息，仅用于日志

use std::fmt::Display;

#[derive(Debug, Clone, Copy)]
pub struct ItemCtx {
    /// 批次编号（从1开始）
    pub batch_num: usize,

    /// 条目在整个输入中的位置（从1开始）
    pub item_index: usize,

    /// 条目总数
    pub total: usize,
}

impl ItemCtx {
    pub fn new(batch_num: usize, item_index: usize, total: usize) -> Self {
        Self {
            batch_num,
            item_index,
            total,
        }
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[批次 {} 条目 {}/{}]", self.batch_num, self.item_index, self.total)
    }
}
