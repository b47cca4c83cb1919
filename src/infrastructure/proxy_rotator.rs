//! 代理轮换器
//!
//! 固定有序的代理池，按确定性的轮询顺序发放句柄。
//! 不做健康检查，失效的代理也留在轮换中，调用方自行容忍单次失败。

use std::sync::Mutex;

use crate::models::ProxyHandle;

/// 代理轮换器
///
/// 游标在互斥锁内自增并取模，多个 worker 并发调用也不会拿到重复的位置。
#[derive(Debug)]
pub struct ProxyRotator {
    pool: Vec<ProxyHandle>,
    cursor: Mutex<usize>,
}

impl ProxyRotator {
    pub fn new(pool: Vec<ProxyHandle>) -> Self {
        Self {
            pool,
            cursor: Mutex::new(0),
        }
    }

    /// 空代理池
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// 取下一个代理，代理池为空时返回 `None`
    pub fn next(&self) -> Option<ProxyHandle> {
        if self.pool.is_empty() {
            return None;
        }

        // 游标只是一个整数，持锁线程 panic 不会破坏它，直接取回继续用
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        let handle = self.pool[*cursor].clone();
        *cursor = (*cursor + 1) % self.pool.len();
        Some(handle)
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
