use std::collections::VecDeque;

/// # Summary
/// 固定容量的撤销历史栈。
///
/// # Invariants
/// - 最多保留 `capacity` 个快照，满时丢弃最旧的一个。
/// - 弹出顺序与压入顺序相反。
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    // 最旧的快照位于队首
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    /// # Summary
    /// 创建一个新的历史栈。
    ///
    /// # Logic
    /// 预分配容量；容量为 0 时历史栈永远为空，`pop` 总是返回 None。
    ///
    /// # Arguments
    /// * `capacity`: 固定容量上限。
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// # Summary
    /// 压入一个快照。
    ///
    /// # Logic
    /// 1. 容量为 0 时直接丢弃。
    /// 2. 已满时先从队首淘汰最旧快照，再追加到队尾。
    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(item);
    }

    /// 弹出最近压入的快照。
    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
