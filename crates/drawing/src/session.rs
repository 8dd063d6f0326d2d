use crate::history::BoundedHistory;
use crate::model::{AnnotationSet, Draft};
use chartlab_core::annotation::entity::ToolKind;

/// # Summary
/// 单个图表窗格的绘图会话，独占标注集合、绘制中标注与撤销历史。
///
/// # Invariants
/// - 历史栈保存的是每次变更之前的集合快照，容量有限。
/// - 每个图表窗格拥有各自的会话实例，不存在进程级共享状态。
#[derive(Debug, Clone)]
pub struct DrawingSession {
    set: AnnotationSet,
    history: BoundedHistory<AnnotationSet>,
    active_tool: Option<ToolKind>,
    draft: Option<Draft>,
}

impl DrawingSession {
    pub fn new(history_depth: usize) -> Self {
        Self {
            set: AnnotationSet::new(),
            history: BoundedHistory::new(history_depth),
            active_tool: None,
            draft: None,
        }
    }

    pub fn set(&self) -> &AnnotationSet {
        &self.set
    }

    /// 直接修改集合而不记录历史，仅用于选择、拖拽中间态等非提交操作。
    pub(crate) fn set_mut(&mut self) -> &mut AnnotationSet {
        &mut self.set
    }

    pub fn active_tool(&self) -> Option<ToolKind> {
        self.active_tool
    }

    pub(crate) fn set_active_tool(&mut self, tool: Option<ToolKind>) {
        self.active_tool = tool;
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub(crate) fn draft_mut(&mut self) -> Option<&mut Draft> {
        self.draft.as_mut()
    }

    pub(crate) fn set_draft(&mut self, draft: Option<Draft>) {
        self.draft = draft;
    }

    pub(crate) fn take_draft(&mut self) -> Option<Draft> {
        self.draft.take()
    }

    /// # Summary
    /// 在变更之前记录一个快照，并执行变更。
    ///
    /// # Logic
    /// 快照先入栈，再对集合应用 `mutate`；`mutate` 的返回值原样传出。
    pub(crate) fn record<R>(&mut self, mutate: impl FnOnce(&mut AnnotationSet) -> R) -> R {
        self.history.push(self.set.clone());
        mutate(&mut self.set)
    }

    /// 压入一个事先保存的快照，用于拖拽结束时记录拖拽前的状态。
    pub(crate) fn push_snapshot(&mut self, snapshot: AnnotationSet) {
        self.history.push(snapshot);
    }

    /// # Summary
    /// 撤销：恢复最近一次快照；历史为空时等价于清空。
    pub fn undo(&mut self) {
        match self.history.pop() {
            Some(previous) => self.set = previous,
            None => self.set.clear(),
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// 换图：丢弃集合、绘制中标注与历史，保留当前工具。
    pub(crate) fn reset(&mut self, set: AnnotationSet) {
        self.set = set;
        self.draft = None;
        self.history.clear();
    }
}
