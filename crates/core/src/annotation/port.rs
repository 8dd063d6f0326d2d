use crate::annotation::entity::WireAnnotation;
use crate::annotation::error::SinkError;

/// # Summary
/// 标注持久化接口 (Port)。每次提交性变更后，绘图引擎将完整的
/// `WireAnnotation` 列表推送给宿主，由宿主决定落盘位置 (本地存储、文件等)。
///
/// # Invariants
/// - 每次调用携带的是完整快照而非增量。
/// - 持久化失败不得影响内存中的标注状态。
pub trait AnnotationSink: Send + Sync {
    /// # Summary
    /// 保存当前标注快照。
    ///
    /// # Arguments
    /// * `drawings`: 当前全部标注的传输形式，按插入顺序排列。
    ///
    /// # Returns
    /// 成功返回 Ok，失败返回 `SinkError`。
    fn persist(&self, drawings: &[WireAnnotation]) -> Result<(), SinkError>;
}
