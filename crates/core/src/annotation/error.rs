use crate::annotation::entity::{AnnotationId, ToolKind};
use thiserror::Error;

/// # Summary
/// 标注域错误枚举。
///
/// # Invariants
/// - 全部错误均可在本地恢复：手势作废或操作被拒绝，已提交的标注集合不受影响。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnnotationError {
    // 手势结束时点数未达到该类型的元数
    #[error("Incomplete {kind} annotation: expected {expected} points, got {actual}")]
    IncompleteAnnotation {
        kind: ToolKind,
        expected: usize,
        actual: usize,
    },
    // 所选工具不在当前练习启用的工具集内
    #[error("Tool {0} is not enabled for this exercise")]
    InvalidToolSelection(ToolKind),
    // 标注不存在
    #[error("Annotation not found: {0}")]
    NotFound(AnnotationId),
    // 摆动点标记缺少 high/low 方向
    #[error("Pointer annotation requires a marker kind")]
    MissingMarkerKind,
    // 价格不是有限值
    #[error("Annotation point has a non-finite price")]
    InvalidPrice,
}

/// # Summary
/// 标注持久化错误枚举。
#[derive(Error, Debug)]
pub enum SinkError {
    // 序列化失败
    #[error("Serialize error: {0}")]
    Serialize(String),
    // 底层读写故障
    #[error("IO error: {0}")]
    Io(String),
}
