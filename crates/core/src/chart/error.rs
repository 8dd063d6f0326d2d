use crate::chart::entity::Axis;
use thiserror::Error;

/// # Summary
/// 坐标换算错误。外部图表尚未完成布局 (零宽度、无有效刻度) 时产生。
///
/// # Invariants
/// - 调用方必须将其视为“挂起当前手势，不提交任何点”，而非致命错误。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionError {
    // 指定坐标轴的刻度暂不可用
    #[error("Conversion unavailable on {axis} axis")]
    Unavailable { axis: Axis },
}
