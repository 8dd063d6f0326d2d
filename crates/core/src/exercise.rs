use crate::annotation::entity::ToolKind;
use serde::{Deserialize, Serialize};

/// 摆动点分析练习
pub const SWING_ANALYSIS: &str = "swing_analysis";
/// 斐波那契回撤练习
pub const FIBONACCI_RETRACEMENT: &str = "fibonacci_retracement";
/// 公允价值缺口练习
pub const FAIR_VALUE_GAP: &str = "fair_value_gap";

/// # Summary
/// 练习配置：每次加载图表时读取一次，决定绘图引擎接受哪些工具。
///
/// # Invariants
/// - `enabled_tools` 之外的工具一律在引擎边界被拒绝。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseConfig {
    #[serde(alias = "enabledTools")]
    pub enabled_tools: Vec<ToolKind>,
    #[serde(alias = "exerciseType")]
    pub exercise_type: String,
    // 未显式指定时，摆动点分析练习默认吸附到影线
    #[serde(default, alias = "snapToWick")]
    pub snap_to_wick: Option<bool>,
}

impl ExerciseConfig {
    pub fn new(exercise_type: impl Into<String>, enabled_tools: Vec<ToolKind>) -> Self {
        Self {
            enabled_tools,
            exercise_type: exercise_type.into(),
            snap_to_wick: None,
        }
    }

    /// 摆动点分析：仅启用摆动点标记与趋势线。
    pub fn swing_analysis() -> Self {
        Self::new(SWING_ANALYSIS, vec![ToolKind::Pointer, ToolKind::Line])
    }

    /// 斐波那契回撤：仅启用斐波那契工具。
    pub fn fibonacci_retracement() -> Self {
        Self::new(FIBONACCI_RETRACEMENT, vec![ToolKind::Fibonacci])
    }

    /// 公允价值缺口：区间框与选择标记。
    pub fn fair_value_gap() -> Self {
        Self::new(FAIR_VALUE_GAP, vec![ToolKind::Pointer, ToolKind::Box])
    }

    pub fn is_enabled(&self, kind: ToolKind) -> bool {
        self.enabled_tools.contains(&kind)
    }

    pub fn snaps_to_wick(&self) -> bool {
        self.snap_to_wick
            .unwrap_or(self.exercise_type == SWING_ANALYSIS)
    }
}

impl Default for ExerciseConfig {
    fn default() -> Self {
        Self::new(SWING_ANALYSIS, ToolKind::ALL.to_vec())
    }
}
