use crate::common::Interval;
use crate::exercise::ExerciseConfig;
use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub drawing: DrawingConfig,
    pub scoring: ScoringConfig,
    pub session: SessionConfig,
}

/// # Summary
/// 绘图引擎的交互参数。
///
/// # Invariants
/// - 容差均以像素为单位，在当前视图的像素空间中计算。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingConfig {
    // 线类标注的命中容差
    pub line_hit_tolerance_px: f64,
    // 区间框边缘的命中容差
    pub box_edge_tolerance_px: f64,
    // 撤销历史最多保留的快照数
    pub history_depth: usize,
    // 手势过程中两次指针移动处理之间的最小间隔
    pub move_throttle_ms: u64,
    // 小于该距离的移动视为亚像素抖动，直接忽略
    pub min_move_px: f64,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            line_hit_tolerance_px: 10.0,
            box_edge_tolerance_px: 5.0,
            history_depth: 20,
            move_throttle_ms: 16,
            min_move_px: 0.5,
        }
    }
}

/// 评分后端选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    // 通过 HTTP 调用外部评分服务
    #[default]
    Http,
    // 使用本地确定性参考规则
    Reference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub mode: ScoringMode,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_secs: 30,
            mode: ScoringMode::Http,
        }
    }
}

/// # Summary
/// 无界面评分回放所需的会话参数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    // K 线数据文件 (JSON 数组)
    pub chart_file: String,
    // 已保存标注文件 (WireAnnotation JSON 数组)
    pub drawings_file: String,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub section: String,
    pub chart_number: u32,
    pub interval: Interval,
    pub exercise: ExerciseConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chart_file: "data/chart.json".to_string(),
            drawings_file: "data/drawings.json".to_string(),
            viewport_width: 1000.0,
            viewport_height: 600.0,
            section: "practice".to_string(),
            chart_number: 1,
            interval: Interval::Day1,
            exercise: ExerciseConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.drawing.line_hit_tolerance_px, 10.0);
        assert_eq!(config.drawing.box_edge_tolerance_px, 5.0);
        assert_eq!(config.drawing.history_depth, 20);
        assert_eq!(config.scoring.base_url, "http://localhost:8000/api");
        assert_eq!(config.scoring.mode, ScoringMode::Http);
        assert_eq!(config.session.chart_number, 1);
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"scoring": {"mode": "reference"}}"#).unwrap();
        assert_eq!(config.scoring.mode, ScoringMode::Reference);
        assert_eq!(config.scoring.timeout_secs, 30);
        assert_eq!(config.drawing, DrawingConfig::default());
    }
}
