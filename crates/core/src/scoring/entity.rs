use crate::annotation::entity::WireAnnotation;
use crate::chart::entity::Candle;
use crate::common::Interval;
use serde::{Deserialize, Serialize};

/// # Summary
/// 练习元数据，随评分请求提交。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseMeta {
    // 练习类型 (例如 swing_analysis)
    pub exam_type: String,
    // 练习分节
    pub section: String,
    // 当前图表序号
    pub chart_number: u32,
    // K 线周期
    pub interval: Interval,
}

/// # Summary
/// 评分服务请求体：`{examType, section, drawings, chartNumber, chartData, interval}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub exam_type: String,
    pub section: String,
    pub drawings: Vec<WireAnnotation>,
    pub chart_number: u32,
    pub chart_data: Vec<Candle>,
    pub interval: Interval,
}

impl ScoreRequest {
    pub fn new(drawings: Vec<WireAnnotation>, chart_data: Vec<Candle>, meta: &ExerciseMeta) -> Self {
        Self {
            exam_type: meta.exam_type.clone(),
            section: meta.section.clone(),
            drawings,
            chart_number: meta.chart_number,
            chart_data,
            interval: meta.interval,
        }
    }
}

/// # Summary
/// 评分服务响应中的反馈列表。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPayload {
    #[serde(default)]
    pub correct: Vec<String>,
    #[serde(default)]
    pub incorrect: Vec<String>,
}

/// # Summary
/// 评分服务响应体：`{score, totalExpectedPoints, feedback: {correct, incorrect}}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub score: f64,
    pub total_expected_points: f64,
    #[serde(default)]
    pub feedback: FeedbackPayload,
}

/// # Summary
/// 单条评分反馈。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub message: String,
}

impl FeedbackItem {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// # Summary
/// 评分结果。
///
/// # Invariants
/// - `score` 不超过 `max_score` 由评分服务保证，核心不做修正。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: f64,
    pub max_score: f64,
    pub correct: Vec<FeedbackItem>,
    pub incorrect: Vec<FeedbackItem>,
}

impl ScoreResult {
    /// 得分比例，满分为 0 时返回 0。
    pub fn ratio(&self) -> f64 {
        if self.max_score > 0.0 {
            self.score / self.max_score
        } else {
            0.0
        }
    }
}

impl From<ScoreResponse> for ScoreResult {
    fn from(response: ScoreResponse) -> Self {
        Self {
            score: response.score,
            max_score: response.total_expected_points,
            correct: response
                .feedback
                .correct
                .into_iter()
                .map(FeedbackItem::new)
                .collect(),
            incorrect: response
                .feedback
                .incorrect
                .into_iter()
                .map(FeedbackItem::new)
                .collect(),
        }
    }
}
