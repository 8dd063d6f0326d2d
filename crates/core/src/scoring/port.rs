use crate::scoring::entity::{ScoreRequest, ScoreResult};
use crate::scoring::error::ScoringError;
use async_trait::async_trait;

/// # Summary
/// 外部评分服务接口 (Port)。评分策略 (摆动点容差、斐波那契锚点判定等)
/// 完全由实现方持有，核心只负责传递标准化后的标注。
///
/// # Invariants
/// - 实现必须是 `Send` 和 `Sync`。
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// # Summary
    /// 对一次提交进行评分。
    ///
    /// # Logic
    /// 1. 将请求发往评分后端 (或本地参考规则)。
    /// 2. 将响应转换为 `ScoreResult`。
    ///
    /// # Arguments
    /// * `request`: 标准化的评分请求。
    ///
    /// # Returns
    /// 成功返回评分结果，失败返回 `ScoringError::Network` 或 `ScoringError::Validation`。
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreResult, ScoringError>;
}
