use chartlab_core::annotation::entity::WireAnnotation;
use chartlab_core::chart::entity::Candle;
use chartlab_core::common::SessionToken;
use chartlab_core::scoring::entity::{ExerciseMeta, ScoreRequest, ScoreResult};
use chartlab_core::scoring::error::ScoringError;
use chartlab_core::scoring::port::ScoringService;
use chartlab_drawing::model::AnnotationSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

/// # Summary
/// 评分适配器：把标注集合标准化为线格式，并保证同一会话同时只有一个在途提交。
///
/// # Invariants
/// - 在途提交期间的第二次提交立即以 `Busy` 拒绝，绝不并发。
/// - 响应返回时若会话令牌已变化，结果以 `Stale` 丢弃。
/// - 适配器本身不包含任何评分逻辑。
pub struct ScoringAdapter {
    service: Arc<dyn ScoringService>,
    token: SessionToken,
    in_flight: AtomicBool,
}

// 在途标记的 RAII 守卫，提交结束 (包括 future 被丢弃) 时自动释放
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ScoringAdapter {
    /// # Summary
    /// 创建适配器。
    ///
    /// # Arguments
    /// * `service`: 评分服务实现。
    /// * `token`: 绘图引擎的会话令牌句柄。
    pub fn new(service: Arc<dyn ScoringService>, token: SessionToken) -> Self {
        Self {
            service,
            token,
            in_flight: AtomicBool::new(false),
        }
    }

    /// 标注集合 → 线格式，只保留时间与价格。
    pub fn serialize(set: &AnnotationSet) -> Vec<WireAnnotation> {
        set.to_wire()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// # Summary
    /// 提交一次评分。
    ///
    /// # Logic
    /// 1. 原子地占用在途标记，已被占用则返回 `Busy`。
    /// 2. 记录当前会话代际并组装请求。
    /// 3. 等待评分服务响应。
    /// 4. 会话代际已变化时丢弃结果。
    ///
    /// # Arguments
    /// * `drawings`: 标准化后的标注。
    /// * `chart_data`: 当前图表 K 线。
    /// * `meta`: 练习元数据。
    ///
    /// # Returns
    /// 评分结果；失败时标注集合与会话状态保持不变，可直接重试。
    pub async fn submit(
        &self,
        drawings: Vec<WireAnnotation>,
        chart_data: Vec<Candle>,
        meta: &ExerciseMeta,
    ) -> Result<ScoreResult, ScoringError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Submission rejected: another one is in flight");
            return Err(ScoringError::Busy);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let generation = self.token.current();
        let request = ScoreRequest::new(drawings, chart_data, meta);
        info!(
            "Submitting {} drawings for {} chart {}",
            request.drawings.len(),
            request.exam_type,
            request.chart_number
        );

        let outcome = self.service.score(&request).await;
        if self.token.current() != generation {
            warn!("Discarding score for session {generation}: session was reset");
            return Err(ScoringError::Stale);
        }
        match outcome {
            Ok(result) => {
                info!("Scored {} / {}", result.score, result.max_score);
                Ok(result)
            }
            Err(e) => {
                error!("Scoring failed: {e}");
                Err(e)
            }
        }
    }
}
