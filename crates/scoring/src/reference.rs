use crate::swing::{SwingPoint, detect_swing_points};
use async_trait::async_trait;
use chartlab_core::annotation::entity::{ToolKind, WireAnnotation, WirePoint};
use chartlab_core::chart::entity::Candle;
use chartlab_core::exercise::{FIBONACCI_RETRACEMENT, SWING_ANALYSIS};
use chartlab_core::scoring::entity::{FeedbackItem, ScoreRequest, ScoreResult};
use chartlab_core::scoring::error::ScoringError;
use chartlab_core::scoring::port::ScoringService;
use tracing::debug;

/// # Summary
/// 本地参考评分器，规则确定，不依赖网络。
///
/// # Invariants
/// - 价格容差为相对值，时间容差以秒计。
/// - 相同输入永远得到相同结果。
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceScorer {
    pub price_tolerance: f64,
    pub time_tolerance_secs: i64,
}

impl Default for ReferenceScorer {
    fn default() -> Self {
        Self {
            price_tolerance: 0.005,
            time_tolerance_secs: 7_200,
        }
    }
}

impl ReferenceScorer {
    pub fn new() -> Self {
        Self::default()
    }

    fn price_matches(&self, expected: f64, actual: f64) -> bool {
        expected != 0.0 && ((expected - actual) / expected).abs() <= self.price_tolerance
    }

    fn point_matches(&self, expected: &SwingPoint, point: &WirePoint) -> bool {
        self.price_matches(expected.price(), point.price)
            && (expected.candle.time - point.time).num_seconds().abs() <= self.time_tolerance_secs
    }

    /// # Summary
    /// 摆动点评分。
    ///
    /// # Logic
    /// 1. 检测图表中的主要与次要摆动点作为标准答案。
    /// 2. 每个用户标记依次尝试匹配尚未被占用的高点，再尝试低点。
    /// 3. 命中主要点得 2 分，次要点得 1 分；未命中的用户标记与遗漏的标准点记为错误。
    pub fn score_swings(&self, drawings: &[WireAnnotation], candles: &[Candle]) -> ScoreResult {
        let (highs, lows) = detect_swing_points(candles);
        let max_score: f64 = highs
            .iter()
            .chain(&lows)
            .map(|p| p.significance.points())
            .sum();
        let mut matched_highs = vec![false; highs.len()];
        let mut matched_lows = vec![false; lows.len()];
        let mut result = ScoreResult {
            score: 0.0,
            max_score,
            correct: Vec::new(),
            incorrect: Vec::new(),
        };

        let marks = drawings
            .iter()
            .filter(|d| d.kind == ToolKind::Pointer)
            .filter_map(|d| d.points.first());
        for mark in marks {
            let hit = [(&highs, &mut matched_highs), (&lows, &mut matched_lows)]
                .into_iter()
                .find_map(|(expected, matched)| {
                    let index = expected
                        .iter()
                        .zip(matched.iter())
                        .position(|(p, taken)| !taken && self.point_matches(p, mark))?;
                    matched[index] = true;
                    Some(expected[index])
                });
            match hit {
                Some(point) => {
                    result.score += point.significance.points();
                    result.correct.push(FeedbackItem::new(format!(
                        "Good job! You correctly identified a {} swing {} at price {:.2}.",
                        point.significance,
                        point.kind,
                        point.price()
                    )));
                }
                None => result.incorrect.push(FeedbackItem::new(format!(
                    "This point at price {:.2} doesn't match any significant swing point.",
                    mark.price
                ))),
            }
        }

        for (expected, matched) in [(&highs, &matched_highs), (&lows, &matched_lows)] {
            for point in expected.iter().zip(matched).filter(|(_, m)| !**m).map(|(p, _)| p) {
                result.incorrect.push(FeedbackItem::new(format!(
                    "You missed a {} swing {} at price {:.2}.",
                    point.significance,
                    point.kind,
                    point.price()
                )));
            }
        }
        result
    }

    /// # Summary
    /// 斐波那契回撤评分。
    ///
    /// # Logic
    /// 1. 标准锚点为图表最高 high 与最低 low。
    /// 2. 每个提交的斐波那契标注统计命中的锚点数 (不区分绘制方向)，取最佳者。
    /// 3. 满分 2 分，每命中一个锚点 1 分。
    pub fn score_fibonacci(&self, drawings: &[WireAnnotation], candles: &[Candle]) -> ScoreResult {
        let mut result = ScoreResult {
            score: 0.0,
            max_score: 2.0,
            correct: Vec::new(),
            incorrect: Vec::new(),
        };
        let (Some(high), Some(low)) = (
            candles.iter().map(|c| c.high).reduce(f64::max),
            candles.iter().map(|c| c.low).reduce(f64::min),
        ) else {
            result
                .incorrect
                .push(FeedbackItem::new("The chart has no price data to validate against."));
            return result;
        };

        let best = drawings
            .iter()
            .filter(|d| d.kind == ToolKind::Fibonacci && d.points.len() == 2)
            .map(|d| {
                let anchors = [d.points[0].price, d.points[1].price];
                let high_hit = anchors.iter().any(|p| self.price_matches(high, *p));
                let low_hit = anchors.iter().any(|p| self.price_matches(low, *p));
                (high_hit, low_hit)
            })
            .max_by_key(|(h, l)| u8::from(*h) + u8::from(*l));

        let Some((high_hit, low_hit)) = best else {
            result
                .incorrect
                .push(FeedbackItem::new("No Fibonacci retracement was drawn."));
            return result;
        };
        for (hit, label, price) in [(high_hit, "swing high", high), (low_hit, "swing low", low)] {
            if hit {
                result.score += 1.0;
                result.correct.push(FeedbackItem::new(format!(
                    "Fibonacci anchor placed on the {label} at {price:.2}."
                )));
            } else {
                result.incorrect.push(FeedbackItem::new(format!(
                    "Fibonacci anchor should be placed on the {label} at {price:.2}."
                )));
            }
        }
        result
    }
}

#[async_trait]
impl ScoringService for ReferenceScorer {
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreResult, ScoringError> {
        debug!(
            "Reference scoring {} with {} drawings over {} candles",
            request.exam_type,
            request.drawings.len(),
            request.chart_data.len()
        );
        let result = match request.exam_type.as_str() {
            SWING_ANALYSIS => self.score_swings(&request.drawings, &request.chart_data),
            FIBONACCI_RETRACEMENT => self.score_fibonacci(&request.drawings, &request.chart_data),
            other => ScoreResult {
                score: 0.0,
                max_score: 0.0,
                correct: Vec::new(),
                incorrect: vec![FeedbackItem::new(format!(
                    "Exercise type {other} is not supported by the reference scorer."
                ))],
            },
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartlab_core::annotation::entity::MarkerKind;
    use chartlab_core::test_utils::swing_candles;
    use chrono::Duration;

    fn marker(candle: &Candle, price: f64) -> WireAnnotation {
        WireAnnotation {
            kind: ToolKind::Pointer,
            points: vec![WirePoint {
                time: candle.time + Duration::minutes(30),
                price,
            }],
            marker_kind: Some(MarkerKind::High),
        }
    }

    fn fib(a: f64, b: f64, candle: &Candle) -> WireAnnotation {
        WireAnnotation {
            kind: ToolKind::Fibonacci,
            points: vec![
                WirePoint { time: candle.time, price: a },
                WirePoint { time: candle.time, price: b },
            ],
            marker_kind: None,
        }
    }

    #[test]
    fn test_swing_scoring_matches_within_tolerance() {
        let candles = swing_candles();
        let scorer = ReferenceScorer::new();
        let drawings = vec![
            marker(&candles[6], 130.4),
            marker(&candles[10], 110.0),
        ];
        let result = scorer.score_swings(&drawings, &candles);
        assert_eq!(result.score, 2.0);
        assert_eq!(result.max_score, 4.0);
        assert_eq!(result.correct.len(), 1);
        // 一个未命中的标记加一个遗漏的低点
        assert_eq!(result.incorrect.len(), 2);
        assert!(result.incorrect[1].message.contains("missed a major swing low at price 70.00"));
    }

    #[test]
    fn test_swing_point_cannot_be_matched_twice() {
        let candles = swing_candles();
        let scorer = ReferenceScorer::new();
        let drawings = vec![
            marker(&candles[6], 130.0),
            marker(&candles[6], 130.0),
            marker(&candles[16], 70.0),
        ];
        let result = scorer.score_swings(&drawings, &candles);
        assert_eq!(result.score, 4.0);
        assert_eq!(result.incorrect.len(), 1);
    }

    #[test]
    fn test_fibonacci_scoring() {
        let candles = swing_candles();
        let scorer = ReferenceScorer::new();
        let both = scorer.score_fibonacci(&[fib(70.1, 130.2, &candles[0])], &candles);
        assert_eq!((both.score, both.max_score), (2.0, 2.0));

        // 绘制方向不影响
        let reversed = scorer.score_fibonacci(&[fib(130.0, 70.0, &candles[0])], &candles);
        assert_eq!(reversed.score, 2.0);

        let one = scorer.score_fibonacci(&[fib(90.0, 130.0, &candles[0])], &candles);
        assert_eq!(one.score, 1.0);

        let none = scorer.score_fibonacci(&[], &candles);
        assert_eq!((none.score, none.max_score), (0.0, 2.0));
    }
}
