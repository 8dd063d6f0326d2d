//! 跨 crate 共享的测试夹具，通过 `test-utils` feature 暴露。

use crate::chart::entity::{Candle, Viewport};
use crate::chart::linear::LinearChartView;
use chrono::{DateTime, Duration, Utc};

/// 2024-01-01T00:00:00Z
pub const EPOCH_2024: i64 = 1_704_067_200;

/// Unix 秒 → UTC 时间。
pub fn ts(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_default()
}

/// # Summary
/// 标准测试视图：800x400 像素，x 每像素 60 秒，y = 0 处价格 200，每像素 0.5。
///
/// 即像素 `(x, y)` 对应 `(2024-01-01 + 60·x 秒, 200 − 0.5·y)`。
pub fn standard_view() -> LinearChartView {
    LinearChartView::new(ts(EPOCH_2024), 60.0, 200.0, 0.5, Viewport::new(800.0, 400.0))
}

pub fn candle(time: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        time,
        open,
        high,
        low,
        close,
        volume: 1_000.0,
    }
}

/// # Summary
/// 23 根日线，恰好包含一个摆动高点 (第 6 根, high = 130) 与一个摆动低点
/// (第 16 根, low = 70)，其余位置价格单调。
pub fn swing_candles() -> Vec<Candle> {
    (0..23_i32)
        .map(|i| {
            let high = if i <= 6 {
                100.0 + 5.0 * f64::from(i)
            } else if i <= 16 {
                130.0 - 5.0 * f64::from(i - 6)
            } else {
                80.0 + 5.0 * f64::from(i - 16)
            };
            let low = high - 10.0;
            candle(
                ts(EPOCH_2024) + Duration::days(i64::from(i)),
                low + 3.0,
                high,
                low,
                high - 3.0,
            )
        })
        .collect()
}
