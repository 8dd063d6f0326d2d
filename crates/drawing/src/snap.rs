use crate::mapper::CoordinateMapper;
use chartlab_core::chart::entity::{Candle, ChartPoint, PixelPos};

/// # Summary
/// 将点击位置吸附到最近一根 K 线的影线端点。
///
/// # Logic
/// 1. 按 x 方向像素距离找最近的 K 线，换算失败的 K 线跳过。
/// 2. 比较点击位置到该 K 线 high 与 low 的 y 距离，取较近者。
/// 3. 返回该 K 线的精确时间与价格，而非点击像素反算的近似值。
///
/// # Arguments
/// * `candles`: 当前图表的 K 线。
/// * `mapper`: 当前视图的坐标换算器。
/// * `pos`: 点击位置。
///
/// # Returns
/// 无 K 线或全部换算失败时返回 None，调用方应退回原始点。
pub fn snap_to_wick(
    candles: &[Candle],
    mapper: &CoordinateMapper<'_>,
    pos: PixelPos,
) -> Option<ChartPoint> {
    let mut nearest: Option<(&Candle, f64)> = None;
    for candle in candles {
        let Ok(pixel) = mapper.point_to_pixel(&ChartPoint::new(candle.time, candle.high)) else {
            continue;
        };
        let dx = (pixel.x - pos.x).abs();
        if nearest.is_none_or(|(_, best)| dx < best) {
            nearest = Some((candle, dx));
        }
    }
    let (candle, _) = nearest?;

    let high = ChartPoint::new(candle.time, candle.high);
    let low = ChartPoint::new(candle.time, candle.low);
    let high_y = mapper.point_to_pixel(&high).ok()?.y;
    let low_y = mapper.point_to_pixel(&low).ok()?.y;
    if (high_y - pos.y).abs() <= (low_y - pos.y).abs() {
        Some(high)
    } else {
        Some(low)
    }
}
