use chartlab_core::chart::entity::{Axis, ChartPoint, PixelPos, Viewport};
use chartlab_core::chart::error::ConversionError;
use chartlab_core::chart::port::ChartView;
use chrono::{DurationRound, TimeDelta};

/// # Summary
/// 像素坐标与图表坐标 (时间, 价格) 之间的换算器，委托给外部图表自身的刻度。
///
/// # Invariants
/// - 只借用视图，不缓存任何换算结果；每次调用都重新询问视图。
/// - 非有限的输入或输出一律视为 `ConversionError::Unavailable`。
/// - 像素换算出的时间四舍五入到整秒，与线上格式的 Unix 秒一致。
#[derive(Clone, Copy)]
pub struct CoordinateMapper<'a> {
    view: &'a dyn ChartView,
}

impl<'a> CoordinateMapper<'a> {
    pub fn new(view: &'a dyn ChartView) -> Self {
        Self { view }
    }

    /// # Summary
    /// 像素 → 图表坐标。
    ///
    /// # Arguments
    /// * `pos`: 绘图区内的像素位置。
    ///
    /// # Returns
    /// 视图刻度不可用时返回 `ConversionError::Unavailable`。
    pub fn pixel_to_point(&self, pos: PixelPos) -> Result<ChartPoint, ConversionError> {
        if !pos.x.is_finite() {
            return Err(ConversionError::Unavailable { axis: Axis::Time });
        }
        let time = self
            .view
            .x_to_time(pos.x)
            .and_then(|t| t.duration_round(TimeDelta::seconds(1)).ok())
            .ok_or(ConversionError::Unavailable { axis: Axis::Time })?;
        let price = self
            .view
            .y_to_price(pos.y)
            .filter(|p| p.is_finite())
            .ok_or(ConversionError::Unavailable { axis: Axis::Price })?;
        Ok(ChartPoint::new(time, price))
    }

    /// # Summary
    /// 图表坐标 → 像素。
    ///
    /// # Arguments
    /// * `point`: 时间与价格。
    ///
    /// # Returns
    /// 视图刻度不可用时返回 `ConversionError::Unavailable`。
    pub fn point_to_pixel(&self, point: &ChartPoint) -> Result<PixelPos, ConversionError> {
        let x = self
            .view
            .time_to_x(point.time)
            .filter(|x| x.is_finite())
            .ok_or(ConversionError::Unavailable { axis: Axis::Time })?;
        let y = self
            .view
            .price_to_y(point.price)
            .filter(|y| y.is_finite())
            .ok_or(ConversionError::Unavailable { axis: Axis::Price })?;
        Ok(PixelPos::new(x, y))
    }

    /// 投影一组点，任一失败则整体失败。
    pub fn project_all(&self, points: &[ChartPoint]) -> Result<Vec<PixelPos>, ConversionError> {
        points.iter().map(|p| self.point_to_pixel(p)).collect()
    }

    /// 单独换算价格轴，用于十字线提示等只需价格的场景。
    pub fn y_to_price(&self, y: f64) -> Result<f64, ConversionError> {
        self.view
            .y_to_price(y)
            .filter(|p| p.is_finite())
            .ok_or(ConversionError::Unavailable { axis: Axis::Price })
    }

    pub fn viewport(&self) -> Result<Viewport, ConversionError> {
        self.view
            .viewport()
            .filter(Viewport::is_usable)
            .ok_or(ConversionError::Unavailable { axis: Axis::Time })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartlab_core::test_utils::{EPOCH_2024, standard_view, ts};

    #[test]
    fn test_round_trip_within_tolerance() {
        let view = standard_view();
        let mapper = CoordinateMapper::new(&view);
        for (time, price) in [(EPOCH_2024 + 600, 150.0), (EPOCH_2024 + 47_999, 123.456_789), (EPOCH_2024 - 3_600, 0.001)] {
            let original = ChartPoint::new(ts(time), price);
            let pixel = mapper.point_to_pixel(&original).unwrap();
            let back = mapper.pixel_to_point(pixel).unwrap();
            assert!((back.price - original.price).abs() <= original.price.abs() * 1e-6);
            assert!((back.time - original.time).num_milliseconds().abs() <= 1);
        }
    }

    #[test]
    fn test_times_are_whole_seconds() {
        let view = standard_view();
        let mapper = CoordinateMapper::new(&view);
        // 60 秒每像素: 10.337 px = 620.22 s, 100.71 px = 6042.6 s
        let a = mapper.pixel_to_point(PixelPos::new(10.337, 10.0)).unwrap();
        let b = mapper.pixel_to_point(PixelPos::new(100.71, 100.0)).unwrap();
        assert_eq!(a.time, ts(EPOCH_2024 + 620));
        assert_eq!(b.time, ts(EPOCH_2024 + 6_043));
    }

    #[test]
    fn test_unavailable_when_not_laid_out() {
        let mut view = standard_view();
        view.set_laid_out(false);
        let mapper = CoordinateMapper::new(&view);
        assert_eq!(
            mapper.pixel_to_point(PixelPos::new(10.0, 10.0)),
            Err(ConversionError::Unavailable { axis: Axis::Time })
        );
        assert!(mapper.point_to_pixel(&ChartPoint::new(ts(EPOCH_2024), 100.0)).is_err());
        assert!(mapper.viewport().is_err());
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let view = standard_view();
        let mapper = CoordinateMapper::new(&view);
        assert!(mapper.pixel_to_point(PixelPos::new(f64::NAN, 1.0)).is_err());
        assert!(mapper.pixel_to_point(PixelPos::new(1.0, f64::INFINITY)).is_err());
    }
}
