use crate::chart::entity::{Candle, Viewport};
use crate::chart::port::ChartView;
use chrono::{DateTime, Duration, Utc};

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// # Summary
/// 线性刻度的图表视图：时间与价格均按固定比例映射到像素。
/// 用于无界面评分回放，也是各 crate 测试中的标准视图。
///
/// # Invariants
/// - `seconds_per_px` 与 `price_per_px` 必须为正，否则所有换算返回 `None`。
/// - `laid_out == false` 时模拟外部图表尚未完成布局。
#[derive(Debug, Clone, PartialEq)]
pub struct LinearChartView {
    // x = 0 处对应的时间
    origin: DateTime<Utc>,
    // 每像素代表的秒数
    seconds_per_px: f64,
    // y = 0 处对应的价格
    price_top: f64,
    // 每像素代表的价格跨度
    price_per_px: f64,
    viewport: Viewport,
    laid_out: bool,
}

impl LinearChartView {
    pub fn new(
        origin: DateTime<Utc>,
        seconds_per_px: f64,
        price_top: f64,
        price_per_px: f64,
        viewport: Viewport,
    ) -> Self {
        Self {
            origin,
            seconds_per_px,
            price_top,
            price_per_px,
            viewport,
            laid_out: true,
        }
    }

    /// # Summary
    /// 构造一个恰好容纳全部 K 线的视图。
    ///
    /// # Logic
    /// 1. 时间轴覆盖首根到末根 K 线，左右各留半根 K 线的间距。
    /// 2. 价格轴覆盖最低价到最高价，上下各留 5% 的边距。
    ///
    /// # Arguments
    /// * `candles`: 图表数据，需按时间升序。
    /// * `viewport`: 绘图区尺寸。
    ///
    /// # Returns
    /// K 线为空或尺寸不可用时返回 `None`。
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(candles: &[Candle], viewport: Viewport) -> Option<Self> {
        let first = candles.first()?;
        let last = candles.last()?;
        if !viewport.is_usable() {
            return None;
        }

        let gaps = i64::try_from(candles.len() - 1).ok()?.max(1);
        let span = (last.time - first.time).num_seconds().max(1);
        let step = span / gaps;
        let origin = first.time - Duration::seconds(step / 2);
        let seconds_per_px = (span + step) as f64 / viewport.width;

        let high = candles.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let low = candles.iter().map(|c| c.low).fold(f64::MAX, f64::min);
        let range = (high - low).abs().max(f64::EPSILON);
        let padding = range * 0.05;
        let price_top = high + padding;
        let price_per_px = (range + padding * 2.0) / viewport.height;

        Some(Self::new(origin, seconds_per_px, price_top, price_per_px, viewport))
    }

    /// 模拟宿主图表的布局状态。
    pub fn set_laid_out(&mut self, laid_out: bool) {
        self.laid_out = laid_out;
    }

    /// 内容随指针平移 `dx`/`dy` 像素。
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if let Some(shift) = seconds_to_duration(dx * self.seconds_per_px) {
            self.origin -= shift;
        }
        self.price_top += dy * self.price_per_px;
    }

    /// 以绘图区水平中心为锚点缩放时间轴，`factor > 1` 为放大。
    pub fn zoom(&mut self, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let half = self.viewport.width / 2.0;
        let Some(center) = self.x_to_time(half) else {
            return;
        };
        self.seconds_per_px /= factor;
        if let Some(offset) = seconds_to_duration(half * self.seconds_per_px) {
            self.origin = center - offset;
        }
    }

    /// 调整绘图区尺寸，刻度比例保持不变。
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = Viewport::new(width, height);
    }

    fn is_ready(&self) -> bool {
        self.laid_out
            && self.viewport.is_usable()
            && self.seconds_per_px.is_finite()
            && self.seconds_per_px > 0.0
            && self.price_per_px.is_finite()
            && self.price_per_px > 0.0
    }
}

#[allow(clippy::cast_possible_truncation)]
fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    let nanos = (seconds * NANOS_PER_SECOND).round();
    // i64 纳秒可表示约 ±292 年
    if !nanos.is_finite() || nanos.abs() >= 9.0e18 {
        return None;
    }
    Some(Duration::nanoseconds(nanos as i64))
}

impl ChartView for LinearChartView {
    fn price_to_y(&self, price: f64) -> Option<f64> {
        if !self.is_ready() || !price.is_finite() {
            return None;
        }
        Some((self.price_top - price) / self.price_per_px)
    }

    fn y_to_price(&self, y: f64) -> Option<f64> {
        if !self.is_ready() || !y.is_finite() {
            return None;
        }
        Some(self.price_top - y * self.price_per_px)
    }

    #[allow(clippy::cast_precision_loss)]
    fn time_to_x(&self, time: DateTime<Utc>) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        let nanos = (time - self.origin).num_nanoseconds()?;
        Some(nanos as f64 / NANOS_PER_SECOND / self.seconds_per_px)
    }

    fn x_to_time(&self, x: f64) -> Option<DateTime<Utc>> {
        if !self.is_ready() || !x.is_finite() {
            return None;
        }
        let offset = seconds_to_duration(x * self.seconds_per_px)?;
        self.origin.checked_add_signed(offset)
    }

    fn viewport(&self) -> Option<Viewport> {
        if self.laid_out && self.viewport.is_usable() {
            Some(self.viewport)
        } else {
            None
        }
    }
}
