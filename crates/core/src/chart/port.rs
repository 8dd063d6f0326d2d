use crate::chart::entity::Viewport;
use chrono::{DateTime, Utc};

/// # Summary
/// 外部图表视图契约：提供价格/时间与像素之间的双向换算。
///
/// # Invariants
/// - 任何方法返回 `None` 即表示刻度暂不可用 (ConversionUnavailable)。
/// - 换算结果随平移/缩放静默变化，调用方不得跨重绘缓存。
/// - 核心只读取换算结果，从不修改视图本身。
pub trait ChartView {
    /// 价格 → 纵向像素。
    fn price_to_y(&self, price: f64) -> Option<f64>;

    /// 纵向像素 → 价格。
    fn y_to_price(&self, y: f64) -> Option<f64>;

    /// 时间 → 横向像素。
    fn time_to_x(&self, time: DateTime<Utc>) -> Option<f64>;

    /// 横向像素 → 时间。
    fn x_to_time(&self, x: f64) -> Option<DateTime<Utc>>;

    /// 当前绘图区尺寸，未完成布局时返回 `None`。
    fn viewport(&self) -> Option<Viewport>;
}

/// # Summary
/// 视图变化监听者。宿主在图表发生平移、缩放或尺寸变化时回调。
pub trait ViewListener {
    /// 通知视图已变化，此前的像素投影全部失效。
    fn view_changed(&mut self);
}
