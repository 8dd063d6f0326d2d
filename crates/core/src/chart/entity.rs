use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 屏幕像素坐标，原点位于图表绘图区左上角。
///
/// # Invariants
/// - 仅在当前平移/缩放状态下有效，绝不作为持久化状态。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPos {
    pub x: f64,
    pub y: f64,
}

impl PixelPos {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 计算到另一像素点的欧氏距离。
    pub fn distance_to(self, other: PixelPos) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// 平移指定像素偏移。
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// # Summary
/// 图表空间坐标 (时间, 价格)，是标注几何的唯一事实来源。
///
/// # Invariants
/// - `price` 必须是有限值。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    // 时间轴位置
    pub time: DateTime<Utc>,
    // 价格轴位置
    pub price: f64,
}

impl ChartPoint {
    pub fn new(time: DateTime<Utc>, price: f64) -> Self {
        Self { time, price }
    }
}

/// # Summary
/// 图表绘图区尺寸 (像素)。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// 宽高均为正的有限值时才可用于坐标换算。
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// # Summary
/// 坐标轴标识，用于描述换算失败发生在哪个方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Time,
    Price,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Time => write!(f, "time"),
            Axis::Price => write!(f, "price"),
        }
    }
}

/// # Summary
/// 单根 K 线数据实体，练习图表与评分请求共用。
///
/// # Invariants
/// - `high` 必须大于或等于 `low`, `open`, `close`。
/// - 序列化时 `time` 为 Unix 秒。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    // K 线开始时间
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    // 开盘价
    pub open: f64,
    // 最高价
    pub high: f64,
    // 最低价
    pub low: f64,
    // 收盘价
    pub close: f64,
    // 成交量
    #[serde(default)]
    pub volume: f64,
}
