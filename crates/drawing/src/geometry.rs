//! 像素空间内的命中测试几何。标注状态本身始终是时间/价格，
//! 这里的一切都在每次调用时经由 `CoordinateMapper` 重新投影。

use crate::mapper::CoordinateMapper;
use chartlab_core::annotation::entity::Shape;
use chartlab_core::chart::entity::{ChartPoint, PixelPos};
use chartlab_core::chart::error::ConversionError;
use chartlab_core::config::DrawingConfig;

/// 命中测试容差 (像素)。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTolerance {
    pub line_px: f64,
    pub box_edge_px: f64,
}

impl Default for HitTolerance {
    fn default() -> Self {
        Self {
            line_px: 10.0,
            box_edge_px: 5.0,
        }
    }
}

impl From<&DrawingConfig> for HitTolerance {
    fn from(config: &DrawingConfig) -> Self {
        Self {
            line_px: config.line_hit_tolerance_px,
            box_edge_px: config.box_edge_tolerance_px,
        }
    }
}

/// # Summary
/// 点到线段的距离，投影参数被夹紧到 [0, 1]，即按端点截断而不是无限直线。
///
/// # Arguments
/// * `p`: 查询点。
/// * `a`, `b`: 线段端点。
///
/// # Returns
/// 欧氏距离；退化线段 (a == b) 时退化为点到点距离。
pub fn distance_to_segment(p: PixelPos, a: PixelPos, b: PixelPos) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(PixelPos::new(a.x + t * dx, a.y + t * dy))
}

/// # Summary
/// 矩形命中：位于矩形内部，或与任意一条边的距离不超过 `edge_px`。
pub fn box_contains(p: PixelPos, a: PixelPos, b: PixelPos, edge_px: f64) -> bool {
    let (left, right) = (a.x.min(b.x), a.x.max(b.x));
    let (top, bottom) = (a.y.min(b.y), a.y.max(b.y));
    if p.x >= left && p.x <= right && p.y >= top && p.y <= bottom {
        return true;
    }
    let corners = [
        PixelPos::new(left, top),
        PixelPos::new(right, top),
        PixelPos::new(right, bottom),
        PixelPos::new(left, bottom),
    ];
    (0..4).any(|i| distance_to_segment(p, corners[i], corners[(i + 1) % 4]) <= edge_px)
}

/// # Summary
/// 判断像素位置是否命中某个标注形状。
///
/// # Logic
/// 1. 将形状的全部锚点投影到当前像素空间。
/// 2. 按类型分派：
///    - Pointer: 与标记点距离 ≤ 线容差。
///    - Line: 到线段距离 ≤ 线容差。
///    - HorizontalLine: 到横跨视口宽度的水平线段距离 ≤ 线容差。
///    - Box: 内部或边缘容差内。
///    - Fibonacci: 对角线或任一横跨视口的价位线在线容差内。
///
/// # Returns
/// 视图刻度不可用时返回 `ConversionError`，调用方应视为未命中。
pub fn hit_test(
    shape: &Shape,
    mapper: &CoordinateMapper<'_>,
    pos: PixelPos,
    tolerance: HitTolerance,
) -> Result<bool, ConversionError> {
    let hit = match shape {
        Shape::Pointer { at, .. } => pos.distance_to(mapper.point_to_pixel(at)?) <= tolerance.line_px,
        Shape::Line { start, end } => {
            let a = mapper.point_to_pixel(start)?;
            let b = mapper.point_to_pixel(end)?;
            distance_to_segment(pos, a, b) <= tolerance.line_px
        }
        Shape::HorizontalLine { at } => {
            let y = mapper.point_to_pixel(at)?.y;
            let width = mapper.viewport()?.width;
            distance_to_segment(pos, PixelPos::new(0.0, y), PixelPos::new(width, y)) <= tolerance.line_px
        }
        Shape::Box { corner_a, corner_b } => {
            let a = mapper.point_to_pixel(corner_a)?;
            let b = mapper.point_to_pixel(corner_b)?;
            box_contains(pos, a, b, tolerance.box_edge_px)
        }
        Shape::Fibonacci { start, end } => {
            let a = mapper.point_to_pixel(start)?;
            let b = mapper.point_to_pixel(end)?;
            if distance_to_segment(pos, a, b) <= tolerance.line_px {
                return Ok(true);
            }
            let width = mapper.viewport()?.width;
            let mut on_level = false;
            for level in shape.fib_levels() {
                let y = mapper.point_to_pixel(&ChartPoint::new(start.time, level.price))?.y;
                if (pos.y - y).abs() <= tolerance.line_px && pos.x >= 0.0 && pos.x <= width {
                    on_level = true;
                    break;
                }
            }
            on_level
        }
    };
    Ok(hit)
}
