use crate::annotation::error::AnnotationError;
use crate::chart::entity::ChartPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// # Summary
/// 标注的唯一标识，在标注整个生命周期内保持不变 (拖动、撤销均不改变)。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationId(pub Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// # Summary
/// 标注工具 (同时也是标注类型) 枚举。
///
/// # Invariants
/// - 序列化名称与评分服务约定一致：`pointer`, `line`, `horizontalLine`, `box`, `fibonacci`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolKind {
    // 摆动点标记 (同时承担选择/拖动)
    Pointer,
    // 趋势线
    Line,
    // 水平价位线
    HorizontalLine,
    // 区间框 (FVG / 缺口)
    Box,
    // 斐波那契回撤
    Fibonacci,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Pointer,
        ToolKind::Line,
        ToolKind::HorizontalLine,
        ToolKind::Box,
        ToolKind::Fibonacci,
    ];

    /// 该类型提交前必须具备的点数。
    pub fn arity(self) -> usize {
        match self {
            ToolKind::Pointer | ToolKind::HorizontalLine => 1,
            ToolKind::Line | ToolKind::Box | ToolKind::Fibonacci => 2,
        }
    }

    /// 单点类型在按下指针时即可提交。
    pub fn commits_on_press(self) -> bool {
        self.arity() == 1
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Pointer => "pointer",
            ToolKind::Line => "line",
            ToolKind::HorizontalLine => "horizontalLine",
            ToolKind::Box => "box",
            ToolKind::Fibonacci => "fibonacci",
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pointer" => Ok(ToolKind::Pointer),
            "line" => Ok(ToolKind::Line),
            "horizontalline" | "horizontal_line" => Ok(ToolKind::HorizontalLine),
            "box" => Ok(ToolKind::Box),
            "fibonacci" => Ok(ToolKind::Fibonacci),
            _ => Err(format!("Unknown ToolKind: {}", s)),
        }
    }
}

/// # Summary
/// 摆动点标记的方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    #[default]
    High,
    Low,
}

impl MarkerKind {
    pub fn toggled(self) -> Self {
        match self {
            MarkerKind::High => MarkerKind::Low,
            MarkerKind::Low => MarkerKind::High,
        }
    }
}

impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerKind::High => write!(f, "high"),
            MarkerKind::Low => write!(f, "low"),
        }
    }
}

/// 斐波那契回撤的固定比例。
pub const FIB_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

/// # Summary
/// 由两个锚点推导出的单条斐波那契价位。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
}

/// # Summary
/// 计算两锚点之间的全部斐波那契价位。
///
/// # Logic
/// 比例 0 对应低锚点，比例 1 对应高锚点，与锚点的绘制顺序无关。
pub fn fibonacci_levels(a: f64, b: f64) -> Vec<FibLevel> {
    let low = a.min(b);
    let high = a.max(b);
    FIB_RATIOS
        .iter()
        .map(|&ratio| FibLevel {
            ratio,
            price: low + (high - low) * ratio,
        })
        .collect()
}

/// # Summary
/// 已完成标注的几何形状。每个变体携带恰好符合其元数的点，
/// 因而无法构造出点数不合法的已提交标注。
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Pointer { at: ChartPoint, marker: MarkerKind },
    Line { start: ChartPoint, end: ChartPoint },
    HorizontalLine { at: ChartPoint },
    Box { corner_a: ChartPoint, corner_b: ChartPoint },
    Fibonacci { start: ChartPoint, end: ChartPoint },
}

impl Shape {
    pub fn kind(&self) -> ToolKind {
        match self {
            Shape::Pointer { .. } => ToolKind::Pointer,
            Shape::Line { .. } => ToolKind::Line,
            Shape::HorizontalLine { .. } => ToolKind::HorizontalLine,
            Shape::Box { .. } => ToolKind::Box,
            Shape::Fibonacci { .. } => ToolKind::Fibonacci,
        }
    }

    /// 按绘制顺序返回全部锚点。
    pub fn points(&self) -> Vec<ChartPoint> {
        match self {
            Shape::Pointer { at, .. } | Shape::HorizontalLine { at } => vec![*at],
            Shape::Line { start, end } | Shape::Fibonacci { start, end } => vec![*start, *end],
            Shape::Box { corner_a, corner_b } => vec![*corner_a, *corner_b],
        }
    }

    pub fn marker(&self) -> Option<MarkerKind> {
        match self {
            Shape::Pointer { marker, .. } => Some(*marker),
            _ => None,
        }
    }

    /// # Summary
    /// 由类型与点列构造形状，强制元数约束。
    ///
    /// # Arguments
    /// * `kind`: 标注类型。
    /// * `points`: 按绘制顺序排列的锚点。
    /// * `marker`: 仅 Pointer 需要。
    ///
    /// # Returns
    /// 点数不符返回 `IncompleteAnnotation`；Pointer 缺少方向返回 `MissingMarkerKind`。
    pub fn from_points(
        kind: ToolKind,
        points: &[ChartPoint],
        marker: Option<MarkerKind>,
    ) -> Result<Self, AnnotationError> {
        if points.len() != kind.arity() {
            return Err(AnnotationError::IncompleteAnnotation {
                kind,
                expected: kind.arity(),
                actual: points.len(),
            });
        }
        let shape = match (kind, points) {
            (ToolKind::Pointer, [at]) => Shape::Pointer {
                at: *at,
                marker: marker.ok_or(AnnotationError::MissingMarkerKind)?,
            },
            (ToolKind::HorizontalLine, [at]) => Shape::HorizontalLine { at: *at },
            (ToolKind::Line, [start, end]) => Shape::Line {
                start: *start,
                end: *end,
            },
            (ToolKind::Box, [corner_a, corner_b]) => Shape::Box {
                corner_a: *corner_a,
                corner_b: *corner_b,
            },
            (ToolKind::Fibonacci, [start, end]) => Shape::Fibonacci {
                start: *start,
                end: *end,
            },
            _ => {
                return Err(AnnotationError::IncompleteAnnotation {
                    kind,
                    expected: kind.arity(),
                    actual: points.len(),
                });
            }
        };
        Ok(shape)
    }

    /// 对每个锚点应用同一变换，任一失败则整体失败且不产生部分结果。
    pub fn try_map_points<E>(
        &self,
        mut f: impl FnMut(ChartPoint) -> Result<ChartPoint, E>,
    ) -> Result<Shape, E> {
        Ok(match self {
            Shape::Pointer { at, marker } => Shape::Pointer {
                at: f(*at)?,
                marker: *marker,
            },
            Shape::HorizontalLine { at } => Shape::HorizontalLine { at: f(*at)? },
            Shape::Line { start, end } => Shape::Line {
                start: f(*start)?,
                end: f(*end)?,
            },
            Shape::Box { corner_a, corner_b } => Shape::Box {
                corner_a: f(*corner_a)?,
                corner_b: f(*corner_b)?,
            },
            Shape::Fibonacci { start, end } => Shape::Fibonacci {
                start: f(*start)?,
                end: f(*end)?,
            },
        })
    }

    /// 斐波那契形状的派生价位，其它类型返回空。
    pub fn fib_levels(&self) -> Vec<FibLevel> {
        match self {
            Shape::Fibonacci { start, end } => fibonacci_levels(start.price, end.price),
            _ => Vec::new(),
        }
    }
}

/// # Summary
/// 各类型的默认颜色。
pub fn default_color(kind: ToolKind, marker: Option<MarkerKind>) -> &'static str {
    match (kind, marker) {
        (ToolKind::Pointer, Some(MarkerKind::Low)) => "#00e396",
        (ToolKind::Pointer, _) => "#ff4560",
        (ToolKind::Line, _) => "#2196f3",
        (ToolKind::HorizontalLine, _) => "#4caf50",
        (ToolKind::Box, _) => "#ff9800",
        (ToolKind::Fibonacci, _) => "#9c27b0",
    }
}

/// # Summary
/// 一个已提交的标注对象。
///
/// # Invariants
/// - 几何由 `Shape` 承载，点数必然满足类型元数。
/// - `selected` 的全局唯一性由所在的标注集合维护。
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    pub shape: Shape,
    pub color: String,
    pub selected: bool,
    pub visible: bool,
}

impl Annotation {
    pub fn new(shape: Shape) -> Self {
        Self::with_id(AnnotationId::new(), shape)
    }

    pub fn with_id(id: AnnotationId, shape: Shape) -> Self {
        let color = default_color(shape.kind(), shape.marker()).to_string();
        Self {
            id,
            shape,
            color,
            selected: false,
            visible: true,
        }
    }

    pub fn kind(&self) -> ToolKind {
        self.shape.kind()
    }
}

/// # Summary
/// 传输用的点，只包含时间与价格，时间序列化为 Unix 秒。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WirePoint {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    pub price: f64,
}

/// # Summary
/// 标注的传输/持久化形式：`{kind, points: [{time, price}], markerKind?}`。
///
/// # Invariants
/// - 从不携带像素坐标，评分服务因此与分辨率无关。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAnnotation {
    pub kind: ToolKind,
    pub points: Vec<WirePoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_kind: Option<MarkerKind>,
}

impl From<&Annotation> for WireAnnotation {
    fn from(annotation: &Annotation) -> Self {
        Self {
            kind: annotation.kind(),
            points: annotation
                .shape
                .points()
                .into_iter()
                .map(|p| WirePoint {
                    time: p.time,
                    price: p.price,
                })
                .collect(),
            marker_kind: annotation.shape.marker(),
        }
    }
}

impl TryFrom<&WireAnnotation> for Shape {
    type Error = AnnotationError;

    fn try_from(wire: &WireAnnotation) -> Result<Self, Self::Error> {
        let points: Vec<ChartPoint> = wire
            .points
            .iter()
            .map(|p| ChartPoint::new(p.time, p.price))
            .collect();
        if points.iter().any(|p| !p.price.is_finite()) {
            return Err(AnnotationError::InvalidPrice);
        }
        Shape::from_points(wire.kind, &points, wire.marker_kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(price: f64) -> ChartPoint {
        ChartPoint::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(), price)
    }

    #[test]
    fn test_fibonacci_levels_run_from_low_to_high() {
        for (a, b) in [(100.0, 200.0), (200.0, 100.0)] {
            let levels = fibonacci_levels(a, b);
            assert_eq!(levels.len(), 7);
            assert_eq!(levels[0].price, 100.0);
            assert_eq!(levels[3].ratio, 0.5);
            assert_eq!(levels[3].price, 150.0);
            assert_eq!(levels[6].price, 200.0);
        }
    }

    #[test]
    fn test_from_points_enforces_arity() {
        let err = Shape::from_points(ToolKind::Line, &[point(1.0)], None).unwrap_err();
        assert_eq!(
            err,
            AnnotationError::IncompleteAnnotation {
                kind: ToolKind::Line,
                expected: 2,
                actual: 1
            }
        );
        assert!(Shape::from_points(ToolKind::HorizontalLine, &[point(1.0), point(2.0)], None).is_err());
        assert_eq!(
            Shape::from_points(ToolKind::Pointer, &[point(1.0)], None),
            Err(AnnotationError::MissingMarkerKind)
        );
        let shape = Shape::from_points(ToolKind::Box, &[point(1.0), point(2.0)], None).unwrap();
        assert_eq!(shape.kind(), ToolKind::Box);
        assert_eq!(shape.points().len(), 2);
    }

    #[test]
    fn test_wire_shape_of_swing_marker() {
        let annotation = Annotation::new(Shape::Pointer {
            at: point(123.5),
            marker: MarkerKind::High,
        });
        assert_eq!(annotation.color, "#ff4560");
        let wire = WireAnnotation::from(&annotation);
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "pointer",
                "points": [{"time": 1_714_564_800, "price": 123.5}],
                "markerKind": "high"
            })
        );

        let line = WireAnnotation::from(&Annotation::new(Shape::Line {
            start: point(1.0),
            end: point(2.0),
        }));
        let json = serde_json::to_value(&line).unwrap();
        assert!(json.get("markerKind").is_none());
        assert_eq!(json["kind"], "line");
    }

    #[test]
    fn test_tool_kind_names() {
        assert_eq!("horizontalLine".parse::<ToolKind>(), Ok(ToolKind::HorizontalLine));
        assert_eq!(
            serde_json::to_string(&ToolKind::HorizontalLine).unwrap(),
            "\"horizontalLine\""
        );
        assert!(ToolKind::Pointer.commits_on_press());
        assert!(!ToolKind::Fibonacci.commits_on_press());
    }
}
