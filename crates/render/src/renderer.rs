use crate::scene::{Owner, Primitive, Scene, Stroke};
use chartlab_core::annotation::entity::{Annotation, FibLevel, MarkerKind, Shape, default_color};
use chartlab_core::chart::entity::{ChartPoint, PixelPos, Viewport};
use chartlab_core::chart::error::ConversionError;
use chartlab_core::chart::port::{ChartView, ViewListener};
use chartlab_drawing::engine::{DrawingEngine, Response};
use chartlab_drawing::mapper::CoordinateMapper;
use chartlab_drawing::model::{AnnotationSet, Draft};
use tracing::debug;

const NORMAL_WIDTH: f64 = 1.0;
const SELECTED_WIDTH: f64 = 2.0;
const SELECTED_DASH: [f64; 2] = [5.0, 3.0];
const GUIDE_DASH: [f64; 2] = [3.0, 3.0];
const MARKER_RADIUS: f64 = 6.0;
const MARKER_RADIUS_SELECTED: f64 = 8.0;
const MARKER_TICK: f64 = 15.0;
const ANCHOR_RADIUS: f64 = 3.0;
// 斐波那契价位标签距右边缘的距离
const FIB_LABEL_INSET: f64 = 70.0;
const CROSSHAIR_COLOR: &str = "#888888";
const TOOLTIP_COLOR: &str = "#333333";

/// 斐波那契各价位线的颜色。
pub fn fib_level_color(ratio: f64) -> &'static str {
    const COLORS: [(f64, &str); 7] = [
        (0.0, "rgba(76,175,80,0.6)"),
        (0.236, "rgba(33,150,243,0.6)"),
        (0.382, "rgba(156,39,176,0.6)"),
        (0.5, "rgba(255,152,0,0.6)"),
        (0.618, "rgba(233,30,99,0.6)"),
        (0.786, "rgba(63,81,181,0.6)"),
        (1.0, "rgba(244,67,54,0.6)"),
    ];
    COLORS
        .iter()
        .find(|(r, _)| (r - ratio).abs() < 1e-9)
        .map_or("rgba(128,128,128,0.6)", |(_, color)| *color)
}

/// # Summary
/// 一帧渲染所需的只读输入。
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub annotations: &'a AnnotationSet,
    pub draft: Option<&'a Draft>,
    pub hover: Option<PixelPos>,
    pub marker: MarkerKind,
}

impl<'a> RenderInput<'a> {
    pub fn from_engine(engine: &'a DrawingEngine) -> Self {
        Self {
            annotations: engine.annotations(),
            draft: engine.draft(),
            hover: engine.hover(),
            marker: engine.marker_kind(),
        }
    }
}

/// # Summary
/// 标注渲染器：把时间/价格状态投影为当前视图下的显示列表。
///
/// # Invariants
/// - 不复用上一帧的任何像素位置；每次渲染都经由映射器重新投影。
/// - 模型变更或视图变化后标记为脏，`frame` 仅在脏时重新渲染。
#[derive(Debug)]
pub struct Renderer {
    dirty: bool,
    scene: Scene,
    renders: u64,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            dirty: true,
            scene: Scene::default(),
            renders: 0,
        }
    }

    pub fn notify_model_changed(&mut self) {
        self.dirty = true;
    }

    pub fn notify_view_changed(&mut self) {
        self.dirty = true;
    }

    /// 根据引擎事件结果决定是否需要重绘。
    pub fn observe(&mut self, response: Response) {
        if matches!(response, Response::Redraw | Response::Committed) {
            self.notify_model_changed();
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// 已完成的渲染次数。
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// 最近一次渲染的结果。
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// # Summary
    /// 按需渲染：仅在脏时重新投影，否则返回上一帧。
    pub fn frame(&mut self, input: RenderInput<'_>, view: &dyn ChartView) -> &Scene {
        if self.dirty {
            self.render(input, view)
        } else {
            &self.scene
        }
    }

    /// # Summary
    /// 无条件重新渲染一帧。
    ///
    /// # Logic
    /// 1. 视图尚未布局时输出空帧。
    /// 2. 按 z 序绘制每个可见标注；无法投影的标注整体跳过。
    /// 3. 绘制中标注画在其上。
    /// 4. 最后绘制悬停十字线与提示。
    pub fn render(&mut self, input: RenderInput<'_>, view: &dyn ChartView) -> &Scene {
        let mapper = CoordinateMapper::new(view);
        self.dirty = false;
        self.renders += 1;
        let Ok(viewport) = mapper.viewport() else {
            debug!("Chart view not ready, rendering empty frame");
            self.scene = Scene::default();
            return &self.scene;
        };

        let mut scene = Scene::new(viewport);
        for annotation in input.annotations.iter().filter(|a| a.visible) {
            match draw_annotation(annotation, &mapper, viewport) {
                Ok(primitives) => scene.extend(Owner::Annotation(annotation.id), primitives),
                Err(e) => debug!("Skipping annotation {}: {e}", annotation.id),
            }
        }
        if let Some(draft) = input.draft {
            match draw_draft(draft, input.marker, &mapper, viewport) {
                Ok(primitives) => scene.extend(Owner::Draft, primitives),
                Err(e) => debug!("Skipping draft: {e}"),
            }
        }
        if let Some(pos) = input.hover {
            match draw_hover(pos, &mapper, viewport) {
                Ok(primitives) => scene.extend(Owner::Hover, primitives),
                Err(e) => debug!("Skipping hover: {e}"),
            }
        }
        self.scene = scene;
        &self.scene
    }
}

impl ViewListener for Renderer {
    fn view_changed(&mut self) {
        self.notify_view_changed();
    }
}

fn stroke_for(color: &str, selected: bool) -> Stroke {
    if selected {
        Stroke::dashed(color, SELECTED_WIDTH, SELECTED_DASH)
    } else {
        Stroke::solid(color, NORMAL_WIDTH)
    }
}

fn draw_annotation(
    annotation: &Annotation,
    mapper: &CoordinateMapper<'_>,
    viewport: Viewport,
) -> Result<Vec<Primitive>, ConversionError> {
    draw_shape(&annotation.shape, &annotation.color, annotation.selected, mapper, viewport)
}

// 未完成的标注：已有锚点画成小圆点；点数足够时按完成形状绘制
fn draw_draft(
    draft: &Draft,
    marker: MarkerKind,
    mapper: &CoordinateMapper<'_>,
    viewport: Viewport,
) -> Result<Vec<Primitive>, ConversionError> {
    let color = default_color(draft.kind(), draft.marker().or(Some(marker)));
    if let Ok(shape) = draft.finish() {
        return draw_shape(&shape, color, false, mapper, viewport);
    }
    Ok(mapper
        .project_all(draft.points())?
        .into_iter()
        .map(|center| Primitive::Circle {
            center,
            radius: ANCHOR_RADIUS,
            stroke: Stroke::solid(color, NORMAL_WIDTH),
            fill: Some(color.to_string()),
        })
        .collect())
}

/// # Summary
/// 按类型生成单个形状的图元。
///
/// # Returns
/// 任一锚点无法投影时整体失败，不输出部分图元。
fn draw_shape(
    shape: &Shape,
    color: &str,
    selected: bool,
    mapper: &CoordinateMapper<'_>,
    viewport: Viewport,
) -> Result<Vec<Primitive>, ConversionError> {
    let stroke = stroke_for(color, selected);
    let primitives = match shape {
        Shape::Pointer { at, .. } => {
            let center = mapper.point_to_pixel(at)?;
            vec![
                Primitive::Segment {
                    from: center.offset(0.0, -MARKER_TICK),
                    to: center.offset(0.0, MARKER_TICK),
                    stroke: stroke.clone(),
                },
                Primitive::Circle {
                    center,
                    radius: if selected {
                        MARKER_RADIUS_SELECTED
                    } else {
                        MARKER_RADIUS
                    },
                    stroke,
                    fill: Some(color.to_string()),
                },
                Primitive::Label {
                    at: center.offset(10.0, -10.0),
                    text: format!("{:.2}", at.price),
                    color: color.to_string(),
                },
            ]
        }
        Shape::Line { start, end } => vec![Primitive::Segment {
            from: mapper.point_to_pixel(start)?,
            to: mapper.point_to_pixel(end)?,
            stroke,
        }],
        Shape::HorizontalLine { at } => {
            let y = mapper.point_to_pixel(at)?.y;
            vec![Primitive::Segment {
                from: PixelPos::new(0.0, y),
                to: PixelPos::new(viewport.width, y),
                stroke,
            }]
        }
        Shape::Box { corner_a, corner_b } => {
            let a = mapper.point_to_pixel(corner_a)?;
            let b = mapper.point_to_pixel(corner_b)?;
            vec![Primitive::Rect {
                min: PixelPos::new(a.x.min(b.x), a.y.min(b.y)),
                max: PixelPos::new(a.x.max(b.x), a.y.max(b.y)),
                stroke,
                // 8 位十六进制颜色，约 20% 不透明度
                fill: Some(format!("{color}33")),
            }]
        }
        Shape::Fibonacci { start, end } => {
            let mut primitives = vec![Primitive::Segment {
                from: mapper.point_to_pixel(start)?,
                to: mapper.point_to_pixel(end)?,
                stroke: Stroke::dashed(color, stroke.width, GUIDE_DASH),
            }];
            for level in shape.fib_levels() {
                primitives.extend(draw_fib_level(&level, start, selected, mapper, viewport)?);
            }
            primitives
        }
    };
    Ok(primitives)
}

fn draw_fib_level(
    level: &FibLevel,
    anchor: &ChartPoint,
    selected: bool,
    mapper: &CoordinateMapper<'_>,
    viewport: Viewport,
) -> Result<[Primitive; 2], ConversionError> {
    let y = mapper
        .point_to_pixel(&ChartPoint::new(anchor.time, level.price))?
        .y;
    let color = fib_level_color(level.ratio);
    Ok([
        Primitive::Segment {
            from: PixelPos::new(0.0, y),
            to: PixelPos::new(viewport.width, y),
            stroke: stroke_for(color, selected),
        },
        Primitive::Label {
            at: PixelPos::new(viewport.width - FIB_LABEL_INSET, y),
            text: format!("{} - {:.2}", level.ratio, level.price),
            color: color.to_string(),
        },
    ])
}

fn draw_hover(
    pos: PixelPos,
    mapper: &CoordinateMapper<'_>,
    viewport: Viewport,
) -> Result<Vec<Primitive>, ConversionError> {
    let point = mapper.pixel_to_point(pos)?;
    let guide = Stroke::dashed(CROSSHAIR_COLOR, NORMAL_WIDTH, GUIDE_DASH);
    Ok(vec![
        Primitive::Segment {
            from: PixelPos::new(0.0, pos.y),
            to: PixelPos::new(viewport.width, pos.y),
            stroke: guide.clone(),
        },
        Primitive::Segment {
            from: PixelPos::new(pos.x, 0.0),
            to: PixelPos::new(pos.x, viewport.height),
            stroke: guide,
        },
        Primitive::Label {
            at: pos.offset(10.0, 10.0),
            text: format!(
                "Price: {:.2} | Date: {}",
                point.price,
                point.time.format("%Y-%m-%d")
            ),
            color: TOOLTIP_COLOR.to_string(),
        },
    ])
}
