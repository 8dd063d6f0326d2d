use chartlab_core::annotation::entity::AnnotationId;
use chartlab_core::chart::entity::{PixelPos, Viewport};

/// 描边样式。
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
    // 虚线模式 [实线长度, 间隔长度]，None 为实线
    pub dash: Option<[f64; 2]>,
}

impl Stroke {
    pub fn solid(color: impl Into<String>, width: f64) -> Self {
        Self {
            color: color.into(),
            width,
            dash: None,
        }
    }

    pub fn dashed(color: impl Into<String>, width: f64, dash: [f64; 2]) -> Self {
        Self {
            color: color.into(),
            width,
            dash: Some(dash),
        }
    }
}

/// 图元归属，便于宿主做分层或事件路由。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Annotation(AnnotationId),
    Draft,
    Hover,
}

/// # Summary
/// 像素空间内的绘制图元。
///
/// # Invariants
/// - 只在生成它的那一帧有效，视图变化后必须重新渲染。
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Segment {
        from: PixelPos,
        to: PixelPos,
        stroke: Stroke,
    },
    Rect {
        min: PixelPos,
        max: PixelPos,
        stroke: Stroke,
        fill: Option<String>,
    },
    Circle {
        center: PixelPos,
        radius: f64,
        stroke: Stroke,
        fill: Option<String>,
    },
    Label {
        at: PixelPos,
        text: String,
        color: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneItem {
    pub owner: Owner,
    pub primitive: Primitive,
}

/// # Summary
/// 一帧的显示列表，按绘制顺序排列 (后绘制者在上层)。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub viewport: Viewport,
    items: Vec<SceneItem>,
}

impl Scene {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, owner: Owner, primitive: Primitive) {
        self.items.push(SceneItem { owner, primitive });
    }

    pub fn extend(&mut self, owner: Owner, primitives: impl IntoIterator<Item = Primitive>) {
        self.items.extend(
            primitives
                .into_iter()
                .map(|primitive| SceneItem { owner, primitive }),
        );
    }

    pub fn items(&self) -> &[SceneItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn owned_by(&self, owner: Owner) -> impl Iterator<Item = &Primitive> {
        self.items
            .iter()
            .filter(move |item| item.owner == owner)
            .map(|item| &item.primitive)
    }

    /// 全部文字标签，按绘制顺序。
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match &item.primitive {
            Primitive::Label { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}
