use crate::geometry::{HitTolerance, hit_test};
use crate::mapper::CoordinateMapper;
use chartlab_core::annotation::entity::{
    Annotation, AnnotationId, MarkerKind, Shape, ToolKind, WireAnnotation,
};
use chartlab_core::annotation::error::AnnotationError;
use chartlab_core::chart::entity::{ChartPoint, PixelPos};
use chartlab_core::chart::error::ConversionError;
use chartlab_core::exercise::ExerciseConfig;
use tracing::{debug, warn};

/// # Summary
/// 绘制中 (尚未提交) 的标注。
///
/// # Invariants
/// - 点数永远不超过所属类型的元数。
/// - 不属于任何 `AnnotationSet`，只有 `finish` 成功后才能进入集合。
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    kind: ToolKind,
    points: Vec<ChartPoint>,
    marker: Option<MarkerKind>,
}

impl Draft {
    /// # Summary
    /// 以第一个锚点开始一个新标注。
    ///
    /// # Arguments
    /// * `exercise`: 当前练习配置，决定哪些工具可用。
    /// * `kind`: 标注类型。
    /// * `first`: 第一个锚点。
    ///
    /// # Returns
    /// 类型未启用时返回 `InvalidToolSelection`。
    pub fn begin(
        exercise: &ExerciseConfig,
        kind: ToolKind,
        first: ChartPoint,
    ) -> Result<Self, AnnotationError> {
        if !exercise.is_enabled(kind) {
            return Err(AnnotationError::InvalidToolSelection(kind));
        }
        Ok(Self {
            kind,
            points: vec![first],
            marker: None,
        })
    }

    pub fn with_marker(mut self, marker: MarkerKind) -> Self {
        self.marker = Some(marker);
        self
    }

    /// # Summary
    /// 橡皮筋式更新第二个锚点。
    ///
    /// # Logic
    /// 单点类型 (Pointer / HorizontalLine) 忽略；两点类型首次追加，其后替换。
    /// 同一点重复调用结果不变。
    pub fn extend(&mut self, point: ChartPoint) {
        if self.kind.arity() < 2 {
            return;
        }
        if self.points.len() < 2 {
            self.points.push(point);
        } else {
            self.points[1] = point;
        }
    }

    /// 转为已完成形状，点数不足返回 `IncompleteAnnotation`。
    pub fn finish(&self) -> Result<Shape, AnnotationError> {
        Shape::from_points(self.kind, &self.points, self.marker)
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    pub fn points(&self) -> &[ChartPoint] {
        &self.points
    }

    pub fn marker(&self) -> Option<MarkerKind> {
        self.marker
    }
}

/// # Summary
/// 将形状整体平移一个像素增量，再经映射器换算回时间/价格。
///
/// # Returns
/// 任一锚点换算失败则整体失败，不产生部分平移的结果。
pub fn translated(
    shape: &Shape,
    mapper: &CoordinateMapper<'_>,
    dx: f64,
    dy: f64,
) -> Result<Shape, ConversionError> {
    shape.try_map_points(|point| {
        let pixel = mapper.point_to_pixel(&point)?;
        mapper.pixel_to_point(pixel.offset(dx, dy))
    })
}

/// # Summary
/// 当前图表的有序标注集合。插入顺序即 z 序，越靠后越在上层。
///
/// # Invariants
/// - `id` 唯一。
/// - 至多一个标注处于选中状态。
/// - 只接受已完成的 `Shape`，点数必然满足元数。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationSet {
    items: Vec<Annotation>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Summary
    /// 从持久化的线格式恢复集合。
    ///
    /// # Logic
    /// 逐条校验，非法条目记录警告后跳过；每条获得新的 id。
    ///
    /// # Returns
    /// `(集合, 被跳过的条目数)`。
    pub fn from_wire(drawings: &[WireAnnotation]) -> (Self, usize) {
        let mut set = Self::new();
        let mut skipped = 0;
        for (index, wire) in drawings.iter().enumerate() {
            match Shape::try_from(wire) {
                Ok(shape) => set.items.push(Annotation::new(shape)),
                Err(e) => {
                    warn!("Skipping persisted drawing #{index} ({}): {e}", wire.kind);
                    skipped += 1;
                }
            }
        }
        (set, skipped)
    }

    /// # Summary
    /// 提交绘制中的标注。
    ///
    /// # Returns
    /// 新标注的 id；点数不足时返回 `IncompleteAnnotation`，集合保持不变。
    pub fn commit(&mut self, draft: &Draft) -> Result<AnnotationId, AnnotationError> {
        let shape = draft.finish()?;
        let annotation = Annotation::new(shape);
        let id = annotation.id;
        self.items.push(annotation);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 按 z 序 (底层在前) 遍历。
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.items.iter()
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.items.iter().find(|a| a.id == id)
    }

    pub fn selected(&self) -> Option<&Annotation> {
        self.items.iter().find(|a| a.selected)
    }

    /// # Summary
    /// 像素命中选择。
    ///
    /// # Logic
    /// 1. 自顶层向下对可见标注做命中测试，第一个命中者胜出。
    /// 2. 换算失败的标注视为未命中。
    /// 3. 在同一次操作中设置唯一选中项并清除其余选中；未命中时全部取消选中。
    ///
    /// # Returns
    /// 被选中的 id。
    pub fn select_at(
        &mut self,
        mapper: &CoordinateMapper<'_>,
        pos: PixelPos,
        tolerance: HitTolerance,
    ) -> Option<AnnotationId> {
        let hit = self
            .items
            .iter()
            .rev()
            .filter(|a| a.visible)
            .find(|a| match hit_test(&a.shape, mapper, pos, tolerance) {
                Ok(hit) => hit,
                Err(e) => {
                    debug!("Hit test skipped for {}: {e}", a.id);
                    false
                }
            })
            .map(|a| a.id);
        self.mark_selected(hit);
        hit
    }

    /// 按 id 选择。
    pub fn select_id(&mut self, id: AnnotationId) -> Result<(), AnnotationError> {
        if self.get(id).is_none() {
            return Err(AnnotationError::NotFound(id));
        }
        self.mark_selected(Some(id));
        Ok(())
    }

    pub fn deselect_all(&mut self) {
        self.mark_selected(None);
    }

    fn mark_selected(&mut self, id: Option<AnnotationId>) {
        for annotation in &mut self.items {
            annotation.selected = Some(annotation.id) == id;
        }
    }

    /// # Summary
    /// 删除选中的标注，无选中时为空操作。
    pub fn delete_selected(&mut self) -> Option<Annotation> {
        let index = self.items.iter().position(|a| a.selected)?;
        Some(self.items.remove(index))
    }

    /// # Summary
    /// 将选中标注平移一个像素增量。
    ///
    /// # Returns
    /// - `Ok(true)`: 已平移。
    /// - `Ok(false)`: 无选中标注。
    /// - `Err`: 换算不可用，标注保持原样。
    pub fn drag_selected(
        &mut self,
        mapper: &CoordinateMapper<'_>,
        dx: f64,
        dy: f64,
    ) -> Result<bool, ConversionError> {
        let Some(annotation) = self.items.iter_mut().find(|a| a.selected) else {
            return Ok(false);
        };
        annotation.shape = translated(&annotation.shape, mapper, dx, dy)?;
        Ok(true)
    }

    /// 用新的几何替换指定标注，类型不同时拒绝，id 与样式保持不变。
    pub fn replace_shape(&mut self, id: AnnotationId, shape: Shape) -> Result<(), AnnotationError> {
        let annotation = self
            .items
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AnnotationError::NotFound(id))?;
        if annotation.kind() != shape.kind() {
            return Err(AnnotationError::InvalidToolSelection(shape.kind()));
        }
        annotation.shape = shape;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn set_visible(&mut self, id: AnnotationId, visible: bool) -> Result<(), AnnotationError> {
        let annotation = self
            .items
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AnnotationError::NotFound(id))?;
        annotation.visible = visible;
        Ok(())
    }

    pub fn set_all_visible(&mut self, visible: bool) {
        for annotation in &mut self.items {
            annotation.visible = visible;
        }
    }

    /// # Summary
    /// 修复多选状态：只保留最后一个 (最上层) 选中项。
    ///
    /// # Returns
    /// 是否进行了修复。
    pub fn normalize_selection(&mut self) -> bool {
        let selected = self.items.iter().filter(|a| a.selected).count();
        if selected <= 1 {
            return false;
        }
        warn!("{selected} annotations were selected at once, keeping the topmost");
        let keep = self.items.iter().rev().find(|a| a.selected).map(|a| a.id);
        self.mark_selected(keep);
        true
    }

    /// 序列化为线格式，只包含时间/价格。
    pub fn to_wire(&self) -> Vec<WireAnnotation> {
        self.items.iter().map(WireAnnotation::from).collect()
    }

    #[cfg(test)]
    pub(crate) fn items_mut(&mut self) -> &mut Vec<Annotation> {
        &mut self.items
    }
}
