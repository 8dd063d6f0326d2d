use crate::geometry::HitTolerance;
use crate::mapper::CoordinateMapper;
use crate::model::{AnnotationSet, Draft, translated};
use crate::session::DrawingSession;
use crate::snap::snap_to_wick;
use chartlab_core::annotation::entity::{AnnotationId, MarkerKind, Shape, ToolKind, WireAnnotation};
use chartlab_core::annotation::error::AnnotationError;
use chartlab_core::annotation::port::AnnotationSink;
use chartlab_core::chart::entity::{Candle, ChartPoint, PixelPos};
use chartlab_core::chart::error::ConversionError;
use chartlab_core::chart::port::ChartView;
use chartlab_core::common::SessionToken;
use chartlab_core::common::time::{RealTimeProvider, TimeProvider};
use chartlab_core::config::DrawingConfig;
use chartlab_core::exercise::ExerciseConfig;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 引擎对外可见的状态。拖拽属于引擎内部模式，对外表现为 `ToolArmed`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    ToolArmed,
    Drawing,
}

/// # Summary
/// 事件处理结果，告诉宿主接下来该做什么。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    // 事件未产生任何效果
    Ignored,
    // 没有激活的工具，事件应交给底层图表处理平移/缩放
    PassThrough,
    // 绘制中标注、选中状态或悬停位置变化，需要重绘
    Redraw,
    // 已提交的标注集合发生变更
    Committed,
}

// 指针移动节流状态
#[derive(Debug, Clone, Copy)]
struct MoveTrack {
    press: PixelPos,
    last_pos: PixelPos,
    last_at: DateTime<Utc>,
    pending: Option<PixelPos>,
    moved: bool,
}

impl MoveTrack {
    fn new(press: PixelPos, now: DateTime<Utc>) -> Self {
        Self {
            press,
            last_pos: press,
            last_at: now,
            pending: None,
            moved: false,
        }
    }
}

#[derive(Debug, Clone)]
enum Gesture {
    None,
    Drawing(MoveTrack),
    Dragging {
        id: AnnotationId,
        origin: Shape,
        before: AnnotationSet,
        track: MoveTrack,
    },
}

/// # Summary
/// 交互式绘图状态机：工具选择、指针驱动的创建/选择/拖拽、删除与撤销。
///
/// # Invariants
/// - 所有对标注集合的结构性修改都经由 `AnnotationSet` 的操作完成。
/// - 已提交的变更在变更前压入历史快照；手势作废或取消不触碰历史。
/// - 视图每个事件由调用方传入，引擎不持有也不缓存任何像素位置。
pub struct DrawingEngine {
    session: DrawingSession,
    exercise: ExerciseConfig,
    config: DrawingConfig,
    tolerance: HitTolerance,
    marker: MarkerKind,
    candles: Vec<Candle>,
    gesture: Gesture,
    hover: Option<PixelPos>,
    clock: Arc<dyn TimeProvider>,
    sink: Option<Arc<dyn AnnotationSink>>,
    token: SessionToken,
}

impl DrawingEngine {
    pub fn new(exercise: ExerciseConfig, config: DrawingConfig) -> Self {
        Self::with_clock(exercise, config, Arc::new(RealTimeProvider))
    }

    /// # Summary
    /// 使用指定时钟创建引擎，时钟只用于指针移动节流。
    pub fn with_clock(
        exercise: ExerciseConfig,
        config: DrawingConfig,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            session: DrawingSession::new(config.history_depth),
            tolerance: HitTolerance::from(&config),
            exercise,
            config,
            marker: MarkerKind::default(),
            candles: Vec::new(),
            gesture: Gesture::None,
            hover: None,
            clock,
            sink: None,
            token: SessionToken::new(),
        }
    }

    pub fn set_sink(&mut self, sink: Arc<dyn AnnotationSink>) {
        self.sink = Some(sink);
    }

    // ---------------------------------------------------------------
    // 查询
    // ---------------------------------------------------------------

    pub fn state(&self) -> EngineState {
        if self.session.draft().is_some() {
            EngineState::Drawing
        } else if self.session.active_tool().is_some() {
            EngineState::ToolArmed
        } else {
            EngineState::Idle
        }
    }

    pub fn active_tool(&self) -> Option<ToolKind> {
        self.session.active_tool()
    }

    pub fn annotations(&self) -> &AnnotationSet {
        self.session.set()
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.session.draft()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    pub fn marker_kind(&self) -> MarkerKind {
        self.marker
    }

    /// 悬停位置，仅在工具激活时存在。
    pub fn hover(&self) -> Option<PixelPos> {
        self.hover
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn exercise(&self) -> &ExerciseConfig {
        &self.exercise
    }

    pub fn history_len(&self) -> usize {
        self.session.history_len()
    }

    /// 会话令牌的共享句柄，换图时递增，评分适配器据此丢弃过期响应。
    pub fn session_token(&self) -> SessionToken {
        self.token.clone()
    }

    pub fn to_wire(&self) -> Vec<WireAnnotation> {
        self.session.set().to_wire()
    }

    // ---------------------------------------------------------------
    // 会话与工具
    // ---------------------------------------------------------------

    /// # Summary
    /// 加载新图表：丢弃集合、绘制中标注与历史，并用已保存的标注预填充。
    ///
    /// # Logic
    /// 1. 作废进行中的手势与悬停状态。
    /// 2. 递增会话令牌，使在途的评分响应失效。
    /// 3. 校验每条已保存标注，非法条目跳过。
    ///
    /// # Arguments
    /// * `candles`: 新图表的 K 线，用于影线吸附与评分。
    /// * `initial`: 已保存的标注，可为空。
    ///
    /// # Returns
    /// 实际载入的标注数。
    pub fn load_chart(&mut self, candles: Vec<Candle>, initial: &[WireAnnotation]) -> usize {
        let (set, skipped) = AnnotationSet::from_wire(initial);
        let loaded = set.len();
        self.gesture = Gesture::None;
        self.hover = None;
        self.candles = candles;
        self.session.reset(set);
        let token = self.token.advance();
        info!(
            "Chart loaded: {} candles, {loaded} drawings restored, {skipped} skipped, session {token}",
            self.candles.len()
        );
        loaded
    }

    /// # Summary
    /// 替换练习配置。当前工具不再可用时退回空闲。
    pub fn set_exercise(&mut self, exercise: ExerciseConfig) {
        let disabled = self
            .session
            .active_tool()
            .is_some_and(|tool| !exercise.is_enabled(tool));
        if disabled {
            self.abort_gesture();
            self.session.set_active_tool(None);
            self.hover = None;
        }
        self.exercise = exercise;
    }

    /// # Summary
    /// 选择工具。
    ///
    /// # Logic
    /// 1. 未启用的工具被拒绝，状态不变。
    /// 2. 再次选择当前工具时切回空闲，指针事件交还图表。
    /// 3. 切换工具会作废进行中的手势。
    ///
    /// # Returns
    /// 新的引擎状态；工具未启用返回 `InvalidToolSelection`。
    pub fn select_tool(&mut self, kind: ToolKind) -> Result<EngineState, AnnotationError> {
        if !self.exercise.is_enabled(kind) {
            warn!(
                "Rejected tool {kind} for exercise {}",
                self.exercise.exercise_type
            );
            return Err(AnnotationError::InvalidToolSelection(kind));
        }
        self.abort_gesture();
        if self.session.active_tool() == Some(kind) {
            debug!("Tool {kind} toggled off");
            self.session.set_active_tool(None);
            self.hover = None;
        } else {
            debug!("Tool {kind} armed");
            self.session.set_active_tool(Some(kind));
        }
        Ok(self.state())
    }

    pub fn set_marker_kind(&mut self, marker: MarkerKind) {
        self.marker = marker;
    }

    pub fn toggle_marker_kind(&mut self) -> MarkerKind {
        self.marker = self.marker.toggled();
        self.marker
    }

    // ---------------------------------------------------------------
    // 指针事件
    // ---------------------------------------------------------------

    /// # Summary
    /// 指针按下。
    ///
    /// # Logic
    /// - 空闲：交还图表。
    /// - Pointer 工具：先做命中选择，命中则进入拖拽；未命中则在该处放置摆动点标记
    ///   (按配置吸附到影线) 并立即提交。
    /// - HorizontalLine：一个点即完整，立即提交。
    /// - 其余两点类型：开始绘制。
    /// - 换算不可用时挂起本次手势，不提交任何点。
    pub fn pointer_down(&mut self, view: &dyn ChartView, pos: PixelPos) -> Response {
        let Some(tool) = self.session.active_tool() else {
            return Response::PassThrough;
        };
        if !matches!(self.gesture, Gesture::None) {
            return Response::Ignored;
        }
        let mapper = CoordinateMapper::new(view);
        self.hover = Some(pos);

        if tool == ToolKind::Pointer {
            if let Some(id) = self
                .session
                .set_mut()
                .select_at(&mapper, pos, self.tolerance)
            {
                return self.begin_drag(id, pos);
            }
            let point = match self.place_marker(&mapper, pos) {
                Ok(point) => point,
                Err(e) => return Self::suspend(e),
            };
            let draft = match Draft::begin(&self.exercise, tool, point) {
                Ok(draft) => draft.with_marker(self.marker),
                Err(e) => {
                    warn!("Pointer marker rejected: {e}");
                    return Response::Redraw;
                }
            };
            return self.commit(draft);
        }

        let point = match mapper.pixel_to_point(pos) {
            Ok(point) => point,
            Err(e) => return Self::suspend(e),
        };
        let draft = match Draft::begin(&self.exercise, tool, point) {
            Ok(draft) => draft,
            Err(e) => {
                warn!("Gesture rejected: {e}");
                return Response::Ignored;
            }
        };
        if tool.commits_on_press() {
            return self.commit(draft);
        }
        debug!("Drawing {tool} started at {pos:?}");
        self.session.set_draft(Some(draft));
        self.gesture = Gesture::Drawing(MoveTrack::new(pos, self.clock.now()));
        Response::Redraw
    }

    /// # Summary
    /// 指针移动。
    ///
    /// # Logic
    /// 1. 绘制/拖拽中：亚像素移动直接丢弃；节流间隔内的移动只记为待处理，
    ///    留待下一次移动或抬起时应用。
    /// 2. 应用时总是从手势起点重新计算，重复事件不会累积误差。
    /// 3. 无手势但工具已激活：只更新悬停位置。
    pub fn pointer_move(&mut self, view: &dyn ChartView, pos: PixelPos) -> Response {
        if self.session.active_tool().is_none() {
            return Response::PassThrough;
        }
        self.hover = Some(pos);
        let now = self.clock.now();
        let min_move = self.config.min_move_px;
        let throttle_ms = i64::try_from(self.config.move_throttle_ms).unwrap_or(i64::MAX);

        let track = match &mut self.gesture {
            Gesture::None => return Response::Redraw,
            Gesture::Drawing(track) | Gesture::Dragging { track, .. } => track,
        };
        if track.last_pos.distance_to(pos) < min_move {
            return Response::Ignored;
        }
        if (now - track.last_at).num_milliseconds() < throttle_ms {
            track.pending = Some(pos);
            return Response::Ignored;
        }
        track.last_at = now;
        self.apply_move(view, pos)
    }

    /// # Summary
    /// 指针抬起：结束绘制或拖拽。
    ///
    /// # Logic
    /// - 绘制中：若手势期间发生过移动，以抬起位置作为最终点，然后提交；
    ///   点数不足则静默作废，不触碰历史。
    /// - 拖拽中：若发生过移动，压入拖拽前的快照并发布。
    pub fn pointer_up(&mut self, view: &dyn ChartView, pos: PixelPos) -> Response {
        match &self.gesture {
            Gesture::None => {
                if self.session.active_tool().is_none() {
                    Response::PassThrough
                } else {
                    Response::Ignored
                }
            }
            Gesture::Drawing(track) => {
                if track.moved || track.pending.is_some() {
                    self.apply_move(view, pos);
                }
                self.gesture = Gesture::None;
                match self.session.take_draft() {
                    Some(draft) => self.commit(draft),
                    None => Response::Redraw,
                }
            }
            Gesture::Dragging { track, .. } => {
                if track.moved || track.pending.is_some() {
                    self.apply_move(view, pos);
                }
                match std::mem::replace(&mut self.gesture, Gesture::None) {
                    Gesture::Dragging {
                        id,
                        before,
                        track,
                        ..
                    } if track.moved => {
                        info!("Annotation {id} moved");
                        self.session.push_snapshot(before);
                        self.emit();
                        Response::Committed
                    }
                    _ => Response::Redraw,
                }
            }
        }
    }

    /// 指针离开绘图区，隐藏悬停提示。
    pub fn pointer_leave(&mut self) -> Response {
        if self.hover.take().is_some() {
            Response::Redraw
        } else {
            Response::Ignored
        }
    }

    /// # Summary
    /// 取消 (Escape)：作废绘制中标注，或将拖拽中的标注还原；不触碰历史。
    pub fn cancel(&mut self) -> Response {
        if matches!(self.gesture, Gesture::None) {
            return Response::Ignored;
        }
        self.abort_gesture();
        Response::Redraw
    }

    // ---------------------------------------------------------------
    // 编辑命令
    // ---------------------------------------------------------------

    /// # Summary
    /// 删除选中标注，并记录历史。无选中时为空操作。
    pub fn delete_selected(&mut self) -> Response {
        self.abort_gesture();
        let Some(id) = self.session.set().selected().map(|a| a.id) else {
            return Response::Ignored;
        };
        self.session.record(AnnotationSet::delete_selected);
        info!("Annotation {id} deleted");
        self.emit();
        Response::Committed
    }

    /// # Summary
    /// 撤销：恢复上一个快照，历史为空时清空集合。
    /// 不改变当前工具与状态，绘制中的草稿保留；进行中的拖拽随集合一起被快照覆盖。
    pub fn undo(&mut self) -> Response {
        if matches!(self.gesture, Gesture::Dragging { .. }) {
            self.gesture = Gesture::None;
        }
        self.session.undo();
        debug!(
            "Undo: {} annotations, {} snapshots left",
            self.session.set().len(),
            self.session.history_len()
        );
        self.emit();
        Response::Committed
    }

    /// 清空全部标注，可撤销。
    pub fn clear(&mut self) -> Response {
        self.abort_gesture();
        if self.session.set().is_empty() {
            return Response::Ignored;
        }
        self.session.record(AnnotationSet::clear);
        info!("All annotations cleared");
        self.emit();
        Response::Committed
    }

    /// 按 id 选择标注，用于列表等非指针入口。
    pub fn select(&mut self, id: AnnotationId) -> Result<Response, AnnotationError> {
        self.session.set_mut().select_id(id)?;
        Ok(Response::Redraw)
    }

    /// 切换单个标注的可见性。
    pub fn toggle_visibility(&mut self, id: AnnotationId) -> Result<Response, AnnotationError> {
        let visible = self
            .session
            .set()
            .get(id)
            .map(|a| a.visible)
            .ok_or(AnnotationError::NotFound(id))?;
        self.session.set_mut().set_visible(id, !visible)?;
        self.emit();
        Ok(Response::Committed)
    }

    pub fn set_all_visible(&mut self, visible: bool) -> Response {
        self.session.set_mut().set_all_visible(visible);
        self.emit();
        Response::Committed
    }

    // ---------------------------------------------------------------
    // 内部
    // ---------------------------------------------------------------

    fn begin_drag(&mut self, id: AnnotationId, pos: PixelPos) -> Response {
        let Some(annotation) = self.session.set().get(id) else {
            return Response::Redraw;
        };
        debug!("Annotation {id} selected");
        self.gesture = Gesture::Dragging {
            id,
            origin: annotation.shape.clone(),
            before: self.session.set().clone(),
            track: MoveTrack::new(pos, self.clock.now()),
        };
        Response::Redraw
    }

    // 摆动点标记：按配置吸附到影线，吸附失败时退回原始点
    fn place_marker(
        &self,
        mapper: &CoordinateMapper<'_>,
        pos: PixelPos,
    ) -> Result<ChartPoint, ConversionError> {
        let raw = mapper.pixel_to_point(pos)?;
        if !self.exercise.snaps_to_wick() {
            return Ok(raw);
        }
        Ok(snap_to_wick(&self.candles, mapper, pos).unwrap_or(raw))
    }

    // 将位置应用到当前手势；换算失败时保持上一次的结果
    fn apply_move(&mut self, view: &dyn ChartView, pos: PixelPos) -> Response {
        let mapper = CoordinateMapper::new(view);
        match &mut self.gesture {
            Gesture::None => Response::Ignored,
            Gesture::Drawing(track) => {
                track.pending = None;
                let point = match mapper.pixel_to_point(pos) {
                    Ok(point) => point,
                    Err(e) => {
                        debug!("Gesture suspended: {e}");
                        return Response::Ignored;
                    }
                };
                track.last_pos = pos;
                track.moved = true;
                if let Some(draft) = self.session.draft_mut() {
                    draft.extend(point);
                }
                Response::Redraw
            }
            Gesture::Dragging {
                id, origin, track, ..
            } => {
                track.pending = None;
                let (dx, dy) = (pos.x - track.press.x, pos.y - track.press.y);
                let shape = match translated(origin, &mapper, dx, dy) {
                    Ok(shape) => shape,
                    Err(e) => {
                        debug!("Drag suspended: {e}");
                        return Response::Ignored;
                    }
                };
                track.last_pos = pos;
                track.moved = true;
                let id = *id;
                if let Err(e) = self.session.set_mut().replace_shape(id, shape) {
                    warn!("Drag target vanished: {e}");
                    self.gesture = Gesture::None;
                }
                Response::Redraw
            }
        }
    }

    fn commit(&mut self, draft: Draft) -> Response {
        if let Err(e) = draft.finish() {
            debug!("Gesture discarded: {e}");
            return Response::Redraw;
        }
        match self.session.record(|set| set.commit(&draft)) {
            Ok(id) => {
                info!("Committed {} annotation {id}", draft.kind());
                self.emit();
                Response::Committed
            }
            Err(e) => {
                // finish 已校验过，这里不可达；撤回刚压入的快照
                warn!("Commit failed after validation: {e}");
                self.session.undo();
                Response::Redraw
            }
        }
    }

    fn abort_gesture(&mut self) {
        match std::mem::replace(&mut self.gesture, Gesture::None) {
            Gesture::None => {}
            Gesture::Drawing(_) => {
                self.session.set_draft(None);
                debug!("Drawing cancelled");
            }
            Gesture::Dragging { id, origin, .. } => {
                if let Err(e) = self.session.set_mut().replace_shape(id, origin) {
                    warn!("Drag revert failed: {e}");
                }
                debug!("Drag of {id} cancelled");
            }
        }
    }

    fn suspend(error: ConversionError) -> Response {
        debug!("Gesture suspended: {error}");
        Response::Ignored
    }

    fn emit(&self) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.persist(&self.session.set().to_wire()) {
            warn!("Failed to persist drawings: {e}");
        }
    }
}
