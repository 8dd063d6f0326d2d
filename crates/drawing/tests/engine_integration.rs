use chartlab_core::annotation::entity::{MarkerKind, ToolKind, WireAnnotation, WirePoint};
use chartlab_core::chart::entity::PixelPos;
use chartlab_core::common::time::FakeClockProvider;
use chartlab_core::config::DrawingConfig;
use chartlab_core::exercise::ExerciseConfig;
use chartlab_core::test_utils::{EPOCH_2024, standard_view, ts};
use chartlab_drawing::persist::{JsonFileSink, load_drawings};
use chartlab_drawing::{CoordinateMapper, DrawingEngine, EngineState, Response};
use std::sync::Arc;

fn engine(exercise: ExerciseConfig) -> (DrawingEngine, Arc<FakeClockProvider>) {
    let clock = Arc::new(FakeClockProvider::new(ts(EPOCH_2024)));
    let engine = DrawingEngine::with_clock(exercise, DrawingConfig::default(), clock.clone());
    (engine, clock)
}

fn px(x: f64, y: f64) -> PixelPos {
    PixelPos::new(x, y)
}

/// # Summary
/// 完整的两点拖拽手势：按下、一次节流外的移动、抬起。
fn drag_gesture(
    engine: &mut DrawingEngine,
    clock: &FakeClockProvider,
    view: &chartlab_core::chart::linear::LinearChartView,
    from: PixelPos,
    to: PixelPos,
) -> Response {
    engine.pointer_down(view, from);
    clock.advance_millis(50);
    engine.pointer_move(view, to);
    engine.pointer_up(view, to)
}

#[test]
fn test_committed_annotations_satisfy_arity() {
    let (mut engine, clock) = engine(ExerciseConfig::default());
    let view = standard_view();

    for tool in ToolKind::ALL {
        engine.select_tool(tool).unwrap();
        if tool.commits_on_press() || tool == ToolKind::Pointer {
            engine.pointer_down(&view, px(700.0, 50.0));
            engine.pointer_up(&view, px(700.0, 50.0));
        } else {
            drag_gesture(&mut engine, &clock, &view, px(20.0, 300.0), px(120.0, 380.0));
        }
        // 下一轮从不同位置开始，避免 Pointer 工具命中已有标注
        engine.select_tool(tool).unwrap();
        clock.advance_millis(50);
    }

    assert_eq!(engine.annotations().len(), 5);
    for annotation in engine.annotations().iter() {
        assert_eq!(annotation.shape.points().len(), annotation.kind().arity());
    }
}

#[test]
fn test_selection_stays_single() {
    let (mut engine, clock) = engine(ExerciseConfig::default());
    let view = standard_view();
    engine.select_tool(ToolKind::Line).unwrap();
    drag_gesture(&mut engine, &clock, &view, px(10.0, 10.0), px(100.0, 100.0));
    drag_gesture(&mut engine, &clock, &view, px(10.0, 100.0), px(100.0, 10.0));
    engine.select_tool(ToolKind::HorizontalLine).unwrap();
    engine.pointer_down(&view, px(0.0, 300.0));

    engine.select_tool(ToolKind::Pointer).unwrap();
    for pos in [px(20.0, 20.0), px(20.0, 90.0), px(500.0, 301.0), px(55.0, 55.0)] {
        engine.pointer_down(&view, pos);
        engine.pointer_up(&view, pos);
        let selected = engine.annotations().iter().filter(|a| a.selected).count();
        assert_eq!(selected, 1);
    }
}

#[test]
fn test_undo_on_empty_history_repeatedly() {
    let (mut engine, _) = engine(ExerciseConfig::default());
    for _ in 0..5 {
        assert_eq!(engine.undo(), Response::Committed);
        assert!(engine.annotations().is_empty());
    }
}

#[test]
fn test_line_without_extend_is_discarded() {
    let (mut engine, _) = engine(ExerciseConfig::default());
    let view = standard_view();
    engine.select_tool(ToolKind::HorizontalLine).unwrap();
    engine.pointer_down(&view, px(50.0, 50.0));
    let before = engine.annotations().clone();
    let history = engine.history_len();

    engine.select_tool(ToolKind::Line).unwrap();
    engine.pointer_down(&view, px(10.0, 10.0));
    assert_eq!(engine.state(), EngineState::Drawing);
    assert_eq!(engine.pointer_up(&view, px(10.0, 10.0)), Response::Redraw);

    assert_eq!(engine.annotations(), &before);
    assert_eq!(engine.history_len(), history);
    assert_eq!(engine.state(), EngineState::ToolArmed);
}

#[test]
fn test_drag_box_keeps_id_and_kind() {
    let (mut engine, clock) = engine(ExerciseConfig::fair_value_gap());
    let view = standard_view();
    engine.select_tool(ToolKind::Box).unwrap();
    drag_gesture(&mut engine, &clock, &view, px(100.0, 100.0), px(200.0, 160.0));
    let id = engine.annotations().iter().next().unwrap().id;

    engine.select_tool(ToolKind::Pointer).unwrap();
    assert_eq!(
        drag_gesture(&mut engine, &clock, &view, px(150.0, 130.0), px(175.0, 110.0)),
        Response::Committed
    );

    assert_eq!(engine.annotations().len(), 1);
    let moved = engine.annotations().get(id).unwrap();
    assert_eq!(moved.kind(), ToolKind::Box);
    let mapper = CoordinateMapper::new(&view);
    let corners = mapper.project_all(&moved.shape.points()).unwrap();
    assert!((corners[0].x - 125.0).abs() < 1e-6 && (corners[0].y - 80.0).abs() < 1e-6);
    assert!((corners[1].x - 225.0).abs() < 1e-6 && (corners[1].y - 140.0).abs() < 1e-6);
}

#[test]
fn test_swing_marking_scenario() {
    let mut exercise = ExerciseConfig::swing_analysis();
    exercise.snap_to_wick = Some(false);
    let (mut engine, _) = engine(exercise);
    let view = standard_view();
    engine.load_chart(Vec::new(), &[]);
    engine.select_tool(ToolKind::Pointer).unwrap();
    engine.set_marker_kind(MarkerKind::High);

    // (200, 100) → T = 2024-01-01 03:20:00, P = 150
    assert_eq!(engine.pointer_down(&view, px(200.0, 100.0)), Response::Committed);
    engine.pointer_up(&view, px(200.0, 100.0));

    assert_eq!(engine.annotations().len(), 1);
    let wire = engine.to_wire();
    assert_eq!(
        wire,
        vec![WireAnnotation {
            kind: ToolKind::Pointer,
            points: vec![WirePoint {
                time: ts(EPOCH_2024 + 12_000),
                price: 150.0,
            }],
            marker_kind: Some(MarkerKind::High),
        }]
    );
    let json = serde_json::to_value(&wire).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "kind": "pointer",
            "points": [{"time": EPOCH_2024 + 12_000, "price": 150.0}],
            "markerKind": "high"
        }])
    );
}

#[test]
fn test_line_draw_and_undo_scenario() {
    let (mut engine, clock) = engine(ExerciseConfig::default());
    let view = standard_view();
    engine.select_tool(ToolKind::Line).unwrap();
    assert_eq!(
        drag_gesture(&mut engine, &clock, &view, px(10.0, 10.0), px(100.0, 100.0)),
        Response::Committed
    );
    assert_eq!(engine.annotations().len(), 1);

    engine.undo();
    assert_eq!(engine.annotations().len(), 0);
    assert_eq!(engine.active_tool(), Some(ToolKind::Line));
}

#[test]
fn test_undo_mid_gesture_keeps_draft() {
    let (mut engine, clock) = engine(ExerciseConfig::default());
    let view = standard_view();
    engine.select_tool(ToolKind::HorizontalLine).unwrap();
    engine.pointer_down(&view, px(0.0, 200.0));

    engine.select_tool(ToolKind::Line).unwrap();
    engine.pointer_down(&view, px(10.0, 10.0));
    assert_eq!(engine.state(), EngineState::Drawing);

    engine.undo();
    assert!(engine.annotations().is_empty());
    assert_eq!(engine.state(), EngineState::Drawing);
    assert_eq!(engine.active_tool(), Some(ToolKind::Line));

    clock.advance_millis(50);
    engine.pointer_move(&view, px(100.0, 100.0));
    assert_eq!(engine.pointer_up(&view, px(100.0, 100.0)), Response::Committed);
    assert_eq!(engine.annotations().len(), 1);
    assert_eq!(engine.annotations().iter().next().unwrap().kind(), ToolKind::Line);
}

#[test]
fn test_tool_restriction_scenario() {
    let (mut engine, _) = engine(ExerciseConfig::fibonacci_retracement());
    assert!(engine.select_tool(ToolKind::Box).is_err());
    assert_eq!(engine.active_tool(), None);

    engine.select_tool(ToolKind::Fibonacci).unwrap();
    assert!(engine.select_tool(ToolKind::Box).is_err());
    assert_eq!(engine.active_tool(), Some(ToolKind::Fibonacci));
}

#[test]
fn test_delete_selected_records_history() {
    let (mut engine, _) = engine(ExerciseConfig::default());
    let view = standard_view();
    engine.select_tool(ToolKind::HorizontalLine).unwrap();
    engine.pointer_down(&view, px(0.0, 200.0));
    assert_eq!(engine.delete_selected(), Response::Ignored);

    engine.select_tool(ToolKind::Pointer).unwrap();
    engine.pointer_down(&view, px(300.0, 200.0));
    engine.pointer_up(&view, px(300.0, 200.0));
    assert_eq!(engine.delete_selected(), Response::Committed);
    assert!(engine.annotations().is_empty());

    engine.undo();
    assert_eq!(engine.annotations().len(), 1);
}

#[test]
fn test_history_is_bounded() {
    let (mut engine, _) = engine(ExerciseConfig::default());
    let view = standard_view();
    engine.select_tool(ToolKind::HorizontalLine).unwrap();
    for i in 0..25_u32 {
        engine.pointer_down(&view, px(0.0, 10.0 * f64::from(i)));
    }
    assert_eq!(engine.annotations().len(), 25);
    assert_eq!(engine.history_len(), 20);

    for _ in 0..20 {
        engine.undo();
    }
    assert_eq!(engine.annotations().len(), 5);
    // 历史耗尽后撤销等价于清空
    engine.undo();
    assert!(engine.annotations().is_empty());
}

#[test]
fn test_json_file_sink_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drawings").join("chart-1.json");

    let (mut engine, clock) = engine(ExerciseConfig::default());
    engine.set_sink(Arc::new(JsonFileSink::new(&path)));
    let view = standard_view();
    engine.select_tool(ToolKind::Fibonacci).unwrap();
    drag_gesture(&mut engine, &clock, &view, px(100.337, 300.0), px(300.71, 100.0));

    let saved = load_drawings(&path).unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].kind, ToolKind::Fibonacci);

    let (mut resumed, _) = self::engine(ExerciseConfig::default());
    assert_eq!(resumed.load_chart(Vec::new(), &saved), 1);
    assert_eq!(engine.to_wire(), resumed.to_wire());
    assert_eq!(engine.to_wire(), saved);
}

#[test]
fn test_missing_drawings_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_drawings(&dir.path().join("absent.json")).unwrap().is_empty());
}
