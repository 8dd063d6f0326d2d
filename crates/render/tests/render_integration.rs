use chartlab_core::annotation::entity::ToolKind;
use chartlab_core::chart::entity::PixelPos;
use chartlab_core::chart::port::ViewListener;
use chartlab_core::common::time::FakeClockProvider;
use chartlab_core::config::DrawingConfig;
use chartlab_core::exercise::ExerciseConfig;
use chartlab_core::test_utils::{EPOCH_2024, standard_view, ts};
use chartlab_drawing::DrawingEngine;
use chartlab_render::{Owner, Primitive, RenderInput, Renderer};
use std::sync::Arc;

fn px(x: f64, y: f64) -> PixelPos {
    PixelPos::new(x, y)
}

fn engine() -> (DrawingEngine, Arc<FakeClockProvider>) {
    let clock = Arc::new(FakeClockProvider::new(ts(EPOCH_2024)));
    let engine = DrawingEngine::with_clock(
        ExerciseConfig::default(),
        DrawingConfig::default(),
        clock.clone(),
    );
    (engine, clock)
}

fn segments(primitives: Vec<&Primitive>) -> Vec<(PixelPos, PixelPos)> {
    primitives
        .into_iter()
        .filter_map(|p| match p {
            Primitive::Segment { from, to, .. } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

fn close(a: PixelPos, b: PixelPos) -> bool {
    a.distance_to(b) < 1e-6
}

#[test]
fn test_view_change_reprojects_annotations() {
    let (mut engine, clock) = engine();
    let mut view = standard_view();
    engine.select_tool(ToolKind::Line).unwrap();
    engine.pointer_down(&view, px(10.0, 10.0));
    clock.advance_millis(50);
    engine.pointer_move(&view, px(100.0, 100.0));
    engine.pointer_up(&view, px(100.0, 100.0));
    engine.select_tool(ToolKind::Line).unwrap();
    let id = engine.annotations().iter().next().unwrap().id;

    let mut renderer = Renderer::new();
    let scene = renderer.frame(RenderInput::from_engine(&engine), &view);
    let lines = segments(scene.owned_by(Owner::Annotation(id)).collect());
    assert!(close(lines[0].0, px(10.0, 10.0)) && close(lines[0].1, px(100.0, 100.0)));

    // 未变脏时直接复用上一帧
    renderer.frame(RenderInput::from_engine(&engine), &view);
    assert_eq!(renderer.renders(), 1);

    view.pan(40.0, -20.0);
    renderer.view_changed();
    assert!(renderer.is_dirty());
    let scene = renderer.frame(RenderInput::from_engine(&engine), &view);
    let lines = segments(scene.owned_by(Owner::Annotation(id)).collect());
    assert!(close(lines[0].0, px(50.0, -10.0)) && close(lines[0].1, px(140.0, 80.0)));
    assert_eq!(renderer.renders(), 2);
}

#[test]
fn test_hidden_and_selected_styling() {
    let (mut engine, _) = engine();
    let view = standard_view();
    engine.select_tool(ToolKind::HorizontalLine).unwrap();
    engine.pointer_down(&view, px(0.0, 100.0));
    engine.pointer_down(&view, px(0.0, 300.0));
    let ids: Vec<_> = engine.annotations().iter().map(|a| a.id).collect();

    engine.select_tool(ToolKind::Pointer).unwrap();
    engine.pointer_down(&view, px(400.0, 100.0));
    engine.pointer_up(&view, px(400.0, 100.0));
    engine.toggle_visibility(ids[1]).unwrap();
    engine.pointer_leave();

    let mut renderer = Renderer::new();
    let scene = renderer.render(RenderInput::from_engine(&engine), &view);
    assert_eq!(scene.owned_by(Owner::Annotation(ids[1])).count(), 0);
    let selected: Vec<_> = scene.owned_by(Owner::Annotation(ids[0])).collect();
    assert_eq!(selected.len(), 1);
    match selected[0] {
        Primitive::Segment { from, to, stroke } => {
            assert!(close(*from, px(0.0, 100.0)) && close(*to, px(800.0, 100.0)));
            assert_eq!(stroke.width, 2.0);
            assert_eq!(stroke.dash, Some([5.0, 3.0]));
        }
        other => panic!("unexpected primitive {other:?}"),
    }
}

#[test]
fn test_fibonacci_levels_and_labels() {
    let (mut engine, clock) = engine();
    let view = standard_view();
    engine.select_tool(ToolKind::Fibonacci).unwrap();
    // 价格 100 → y = 200，价格 200 → y = 0
    engine.pointer_down(&view, px(100.0, 200.0));
    clock.advance_millis(50);
    engine.pointer_move(&view, px(300.0, 0.0));
    engine.pointer_up(&view, px(300.0, 0.0));
    engine.pointer_leave();

    let mut renderer = Renderer::new();
    let scene = renderer.render(RenderInput::from_engine(&engine), &view);
    let labels: Vec<_> = scene.labels().collect();
    assert_eq!(labels.len(), 7);
    assert!(labels.contains(&"0 - 100.00"));
    assert!(labels.contains(&"0.5 - 150.00"));
    assert!(labels.contains(&"1 - 200.00"));

    let mid = scene
        .items()
        .iter()
        .find_map(|item| match &item.primitive {
            Primitive::Label { at, text, .. } if text.starts_with("0.5 ") => Some(*at),
            _ => None,
        })
        .unwrap();
    assert!(close(mid, px(730.0, 100.0)));
}

#[test]
fn test_draft_and_hover_affordance() {
    let (mut engine, _) = engine();
    let view = standard_view();
    engine.select_tool(ToolKind::Box).unwrap();
    engine.pointer_down(&view, px(100.0, 100.0));

    let mut renderer = Renderer::new();
    let scene = renderer.render(RenderInput::from_engine(&engine), &view);
    assert_eq!(scene.owned_by(Owner::Draft).count(), 1);
    assert_eq!(scene.owned_by(Owner::Hover).count(), 3);
    // (100, 100) → 2024-01-01 01:40, 150
    assert!(scene.labels().any(|l| l == "Price: 150.00 | Date: 2024-01-01"));
}

#[test]
fn test_unavailable_view_renders_empty_frame() {
    let (mut engine, _) = engine();
    let mut view = standard_view();
    engine.select_tool(ToolKind::HorizontalLine).unwrap();
    engine.pointer_down(&view, px(0.0, 100.0));

    view.set_laid_out(false);
    let mut renderer = Renderer::new();
    assert!(renderer.render(RenderInput::from_engine(&engine), &view).is_empty());
}
