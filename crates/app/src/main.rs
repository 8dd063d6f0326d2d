mod settings;

use chartlab_core::chart::entity::{Candle, Viewport};
use chartlab_core::chart::linear::LinearChartView;
use chartlab_core::config::ScoringMode;
use chartlab_core::scoring::entity::ExerciseMeta;
use chartlab_core::scoring::port::ScoringService;
use chartlab_drawing::DrawingEngine;
use chartlab_drawing::persist::load_drawings;
use chartlab_render::{RenderInput, Renderer};
use chartlab_scoring::{HttpScoringService, ReferenceScorer, ScoringAdapter};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// # Summary
/// 无界面评分入口：回放已保存的标注并提交评分。
///
/// # Logic
/// 1. 初始化日志 (默认 info，可由 RUST_LOG 覆盖)。
/// 2. 分层加载配置。
/// 3. 读取 K 线与已保存标注，在适配数据的线性视图上恢复绘图会话。
/// 4. 渲染一帧。
/// 5. 通过配置的评分后端提交并输出评分明细。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("ChartLab grader starting...");

    // 2. 加载配置
    let config = settings::load("chartlab")?;
    let session = &config.session;

    // 3. 恢复绘图会话
    let candles: Vec<Candle> = serde_json::from_slice(&std::fs::read(&session.chart_file)?)?;
    let drawings = load_drawings(Path::new(&session.drawings_file))?;
    let viewport = Viewport::new(session.viewport_width, session.viewport_height);
    let view = LinearChartView::fit(&candles, viewport)
        .ok_or("chart has no candles or the viewport is empty")?;

    let mut engine = DrawingEngine::new(session.exercise.clone(), config.drawing.clone());
    let restored = engine.load_chart(candles.clone(), &drawings);
    if restored < drawings.len() {
        warn!("{} saved drawings could not be restored", drawings.len() - restored);
    }

    // 4. 渲染一帧
    let mut renderer = Renderer::new();
    let scene = renderer.frame(RenderInput::from_engine(&engine), &view);
    info!("Rendered {} primitives for {restored} drawings", scene.len());

    // 5. 提交评分
    let service: Arc<dyn ScoringService> = match config.scoring.mode {
        ScoringMode::Http => Arc::new(HttpScoringService::new(&config.scoring)?),
        ScoringMode::Reference => Arc::new(ReferenceScorer::new()),
    };
    let adapter = ScoringAdapter::new(service, engine.session_token());
    let meta = ExerciseMeta {
        exam_type: session.exercise.exercise_type.clone(),
        section: session.section.clone(),
        chart_number: session.chart_number,
        interval: session.interval,
    };
    let result = adapter
        .submit(ScoringAdapter::serialize(engine.annotations()), candles, &meta)
        .await?;

    info!(
        "Score: {} / {} ({:.0}%)",
        result.score,
        result.max_score,
        result.ratio() * 100.0
    );
    for item in &result.correct {
        info!("  + {}", item.message);
    }
    for item in &result.incorrect {
        info!("  - {}", item.message);
    }
    Ok(())
}
