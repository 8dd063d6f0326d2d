//! # chartlab-drawing
//!
//! 交互式标注子系统：坐标换算、标注集合、撤销历史与指针驱动的绘图状态机。

pub mod engine;
pub mod geometry;
pub mod history;
pub mod mapper;
pub mod model;
pub mod persist;
pub mod session;
pub mod snap;

pub use engine::{DrawingEngine, EngineState, Response};
pub use mapper::CoordinateMapper;
pub use model::{AnnotationSet, Draft};
pub use session::DrawingSession;
