//! # chartlab-render
//!
//! 将标注集合、绘制中标注与悬停提示投影为与后端无关的矢量显示列表。

pub mod renderer;
pub mod scene;

pub use renderer::{RenderInput, Renderer};
pub use scene::{Owner, Primitive, Scene, Stroke};
