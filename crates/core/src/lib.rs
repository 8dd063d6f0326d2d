//! # chartlab-core
//!
//! 图表标注练习系统的领域核心：实体、错误枚举与端口 (Port) 定义。
//! 具体实现位于 `chartlab-drawing`、`chartlab-render` 与 `chartlab-scoring`。

pub mod annotation;
pub mod chart;
pub mod common;
pub mod config;
pub mod exercise;
pub mod scoring;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
