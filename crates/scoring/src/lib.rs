//! # chartlab-scoring
//!
//! 评分适配层：标注序列化、单飞行提交、HTTP 评分服务与本地参考评分规则。

pub mod adapter;
pub mod http;
pub mod reference;
pub mod swing;

pub use adapter::ScoringAdapter;
pub use http::HttpScoringService;
pub use reference::ReferenceScorer;
