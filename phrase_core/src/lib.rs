//! `phrase_core`：短语表后端的纯逻辑层，不做任何 I/O。
//!
//! 设计目标：
//! - **核心可复用**：解码器、命令行、测试都复用同一套融合与生命周期逻辑
//! - **分层清晰**：session -> group（多模型融合）-> phrase_table（成员模型）-> filter（top-K）-> `CandidateSet`
//! - **句子作用域显式化**：`SentenceContext` 作为参数逐层传递，不依赖全局状态
pub mod cache;
pub mod candidate_set;
pub mod context;
pub mod error;
pub mod filter;
pub mod group;
pub mod model;
pub mod phrase_table;
pub mod session;

pub use error::{Error, Result};
