//! `phrase_dict`：短语表的 I/O 层。
//!
//! - `loader`：规则表文本格式（gz 或纯文本），按首条规则嗅探格式
//! - `memory`：启动时一次性加载的静态短语表
//! - `suffix_array`：每句加载、句末丢弃的动态语法
//! - `config`：TOML 配置 -> `phrase_core::session::Backend`
pub mod config;
pub mod error;
pub mod loader;
pub mod memory;
pub mod rule_table;
pub mod suffix_array;

pub use config::BackendConfig;
pub use error::{ConfigError, LoadError};
pub use memory::MemoryPhraseTable;
pub use rule_table::RuleTable;
pub use suffix_array::SuffixArrayGrammar;
