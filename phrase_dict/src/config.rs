//! 后端配置：从 TOML 读入成员短语表与短语表组，组装成 `Backend`。
//!
//! ```
//! use phrase_dict::BackendConfig;
//!
//! let config = BackendConfig::from_toml_str(r#"
//!     threads = 1
//!
//!     [[tables]]
//!     name = "SA0"
//!     kind = "suffix_array"
//!     path = "grammars"
//!     num_features = 2
//!
//!     [group]
//!     name = "Group0"
//!     members = ["SA0"]
//!     num_features = 2
//!     restrict = true
//! "#).unwrap();
//!
//! assert_eq!(config.tables.len(), 1);
//! assert!(config.group.restrict);
//! ```

use std::path::{Path, PathBuf};

use phrase_core::{
    group::{GroupConfig, PhraseTableGroup},
    model::ScoreProducer,
    phrase_table::PhraseTable,
    session::Backend,
};
use serde::Deserialize;

use crate::{error::ConfigError, memory::MemoryPhraseTable, suffix_array::SuffixArrayGrammar};

/// 后端配置。
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// 解码线程数
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// 可用的成员短语表
    #[serde(default)]
    pub tables: Vec<TableConfig>,

    /// 融合组
    pub group: GroupConfig,
}

fn default_threads() -> usize {
    1
}

/// 成员短语表的实现类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// 启动时整表加载
    Memory,
    /// 每句加载 `<path>/grammar.<id>.gz`
    SuffixArray,
}

/// 单个成员短语表。
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    pub name: String,
    pub kind: TableKind,
    /// 文件（memory）或目录（suffix_array）；相对路径相对于配置文件所在目录
    pub path: PathBuf,
    pub num_features: usize,
    #[serde(default)]
    pub weights: Option<Vec<f32>>,
    #[serde(default)]
    pub table_limit: usize,
}

impl TableConfig {
    /// 构建短语表；memory 类型在这里完成加载。
    pub fn build(&self, base_dir: &Path) -> Result<Box<dyn PhraseTable>, ConfigError> {
        let producer = ScoreProducer::new(self.name.clone(), self.num_features, self.weights.clone())?;
        let path = base_dir.join(&self.path);
        let table: Box<dyn PhraseTable> = match self.kind {
            TableKind::Memory => Box::new(MemoryPhraseTable::from_path(producer, path, self.table_limit)?),
            TableKind::SuffixArray => Box::new(SuffixArrayGrammar::new(producer, path, self.table_limit)),
        };
        Ok(table)
    }
}

impl BackendConfig {
    /// 从 TOML 文件读取配置。
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// 从 TOML 字符串解析配置。
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// 构建全部短语表与融合组；所有配置错误在这里一次性暴露。
    pub fn build(&self, base_dir: impl AsRef<Path>) -> Result<Backend, ConfigError> {
        let base_dir = base_dir.as_ref();
        let tables = self
            .tables
            .iter()
            .map(|t| t.build(base_dir))
            .collect::<Result<Vec<_>, _>>()?;
        let group = PhraseTableGroup::new(self.group.clone(), tables)?;
        Ok(Backend::new(group, self.threads)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        threads = 2

        [[tables]]
        name = "TM0"
        kind = "memory"
        path = "phrase-table"
        num_features = 2
        weights = [0.5, 0.5]
        table_limit = 20

        [[tables]]
        name = "SA0"
        kind = "suffix_array"
        path = "grammars"
        num_features = 1

        [group]
        name = "Group0"
        members = ["TM0", "SA0"]
        num_features = 3
        default_scores = [-100.0, -100.0, -100.0]
        table_limit = 10
    "#;

    #[test]
    fn parses_tables_and_group() {
        let config = BackendConfig::from_toml_str(CONFIG).unwrap();
        assert_eq!(config.threads, 2);
        assert_eq!(config.tables[0].kind, TableKind::Memory);
        assert_eq!(config.tables[0].weights, Some(vec![0.5, 0.5]));
        assert_eq!(config.tables[1].kind, TableKind::SuffixArray);
        assert_eq!(config.tables[1].table_limit, 0);
        assert_eq!(config.group.members, vec!["TM0", "SA0"]);
        assert!(!config.group.restrict);
        assert_eq!(config.group.default_scores, Some(vec![-100.0; 3]));
        assert_eq!(config.group.table_limit, 10);
    }

    #[test]
    fn threads_default_to_one() {
        let config = BackendConfig::from_toml_str(
            r#"
            [group]
            name = "G"
            members = ["A"]
            num_features = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.threads, 1);
        assert!(config.tables.is_empty());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = BackendConfig::from_toml_str(
            r#"
            [[tables]]
            name = "X"
            kind = "compact"
            path = "x"
            num_features = 1

            [group]
            name = "G"
            members = ["X"]
            num_features = 1
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
