use std::path::PathBuf;

use thiserror::Error;

/// 规则表加载错误（都带资源路径，便于定位是哪一句的语法出了问题）。
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("读取 {path} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: 无法识别的规则表格式")]
    UnknownFormat { path: PathBuf },

    #[error("{path} 第 {line} 行: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{path} 第 {line} 行: 分数个数为 {actual}，应为 {expected}")]
    ScoreCount {
        path: PathBuf,
        line: usize,
        expected: usize,
        actual: usize,
    },
}

/// 配置错误。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Backend(#[from] phrase_core::Error),
}
