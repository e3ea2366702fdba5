//! 错误分类：配置错误（启动期致命）、资源错误（单句致命）、逻辑错误（前置条件被破坏）。
//!
//! 空的 `CandidateSet` 是合法结果（“没有译文”），永远不会用来表示失败。

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("短语表组 `{group}` 没有配置任何成员")]
    EmptyGroup { group: String },

    #[error("短语表组 `{group}` 找不到成员 `{member}`")]
    UnknownMember { group: String, member: String },

    #[error("短语表组 `{group}` 重复引用成员 `{member}`")]
    DuplicateMember { group: String, member: String },

    #[error("短语表组 `{group}` 声明了 {declared} 个分数，但成员分数总数为 {actual}")]
    ScoreCountMismatch {
        group: String,
        declared: usize,
        actual: usize,
    },

    #[error("短语表组 `{group}` 的默认分数长度为 {actual}，应为 {expected}")]
    DefaultScoresLength {
        group: String,
        expected: usize,
        actual: usize,
    },

    #[error("特征 `{producer}` 的权重长度为 {actual}，应为 {expected}")]
    WeightsLength {
        producer: String,
        expected: usize,
        actual: usize,
    },

    #[error("短语表 `{table}` 不是线程安全的，不能在 {threads} 个解码线程下运行")]
    NotThreadSafe { table: String, threads: usize },

    #[error("短语表 `{table}` 加载第 {translation_id} 句的资源失败: {source}")]
    Resource {
        table: String,
        translation_id: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("短语表 `{table}` 在没有活动句子时被查询")]
    NoActiveSentence { table: String },

    #[error("短语表 `{table}` 正在处理第 {active} 句，却收到第 {requested} 句的请求")]
    SentenceMismatch {
        table: String,
        active: u64,
        requested: u64,
    },

    #[error("第 {translation_id} 句的候选缓存已释放，不能再登记")]
    CacheReleased { translation_id: u64 },

    #[error("第 {active} 句尚未结束，不能开始第 {requested} 句")]
    SentenceInFlight { active: u64, requested: u64 },
}

impl Error {
    /// 配置错误只会在启动期出现，调用方应直接中止。
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::EmptyGroup { .. }
                | Error::UnknownMember { .. }
                | Error::DuplicateMember { .. }
                | Error::ScoreCountMismatch { .. }
                | Error::DefaultScoresLength { .. }
                | Error::WeightsLength { .. }
                | Error::NotThreadSafe { .. }
        )
    }

    /// 出错的句子编号（仅资源错误携带）。
    pub fn translation_id(&self) -> Option<u64> {
        match self {
            Error::Resource { translation_id, .. } => Some(*translation_id),
            _ => None,
        }
    }
}
