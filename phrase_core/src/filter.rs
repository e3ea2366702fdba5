//! `filter`：候选后处理（目前只有按 future score 的 top-K 裁剪）。

use crate::candidate_set::CandidateSet;

/// Filter：对候选集合做后处理。
pub trait Filter: Send + Sync {
    fn apply(&self, candidates: CandidateSet) -> CandidateSet;
}

/// 表限制：保留 future score 最好的 `limit` 条；`limit == 0` 表示不限。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableLimit {
    pub limit: usize,
}

impl Filter for TableLimit {
    fn apply(&self, mut candidates: CandidateSet) -> CandidateSet {
        candidates.prune(self.limit);
        candidates
    }
}
