//! `CandidateSet`：某个源短语在某一句中的全部候选。

use std::cmp::Ordering;

use crate::model::ScoredCandidate;

/// 候选集合（有序序列）。
///
/// 约定：
/// - `nth_element(limit)` 只保证最好的 `limit` 条排在前面，其余顺序不定
/// - `limit == 0` 表示不限
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    candidates: Vec<ScoredCandidate>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            candidates: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, candidate: ScoredCandidate) {
        self.candidates.push(candidate);
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredCandidate> {
        self.candidates.iter()
    }

    /// 部分选择：把最好的 `limit` 条移到前面。
    pub fn nth_element(&mut self, limit: usize) {
        if limit == 0 || limit >= self.candidates.len() {
            return;
        }
        self.candidates.select_nth_unstable_by(limit - 1, better_first);
    }

    /// `nth_element` 之后截断到 `limit`。
    pub fn prune(&mut self, limit: usize) {
        if limit == 0 || limit >= self.candidates.len() {
            return;
        }
        self.nth_element(limit);
        self.candidates.truncate(limit);
    }

    /// 完整排序后的只读视图（展示用），分数相同按目标短语排序。
    pub fn sorted(&self) -> Vec<&ScoredCandidate> {
        let mut out: Vec<&ScoredCandidate> = self.candidates.iter().collect();
        out.sort_by(|a, b| better_first(a, b).then_with(|| a.target().cmp(b.target())));
        out
    }
}

fn better_first(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.future_score().total_cmp(&a.future_score())
}

impl IntoIterator for CandidateSet {
    type Item = ScoredCandidate;
    type IntoIter = std::vec::IntoIter<ScoredCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.into_iter()
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a ScoredCandidate;
    type IntoIter = std::slice::Iter<'a, ScoredCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

impl FromIterator<ScoredCandidate> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = ScoredCandidate>>(iter: I) -> Self {
        Self {
            candidates: iter.into_iter().collect(),
        }
    }
}
