use std::collections::BTreeMap;

use phrase_core::{
    candidate_set::CandidateSet,
    filter::{Filter, TableLimit},
    model::{Phrase, ScoredCandidate},
};

/// 内存规则表：源短语 -> 候选集合。
///
/// 用 `BTreeMap` 存储，源短语按词序有序，前缀查询可以直接做区间扫描。
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: BTreeMap<Phrase, CandidateSet>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: Phrase, candidate: ScoredCandidate) {
        self.rules.entry(source).or_default().push(candidate);
    }

    pub fn get(&self, source: &Phrase) -> Option<&CandidateSet> {
        self.rules.get(source)
    }

    /// 是否存在以 `prefix` 开头的源短语（含完全相等）。
    pub fn prefix_exists(&self, prefix: &Phrase) -> bool {
        self.rules
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(source, _)| source.starts_with(prefix))
    }

    /// 每个源短语只保留最好的 `limit` 条。
    pub fn prune(&mut self, limit: usize) {
        if limit == 0 {
            return;
        }
        let filter = TableLimit { limit };
        for set in self.rules.values_mut() {
            *set = filter.apply(std::mem::take(set));
        }
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    /// 源短语个数。
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 规则总数。
    pub fn rule_count(&self) -> usize {
        self.rules.values().map(CandidateSet::len).sum()
    }
}
