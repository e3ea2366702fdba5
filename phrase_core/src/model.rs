use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// 短语：按空白切分后的词序列。
///
/// 同时作为候选的“内容身份”：融合时按 `Phrase` 判等/哈希，不看分数。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Phrase(Vec<String>);

impl Phrase {
    pub fn new(words: Vec<String>) -> Self {
        Self(words)
    }

    /// 按空白切分文本。
    pub fn parse(text: &str) -> Self {
        Self(text.split_whitespace().map(str::to_owned).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 取子短语 `[start, end)`；越界时返回 None。
    pub fn span(&self, start: usize, end: usize) -> Option<Phrase> {
        if start >= end || end > self.0.len() {
            return None;
        }
        Some(Self(self.0[start..end].to_vec()))
    }

    pub fn starts_with(&self, prefix: &Phrase) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl From<&str> for Phrase {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl fmt::Display for Phrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

/// 打分特征：名字 + 稠密权重。分量个数由权重长度决定。
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreProducer {
    name: String,
    weights: Vec<f32>,
}

impl ScoreProducer {
    /// `weights` 为 None 时每个分量权重取 1.0。
    pub fn new(name: impl Into<String>, num_components: usize, weights: Option<Vec<f32>>) -> Result<Self> {
        let name = name.into();
        let weights = weights.unwrap_or_else(|| vec![1.0; num_components]);
        if weights.len() != num_components {
            return Err(Error::WeightsLength {
                producer: name,
                expected: num_components,
                actual: weights.len(),
            });
        }
        Ok(Self { name, weights })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_components(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// 线性加权；缺失的分量按 0 计。
    pub fn weighted_score(&self, scores: &[f32]) -> f32 {
        self.weights.iter().zip(scores).map(|(w, s)| w * s).sum()
    }
}

/// 稠密分数：每个特征占一个固定长度的槽位，按特征名索引。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown {
    slots: BTreeMap<String, Vec<f32>>,
}

impl ScoreBreakdown {
    pub fn get(&self, producer: &str) -> Option<&[f32]> {
        self.slots.get(producer).map(Vec::as_slice)
    }

    pub fn assign(&mut self, producer: &str, scores: Vec<f32>) {
        self.slots.insert(producer.to_owned(), scores);
    }

    pub fn remove(&mut self, producer: &str) -> Option<Vec<f32>> {
        self.slots.remove(producer)
    }

    pub fn producers(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}

/// 一条候选译文：目标短语 + 稠密分数 + 具名附加分数。
///
/// 注意：
/// - `target` 一经创建不可变；融合时复制出的候选与原候选互不影响
/// - `future_score` 是已评估特征的加权和，`CandidateSet` 的 top-K 以它排序（越大越好）
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    target: Phrase,
    /// 层次短语规则的左部标签（例如 `[X]`）；普通短语表为 None
    pub lhs: Option<String>,
    scores: ScoreBreakdown,
    extra_scores: BTreeMap<String, Vec<f32>>,
    /// 每个已评估特征对 `future_score` 的贡献
    estimates: BTreeMap<String, f32>,
    future_score: f32,
}

impl ScoredCandidate {
    /// 用某个特征的原始分数创建候选，并立即评估该特征。
    pub fn new(target: Phrase, producer: &ScoreProducer, scores: Vec<f32>) -> Self {
        let mut candidate = Self {
            target,
            lhs: None,
            scores: ScoreBreakdown::default(),
            extra_scores: BTreeMap::new(),
            estimates: BTreeMap::new(),
            future_score: 0.0,
        };
        candidate.scores.assign(producer.name(), scores);
        candidate.evaluate_in_isolation(producer);
        candidate
    }

    pub fn target(&self) -> &Phrase {
        &self.target
    }

    pub fn scores(&self) -> &ScoreBreakdown {
        &self.scores
    }

    pub fn future_score(&self) -> f32 {
        self.future_score
    }

    pub fn extra_scores(&self) -> &BTreeMap<String, Vec<f32>> {
        &self.extra_scores
    }

    /// 同名 key 直接覆盖。
    pub fn set_extra_score(&mut self, key: impl Into<String>, values: Vec<f32>) {
        self.extra_scores.insert(key.into(), values);
    }

    /// 覆盖某个特征的稠密槽位（不重新评估）。
    pub fn assign_scores(&mut self, producer: &ScoreProducer, scores: Vec<f32>) {
        self.scores.assign(producer.name(), scores);
    }

    /// 按当前槽位重新计算该特征对 `future_score` 的贡献；重复调用不会累加。
    pub fn evaluate_in_isolation(&mut self, producer: &ScoreProducer) {
        let contribution = self
            .scores
            .get(producer.name())
            .map(|s| producer.weighted_score(s))
            .unwrap_or(0.0);
        self.estimates.insert(producer.name().to_owned(), contribution);
        self.recompute_future_score();
    }

    /// 去掉某个特征的稠密分数及其对 `future_score` 的贡献。
    pub fn strip(&mut self, producer: &ScoreProducer) {
        self.scores.remove(producer.name());
        self.estimates.remove(producer.name());
        self.recompute_future_score();
    }

    fn recompute_future_score(&mut self) {
        self.future_score = self.estimates.values().sum();
    }
}
