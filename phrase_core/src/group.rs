//! `group`：把多个成员短语表的候选融合成一个候选集合。
//!
//! 融合规则：
//! - 成员按配置顺序依次查询；第一个提出某个目标短语的成员决定它的“主副本”
//! - 合并分数向量按成员顺序拼接，成员 i 占 `[offset_i, offset_i + n_i)`
//! - 没提出该短语的成员，对应区间取默认分数（未配置时为 0）
//! - `restrict` 打开时，只保留第一个成员提出过的短语

use std::collections::{HashMap, HashSet, hash_map::Entry};

use tracing::{debug, warn};

use crate::{
    candidate_set::CandidateSet,
    context::SentenceContext,
    error::{Error, Result},
    filter::{Filter, TableLimit},
    model::{Phrase, ScoreProducer, ScoredCandidate},
    phrase_table::PhraseTable,
};

/// 短语表组配置。
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct GroupConfig {
    /// 组自身的特征名
    pub name: String,
    /// 成员短语表名（顺序有意义）
    pub members: Vec<String>,
    /// 声明的合并分数长度，必须等于成员分数个数之和
    pub num_features: usize,
    /// 只保留第一个成员提出的短语
    #[cfg_attr(feature = "serde", serde(default))]
    pub restrict: bool,
    /// 成员未提出某短语时填入的分数；None 表示全 0
    #[cfg_attr(feature = "serde", serde(default))]
    pub default_scores: Option<Vec<f32>>,
    /// 组特征的权重；None 表示按顺序拼接成员权重
    #[cfg_attr(feature = "serde", serde(default))]
    pub weights: Option<Vec<f32>>,
    /// 每个源短语最多保留的候选数；0 表示不限
    #[cfg_attr(feature = "serde", serde(default))]
    pub table_limit: usize,
}

/// 多模型融合短语表。
pub struct PhraseTableGroup {
    producer: ScoreProducer,
    members: Vec<Box<dyn PhraseTable>>,
    restrict: bool,
    default_scores: Vec<f32>,
    limit: TableLimit,
    active: Option<u64>,
}

impl std::fmt::Debug for PhraseTableGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhraseTableGroup")
            .field("producer", &self.producer)
            .field("members", &self.member_names())
            .field("restrict", &self.restrict)
            .field("active", &self.active)
            .finish()
    }
}

impl PhraseTableGroup {
    /// 按 `config.members` 的顺序从 `available` 中挑出成员，并校验分数长度。
    ///
    /// 所有配置错误都在这里一次性报出，查询期不再检查。
    pub fn new(config: GroupConfig, available: Vec<Box<dyn PhraseTable>>) -> Result<Self> {
        let group = config.name;
        if config.members.is_empty() {
            return Err(Error::EmptyGroup { group });
        }

        let mut seen = HashSet::new();
        for member in &config.members {
            if !seen.insert(member.as_str()) {
                return Err(Error::DuplicateMember {
                    group,
                    member: member.clone(),
                });
            }
        }

        let mut pool: HashMap<String, Box<dyn PhraseTable>> = HashMap::new();
        for table in available {
            let name = table.name().to_owned();
            if pool.insert(name.clone(), table).is_some() {
                return Err(Error::DuplicateMember { group, member: name });
            }
        }

        let mut members = Vec::with_capacity(config.members.len());
        for name in &config.members {
            let Some(table) = pool.remove(name) else {
                return Err(Error::UnknownMember {
                    group,
                    member: name.clone(),
                });
            };
            members.push(table);
        }
        for unused in pool.keys() {
            warn!(event = "unused_table", group = %group, table = %unused, "短语表未被组引用，已忽略");
        }

        let actual: usize = members.iter().map(|m| m.num_score_components()).sum();
        if actual != config.num_features {
            return Err(Error::ScoreCountMismatch {
                group,
                declared: config.num_features,
                actual,
            });
        }

        let default_scores = match config.default_scores {
            Some(scores) if scores.len() != config.num_features => {
                return Err(Error::DefaultScoresLength {
                    group,
                    expected: config.num_features,
                    actual: scores.len(),
                });
            }
            Some(scores) => scores,
            None => vec![0.0; config.num_features],
        };

        let weights = config.weights.unwrap_or_else(|| {
            members
                .iter()
                .flat_map(|m| m.producer().weights().iter().copied())
                .collect()
        });
        let producer = ScoreProducer::new(group, config.num_features, Some(weights))?;

        Ok(Self {
            producer,
            members,
            restrict: config.restrict,
            default_scores,
            limit: TableLimit {
                limit: config.table_limit,
            },
            active: None,
        })
    }

    pub fn producer(&self) -> &ScoreProducer {
        &self.producer
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name()).collect()
    }

    /// 当前活动句子编号。
    pub fn active_sentence(&self) -> Option<u64> {
        self.active
    }

    /// 有成员不是线程安全的时候，拒绝多线程解码。
    pub fn check_threads(&self, threads: usize) -> Result<()> {
        if threads <= 1 {
            return Ok(());
        }
        match self.members.iter().find(|m| !m.thread_safe()) {
            Some(table) => Err(Error::NotThreadSafe {
                table: table.name().to_owned(),
                threads,
            }),
            None => Ok(()),
        }
    }

    /// 句子开始：依次通知成员；任一成员失败时回收全部成员的句子级数据。
    pub fn on_sentence_start(&mut self, ctx: &SentenceContext) -> Result<()> {
        if let Some(active) = self.active {
            return Err(Error::SentenceInFlight {
                active,
                requested: ctx.translation_id(),
            });
        }
        let started = self
            .members
            .iter_mut()
            .try_for_each(|member| member.on_sentence_start(ctx));
        if let Err(e) = started {
            for member in &mut self.members {
                member.on_sentence_end(ctx);
            }
            return Err(e);
        }
        self.active = Some(ctx.translation_id());
        Ok(())
    }

    /// 句子结束：通知所有成员释放各自的句子级缓存。
    pub fn on_sentence_end(&mut self, ctx: &SentenceContext) {
        for member in &mut self.members {
            member.on_sentence_end(ctx);
        }
        self.active = None;
    }

    /// 批量查询：先对所有短语做前缀检查，再逐个融合。
    pub fn aggregate_batch(&self, ctx: &SentenceContext, phrases: &[Phrase]) -> Result<Vec<CandidateSet>> {
        self.ensure_active(ctx)?;
        let mut present: Vec<Vec<bool>> = Vec::with_capacity(phrases.len());
        for phrase in phrases {
            present.push(self.members.iter().map(|m| self.worth_lookup(m.as_ref(), ctx, phrase)).collect());
        }
        phrases
            .iter()
            .zip(&present)
            .map(|(phrase, present)| self.combine(ctx, phrase, present))
            .collect()
    }

    /// 查询单个源短语并融合所有成员的候选。
    pub fn aggregate(&self, ctx: &SentenceContext, phrase: &Phrase) -> Result<CandidateSet> {
        self.ensure_active(ctx)?;
        let present: Vec<bool> = self.members.iter().map(|m| self.worth_lookup(m.as_ref(), ctx, phrase)).collect();
        self.combine(ctx, phrase, &present)
    }

    fn worth_lookup(&self, member: &dyn PhraseTable, ctx: &SentenceContext, phrase: &Phrase) -> bool {
        !member.needs_prefix_check() || member.prefix_exists(ctx, phrase)
    }

    fn ensure_active(&self, ctx: &SentenceContext) -> Result<()> {
        match self.active {
            Some(active) if active == ctx.translation_id() => Ok(()),
            Some(active) => Err(Error::SentenceMismatch {
                table: self.producer.name().to_owned(),
                active,
                requested: ctx.translation_id(),
            }),
            None => Err(Error::NoActiveSentence {
                table: self.producer.name().to_owned(),
            }),
        }
    }

    fn combine(&self, ctx: &SentenceContext, phrase: &Phrase, present: &[bool]) -> Result<CandidateSet> {
        // 主副本 + 合并分数；按首次出现顺序排列
        let mut merged: Vec<(ScoredCandidate, Vec<f32>)> = Vec::new();
        let mut index: HashMap<Phrase, usize> = HashMap::new();

        let mut offset = 0;
        for (i, member) in self.members.iter().enumerate() {
            let producer = member.producer();
            let n = producer.num_components();
            if !present[i] {
                offset += n;
                continue;
            }

            let found = member.lookup(ctx, phrase)?;
            for candidate in &found {
                let slot = match index.entry(candidate.target().clone()) {
                    Entry::Vacant(entry) => {
                        if self.restrict && i > 0 {
                            continue;
                        }
                        merged.push((neutral_template(candidate, producer), self.default_scores.clone()));
                        *entry.insert(merged.len() - 1)
                    }
                    Entry::Occupied(entry) => {
                        let master = &mut merged[*entry.get()].0;
                        for (key, values) in candidate.extra_scores() {
                            master.set_extra_score(key.clone(), values.clone());
                        }
                        *entry.get()
                    }
                };

                let raw = candidate.scores().get(producer.name()).unwrap_or(&[]);
                let combined = &mut merged[slot].1;
                for j in 0..n {
                    combined[offset + j] = raw.get(j).copied().unwrap_or(0.0);
                }
            }
            offset += n;
        }

        let mut out = CandidateSet::with_capacity(merged.len());
        for (mut candidate, scores) in merged {
            candidate.assign_scores(&self.producer, scores);
            candidate.evaluate_in_isolation(&self.producer);
            out.push(candidate);
        }
        debug!(
            event = "aggregate",
            group = %self.producer.name(),
            translation_id = ctx.translation_id(),
            phrase = %phrase,
            candidates = out.len(),
        );
        Ok(self.limit.apply(out))
    }
}

/// 从成员候选得到不含该成员稠密分数的独立副本（附加分数保留）。
pub fn neutral_template(candidate: &ScoredCandidate, producer: &ScoreProducer) -> ScoredCandidate {
    let mut template = candidate.clone();
    template.strip(producer);
    template
}
