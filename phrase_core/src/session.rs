//! `session`：面向解码器的入口（句子开始 / 查询 / 句子结束）。
//!
//! `Backend` 自身不做融合，而是：
//! - 持有 `PhraseTableGroup`（成员模型与融合逻辑）
//! - 持有 `SentenceCache`（本句产生的候选集合）
//! - 通过 `Sentence` 守卫把“同一时刻只有一句在处理”变成借用规则：
//!   `begin_sentence` 需要 `&mut Backend`，守卫存活期间无法开始下一句

use std::sync::Arc;

use tracing::info;

use crate::{
    cache::SentenceCache,
    candidate_set::CandidateSet,
    context::SentenceContext,
    error::Result,
    group::PhraseTableGroup,
    model::Phrase,
};

/// 短语表后端（解码器持有一个实例）。
#[derive(Debug)]
pub struct Backend {
    group: PhraseTableGroup,
    cache: SentenceCache,
}

impl Backend {
    /// 创建后端；`threads` 为解码线程数，成员中有非线程安全实现时多线程直接拒绝。
    pub fn new(group: PhraseTableGroup, threads: usize) -> Result<Self> {
        group.check_threads(threads)?;
        Ok(Self {
            group,
            cache: SentenceCache::new(),
        })
    }

    pub fn group(&self) -> &PhraseTableGroup {
        &self.group
    }

    /// 句子开始：成员准备句子级数据（动态语法在这里加载），并打开候选缓存。
    pub fn begin_sentence(&mut self, ctx: SentenceContext) -> Result<Sentence<'_>> {
        self.group.on_sentence_start(&ctx)?;
        if let Err(e) = self.cache.begin(&ctx) {
            self.group.on_sentence_end(&ctx);
            return Err(e);
        }
        info!(
            event = "sentence_start",
            translation_id = ctx.translation_id(),
            words = ctx.source().len(),
        );
        Ok(Sentence {
            backend: self,
            ctx,
            finished: false,
        })
    }
}

/// 一句话的处理过程。结束时（`finish` 或 drop）释放全部句子级资源。
#[derive(Debug)]
pub struct Sentence<'a> {
    backend: &'a mut Backend,
    ctx: SentenceContext,
    finished: bool,
}

impl Sentence<'_> {
    pub fn context(&self) -> &SentenceContext {
        &self.ctx
    }

    /// 查询一个源短语的融合候选；结果登记到本句缓存。
    pub fn lookup(&mut self, phrase: &Phrase) -> Result<Arc<CandidateSet>> {
        let set = self.backend.group.aggregate(&self.ctx, phrase)?;
        self.backend.cache.register(&self.ctx, set)
    }

    /// 批量查询（先统一做前缀检查，再逐个融合）。
    pub fn lookup_batch(&mut self, phrases: &[Phrase]) -> Result<Vec<Arc<CandidateSet>>> {
        let sets = self.backend.group.aggregate_batch(&self.ctx, phrases)?;
        sets.into_iter()
            .map(|set| self.backend.cache.register(&self.ctx, set))
            .collect()
    }

    /// 本句已登记的候选集合数量。
    pub fn cached(&self) -> usize {
        self.backend.cache.len()
    }

    /// 句子结束：释放缓存并通知所有成员；返回释放的候选集合数量。
    pub fn finish(mut self) -> usize {
        self.release()
    }

    fn release(&mut self) -> usize {
        if self.finished {
            return 0;
        }
        self.finished = true;
        let released = self.backend.cache.release_all();
        self.backend.group.on_sentence_end(&self.ctx);
        info!(
            event = "sentence_end",
            translation_id = self.ctx.translation_id(),
            released,
        );
        released
    }
}

impl Drop for Sentence<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
