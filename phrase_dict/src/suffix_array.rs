//! `suffix_array`：按句加载的动态语法。
//!
//! 语法由外部的后缀数组抽取工具按句生成，每句一个文件：`<dir>/grammar.<id>.gz`。
//! 本模块只负责在句子开始时读入对应文件、句末丢弃，不涉及后缀数组本身。
//!
//! 约定：
//! - 规则表在句子之间原地复用，因此实例不能被多个解码线程共享（`thread_safe() == false`）
//! - 同一时刻只保存一句的规则；加载新句之前先清空

use std::path::PathBuf;

use phrase_core::{
    Error, Result, candidate_set::CandidateSet, context::SentenceContext, model::Phrase, model::ScoreProducer,
    phrase_table::PhraseTable,
};
use tracing::{info, warn};

use crate::{error::LoadError, loader::load_rule_table, rule_table::RuleTable};

#[derive(Debug)]
pub struct SuffixArrayGrammar {
    producer: ScoreProducer,
    dir: PathBuf,
    table_limit: usize,
    table: RuleTable,
    /// 当前规则表属于哪一句
    loaded_for: Option<u64>,
}

impl SuffixArrayGrammar {
    pub fn new(producer: ScoreProducer, dir: impl Into<PathBuf>, table_limit: usize) -> Self {
        Self {
            producer,
            dir: dir.into(),
            table_limit,
            table: RuleTable::new(),
            loaded_for: None,
        }
    }

    /// 句子编号 -> 语法文件路径。
    pub fn grammar_path(&self, translation_id: u64) -> PathBuf {
        self.dir.join(format!("grammar.{translation_id}.gz"))
    }

    pub fn loaded_for(&self) -> Option<u64> {
        self.loaded_for
    }

    /// 加载某一句的语法；失败时规则表保持为空。
    pub fn load_for_sentence(&mut self, translation_id: u64) -> Result<&RuleTable, LoadError> {
        self.table.clear();
        self.loaded_for = None;

        let path = self.grammar_path(translation_id);
        self.table = load_rule_table(&path, &self.producer, self.table_limit)?;
        self.loaded_for = Some(translation_id);
        info!(
            event = "grammar_loaded",
            table = %self.producer.name(),
            translation_id,
            sources = self.table.len(),
            rules = self.table.rule_count(),
        );
        Ok(&self.table)
    }

    /// 丢弃规则表；没有加载过也可以调用。
    pub fn unload_after_sentence(&mut self, translation_id: u64) {
        if let Some(loaded) = self.loaded_for.take() {
            if loaded != translation_id {
                warn!(event = "grammar_unload_mismatch", loaded, translation_id);
            }
        }
        self.table.clear();
    }

    fn loaded_table(&self, ctx: &SentenceContext) -> Result<&RuleTable> {
        match self.loaded_for {
            Some(id) if id == ctx.translation_id() => Ok(&self.table),
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
}

impl PhraseTable for SuffixArrayGrammar {
    fn producer(&self) -> &ScoreProducer {
        &self.producer
    }

    fn needs_prefix_check(&self) -> bool {
        true
    }

    /// 规则表不属于当前句时返回 true，让随后的 `lookup` 报出句子错误。
    fn prefix_exists(&self, ctx: &SentenceContext, phrase: &Phrase) -> bool {
        match self.loaded_table(ctx) {
            Ok(table) => table.prefix_exists(phrase),
            Err(e) => {
                warn!(event = "prefix_check_failed", table = %self.producer.name(), phrase = %phrase, error = %e);
                true
            }
        }
    }

    fn lookup(&self, ctx: &SentenceContext, phrase: &Phrase) -> Result<CandidateSet> {
        let table = self.loaded_table(ctx)?;
        Ok(table.get(phrase).cloned().unwrap_or_default())
    }

    fn thread_safe(&self) -> bool {
        false
    }

    fn on_sentence_start(&mut self, ctx: &SentenceContext) -> Result<()> {
        let translation_id = ctx.translation_id();
        let loaded = self.load_for_sentence(translation_id).map(|_| ());
        loaded.map_err(|e| Error::Resource {
            table: self.producer.name().to_owned(),
            translation_id,
            source: Box::new(e),
        })
    }

    fn on_sentence_end(&mut self, ctx: &SentenceContext) {
        self.unload_after_sentence(ctx.translation_id());
    }
}
