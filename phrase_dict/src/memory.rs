use std::path::Path;

use phrase_core::{
    Result, candidate_set::CandidateSet, context::SentenceContext, model::Phrase, model::ScoreProducer,
    phrase_table::PhraseTable,
};
use tracing::info;

use crate::{error::LoadError, loader::load_rule_table, rule_table::RuleTable};

/// 静态短语表：启动时整表读入内存，所有句子共享，只读。
#[derive(Debug)]
pub struct MemoryPhraseTable {
    producer: ScoreProducer,
    table: RuleTable,
}

impl MemoryPhraseTable {
    pub fn from_path(producer: ScoreProducer, path: impl AsRef<Path>, table_limit: usize) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let table = load_rule_table(path, &producer, table_limit)?;
        info!(
            event = "phrase_table_loaded",
            table = %producer.name(),
            path = %path.display(),
            sources = table.len(),
        );
        Ok(Self { producer, table })
    }
}

impl PhraseTable for MemoryPhraseTable {
    fn producer(&self) -> &ScoreProducer {
        &self.producer
    }

    fn prefix_exists(&self, _ctx: &SentenceContext, phrase: &Phrase) -> bool {
        self.table.prefix_exists(phrase)
    }

    fn lookup(&self, _ctx: &SentenceContext, phrase: &Phrase) -> Result<CandidateSet> {
        Ok(self.table.get(phrase).cloned().unwrap_or_default())
    }
}
