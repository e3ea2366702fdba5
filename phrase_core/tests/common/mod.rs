#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use phrase_core::{
    Result,
    candidate_set::CandidateSet,
    context::SentenceContext,
    model::{Phrase, ScoreProducer, ScoredCandidate},
    phrase_table::PhraseTable,
};

/// 测试用短语表：固定的 源短语 -> [(目标短语, 分数)]，并记录生命周期调用。
pub struct FixedTable {
    producer: ScoreProducer,
    entries: HashMap<Phrase, Vec<(Phrase, Vec<f32>, Vec<(String, Vec<f32>)>)>>,
    pub prefix_checked: bool,
    pub thread_safe: bool,
    pub fail_start: bool,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl FixedTable {
    pub fn new(name: &str, num_components: usize) -> Self {
        Self {
            producer: ScoreProducer::new(name, num_components, None).unwrap(),
            entries: HashMap::new(),
            prefix_checked: false,
            thread_safe: true,
            fail_start: false,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with(mut self, source: &str, target: &str, scores: &[f32]) -> Self {
        self.entries
            .entry(Phrase::parse(source))
            .or_default()
            .push((Phrase::parse(target), scores.to_vec(), Vec::new()));
        self
    }

    pub fn with_extra(mut self, source: &str, target: &str, scores: &[f32], key: &str, extra: &[f32]) -> Self {
        self.entries
            .entry(Phrase::parse(source))
            .or_default()
            .push((Phrase::parse(target), scores.to_vec(), vec![(key.to_owned(), extra.to_vec())]));
        self
    }

    pub fn boxed(self) -> Box<dyn PhraseTable> {
        Box::new(self)
    }

    fn record(&self, what: String) {
        self.log.lock().unwrap().push(what);
    }
}

impl PhraseTable for FixedTable {
    fn producer(&self) -> &ScoreProducer {
        &self.producer
    }

    fn needs_prefix_check(&self) -> bool {
        self.prefix_checked
    }

    fn prefix_exists(&self, _ctx: &SentenceContext, phrase: &Phrase) -> bool {
        self.record(format!("prefix {phrase}"));
        self.entries.keys().any(|k| k.starts_with(phrase))
    }

    fn lookup(&self, _ctx: &SentenceContext, phrase: &Phrase) -> Result<CandidateSet> {
        self.record(format!("lookup {phrase}"));
        let Some(rows) = self.entries.get(phrase) else {
            return Ok(CandidateSet::new());
        };
        Ok(rows
            .iter()
            .map(|(target, scores, extra)| {
                let mut c = ScoredCandidate::new(target.clone(), &self.producer, scores.clone());
                for (k, v) in extra {
                    c.set_extra_score(k.clone(), v.clone());
                }
                c
            })
            .collect())
    }

    fn thread_safe(&self) -> bool {
        self.thread_safe
    }

    fn on_sentence_start(&mut self, ctx: &SentenceContext) -> Result<()> {
        self.record(format!("start {}", ctx.translation_id()));
        if self.fail_start {
            return Err(phrase_core::Error::Resource {
                table: self.producer.name().to_owned(),
                translation_id: ctx.translation_id(),
                source: "missing grammar".into(),
            });
        }
        Ok(())
    }

    fn on_sentence_end(&mut self, ctx: &SentenceContext) {
        self.record(format!("end {}", ctx.translation_id()));
    }
}

pub fn ctx(id: u64) -> SentenceContext {
    SentenceContext::new(id, Phrase::parse("das haus ist klein"))
}

/// 目标短语 -> 组特征的合并分数。
pub fn combined(set: &CandidateSet, group: &str) -> HashMap<String, Vec<f32>> {
    set.iter()
        .map(|c| (c.target().to_string(), c.scores().get(group).unwrap().to_vec()))
        .collect()
}
