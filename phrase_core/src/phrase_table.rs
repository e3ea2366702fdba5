use crate::{
    candidate_set::CandidateSet, context::SentenceContext, error::Result, model::Phrase,
    model::ScoreProducer,
};

/// 成员模型抽象：core 不关心短语表来自文件、压缩存储还是后缀数组。
///
/// 约定：
/// - `lookup` 返回的候选都带有本模型槽位（`producer().name()`）下的原始分数
/// - 返回空集合表示“没有译文”，不是错误
/// - `needs_prefix_check()` 为 true 时，调用方必须先 `prefix_exists` 再 `lookup`
pub trait PhraseTable: Send + Sync {
    fn producer(&self) -> &ScoreProducer;

    fn name(&self) -> &str {
        self.producer().name()
    }

    fn num_score_components(&self) -> usize {
        self.producer().num_components()
    }

    /// 是否需要在查询前做一次廉价的前缀检查。
    fn needs_prefix_check(&self) -> bool {
        false
    }

    /// 是否存在以 `phrase` 为前缀的源短语；无法判断时返回 true，交给 `lookup` 报错。
    fn prefix_exists(&self, _ctx: &SentenceContext, _phrase: &Phrase) -> bool {
        true
    }

    fn lookup(&self, ctx: &SentenceContext, phrase: &Phrase) -> Result<CandidateSet>;

    /// 不能被多个解码线程共享的实现返回 false。
    fn thread_safe(&self) -> bool {
        true
    }

    /// 句子开始：准备句子级数据（例如加载本句语法）。
    fn on_sentence_start(&mut self, _ctx: &SentenceContext) -> Result<()> {
        Ok(())
    }

    /// 句子结束：释放句子级缓存；必须幂等。
    fn on_sentence_end(&mut self, _ctx: &SentenceContext) {}
}
