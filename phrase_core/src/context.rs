//! `SentenceContext`：一句话的作用域标识，沿调用链显式传递。
//!
//! 约定：
//! - `translation_id` 由解码器分配，同一进程内每句唯一
//! - 需要句子级数据的成员模型（例如动态语法）只能从这里拿到句子信息
use crate::model::Phrase;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceContext {
    translation_id: u64,
    source: Phrase,
}

impl SentenceContext {
    pub fn new(translation_id: u64, source: Phrase) -> Self {
        Self {
            translation_id,
            source,
        }
    }

    pub fn translation_id(&self) -> u64 {
        self.translation_id
    }

    /// 整句源文。
    pub fn source(&self) -> &Phrase {
        &self.source
    }
}
