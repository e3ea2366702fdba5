//! `SentenceCache`：持有一句话内产生的所有候选集合，句末一次性释放。

use std::sync::Arc;

use tracing::{error, warn};

use crate::{
    candidate_set::CandidateSet,
    context::SentenceContext,
    error::{Error, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Open(u64),
    Released(u64),
}

/// 句子级候选缓存。
///
/// 状态：`Idle` -> `begin` -> `Open(id)` -> `release_all` -> `Released(id)` -> `begin` -> ...
#[derive(Debug)]
pub struct SentenceCache {
    state: State,
    sets: Vec<Arc<CandidateSet>>,
}

impl Default for SentenceCache {
    fn default() -> Self {
        Self {
            state: State::Idle,
            sets: Vec::new(),
        }
    }
}

impl SentenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为新句子打开一个空的登记表。
    pub fn begin(&mut self, ctx: &SentenceContext) -> Result<()> {
        if let State::Open(active) = self.state {
            return Err(Error::SentenceInFlight {
                active,
                requested: ctx.translation_id(),
            });
        }
        self.sets.clear();
        self.state = State::Open(ctx.translation_id());
        Ok(())
    }

    /// 登记一个候选集合，返回共享句柄。
    pub fn register(&mut self, ctx: &SentenceContext, set: CandidateSet) -> Result<Arc<CandidateSet>> {
        let requested = ctx.translation_id();
        match self.state {
            State::Open(active) if active == requested => {
                let set = Arc::new(set);
                self.sets.push(Arc::clone(&set));
                Ok(set)
            }
            State::Open(active) => Err(Error::SentenceMismatch {
                table: "sentence-cache".to_owned(),
                active,
                requested,
            }),
            State::Released(released) if released == requested => {
                error!(event = "register_after_release", translation_id = requested);
                Err(Error::CacheReleased {
                    translation_id: requested,
                })
            }
            State::Released(_) | State::Idle => Err(Error::NoActiveSentence {
                table: "sentence-cache".to_owned(),
            }),
        }
    }

    /// 释放本句登记的全部句柄，返回释放数量；同一句重复调用返回 0。
    pub fn release_all(&mut self) -> usize {
        match self.state {
            State::Open(id) => {
                let released = self.sets.len();
                self.sets.clear();
                self.sets.shrink_to_fit();
                self.state = State::Released(id);
                released
            }
            State::Released(id) => {
                warn!(event = "double_release", translation_id = id);
                0
            }
            State::Idle => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// 当前打开的句子。
    pub fn open_sentence(&self) -> Option<u64> {
        match self.state {
            State::Open(id) => Some(id),
            _ => None,
        }
    }
}
