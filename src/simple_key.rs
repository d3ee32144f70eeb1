//! Pending implicit-key bookkeeping, one slot per open flow level.

use crate::Mark;

#[cfg(test)]
#[path = "./simple_key_tests.rs"]
mod tests;

/// Longest distance, in bytes, an implicit key may span before its `:`.
pub(crate) const MAX_SIMPLE_KEY_LENGTH: usize = 1024;

const INLINE_LEVELS: usize = 8;

/// A place where an implicit mapping key may have started.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SimpleKey {
    pub possible: bool,
    /// A `:` must follow, because the candidate sits at the block indentation.
    pub required: bool,
    /// Logical token position the KEY token is inserted at when confirmed.
    pub token_number: usize,
    pub flow_level: usize,
    pub mark: Mark,
}

impl SimpleKey {
    pub(crate) fn is_stale(&self, here: Mark) -> bool {
        (self.flow_level == 0 && self.mark.line < here.line)
            || here.offset > self.mark.offset + MAX_SIMPLE_KEY_LENGTH
    }
}

pub(crate) struct SimpleKeyStack {
    inline: [SimpleKey; INLINE_LEVELS],
    len: usize,
    spill: Vec<SimpleKey>,
}

impl SimpleKeyStack {
    pub(crate) fn new() -> Self {
        SimpleKeyStack {
            inline: [SimpleKey::default(); INLINE_LEVELS],
            len: 0,
            spill: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn push(&mut self, key: SimpleKey) {
        if self.len < INLINE_LEVELS {
            self.inline[self.len] = key;
        } else {
            self.spill.push(key);
        }
        self.len += 1;
    }

    pub(crate) fn pop(&mut self) -> SimpleKey {
        assert!(self.len > 0, "simple key stack underflow");
        self.len -= 1;
        if self.len < INLINE_LEVELS {
            self.inline[self.len]
        } else {
            match self.spill.pop() {
                Some(key) => key,
                None => unreachable!("spill holds every level past the inline ones"),
            }
        }
    }

    pub(crate) fn top_mut(&mut self) -> &mut SimpleKey {
        assert!(self.len > 0, "simple key stack underflow");
        if self.len <= INLINE_LEVELS {
            &mut self.inline[self.len - 1]
        } else {
            let last = self.spill.len() - 1;
            &mut self.spill[last]
        }
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut SimpleKey> {
        let inline_len = self.len.min(INLINE_LEVELS);
        self.inline[..inline_len].iter_mut().chain(self.spill.iter_mut())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &SimpleKey> {
        let inline_len = self.len.min(INLINE_LEVELS);
        self.inline[..inline_len].iter().chain(self.spill.iter())
    }
}
