//! Token lookahead buffer.
//!
//! A FIFO of scanner tokens with room for [`INLINE_CAPACITY`] tokens inline
//! and a growable spill area behind it. Positions passed to
//! [`TokenQueue::insert_at`] are logical: they count every token since the
//! start of the stream, so a position recorded when a token was enqueued
//! stays valid while earlier tokens are consumed.

use crate::token::Token;
use std::collections::VecDeque;

#[cfg(test)]
#[path = "./queue_tests.rs"]
mod tests;

pub(crate) const INLINE_CAPACITY: usize = 8;

pub(crate) struct TokenQueue {
    inline: [Token; INLINE_CAPACITY],
    head: usize,
    inline_len: usize,
    // Only non-empty while `inline` is full.
    spill: VecDeque<Token>,
    consumed: usize,
}

impl TokenQueue {
    pub(crate) fn new(consumed: usize) -> Self {
        TokenQueue {
            inline: [Token::default(); INLINE_CAPACITY],
            head: 0,
            inline_len: 0,
            spill: VecDeque::new(),
            consumed,
        }
    }

    #[inline]
    fn slot(&self, index: usize) -> usize {
        (self.head + index) % INLINE_CAPACITY
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.inline_len + self.spill.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.inline_len == 0
    }

    /// Number of tokens consumed since the start of the stream.
    #[inline]
    pub(crate) fn consumed(&self) -> usize {
        self.consumed
    }

    /// Logical position the next enqueued token will occupy.
    #[inline]
    pub(crate) fn next_position(&self) -> usize {
        self.consumed + self.len()
    }

    pub(crate) fn enqueue(&mut self, token: Token) {
        if self.inline_len < INLINE_CAPACITY {
            let slot = self.slot(self.inline_len);
            self.inline[slot] = token;
            self.inline_len += 1;
        } else {
            self.spill.push_back(token);
        }
    }

    pub(crate) fn consume(&mut self) -> Token {
        assert!(self.inline_len > 0, "token queue underflow");
        let token = self.inline[self.head];
        self.head = (self.head + 1) % INLINE_CAPACITY;
        self.inline_len -= 1;
        self.consumed += 1;
        if let Some(next) = self.spill.pop_front() {
            let slot = self.slot(self.inline_len);
            self.inline[slot] = next;
            self.inline_len += 1;
        }
        token
    }

    pub(crate) fn peek(&self, offset: usize) -> Option<&Token> {
        if offset < self.inline_len {
            Some(&self.inline[self.slot(offset)])
        } else {
            self.spill.get(offset - self.inline_len)
        }
    }

    /// Inserts `token` so that it becomes the token with logical number
    /// `position`, shifting everything at or after that position back.
    pub(crate) fn insert_at(&mut self, position: usize, token: Token) {
        assert!(
            position >= self.consumed && position <= self.next_position(),
            "token insertion position {position} outside the buffered window"
        );
        let index = position - self.consumed;
        if index == self.len() {
            self.enqueue(token);
            return;
        }
        if index >= self.inline_len {
            self.spill.insert(index - self.inline_len, token);
            return;
        }
        if self.inline_len == INLINE_CAPACITY {
            let displaced = self.inline[self.slot(INLINE_CAPACITY - 1)];
            self.spill.push_front(displaced);
            self.inline_len -= 1;
        }
        let mut i = self.inline_len;
        while i > index {
            let (to, from) = (self.slot(i), self.slot(i - 1));
            self.inline[to] = self.inline[from];
            i -= 1;
        }
        let slot = self.slot(index);
        self.inline[slot] = token;
        self.inline_len += 1;
    }

    pub(crate) fn clear(&mut self) {
        self.head = 0;
        self.inline_len = 0;
        self.spill.clear();
    }
}
