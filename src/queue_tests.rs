use super::*;
use crate::Mark;
use crate::token::TokenKind;

fn tok(n: usize) -> Token {
    Token::new(TokenKind::Scalar, Mark::new(n, 0, n))
}

fn drain(queue: &mut TokenQueue) -> Vec<usize> {
    let mut out = Vec::new();
    while !queue.is_empty() {
        out.push(queue.consume().start.offset);
    }
    out
}

#[test]
fn fifo_within_inline_capacity() {
    let mut q = TokenQueue::new(0);
    assert!(q.is_empty());
    for n in 0..5 {
        q.enqueue(tok(n));
    }
    assert_eq!(q.len(), 5);
    assert_eq!(q.peek(0).unwrap().start.offset, 0);
    assert_eq!(q.peek(4).unwrap().start.offset, 4);
    assert!(q.peek(5).is_none());
    assert_eq!(drain(&mut q), vec![0, 1, 2, 3, 4]);
    assert_eq!(q.consumed(), 5);
}

#[test]
fn spills_past_inline_capacity_and_refills() {
    let mut q = TokenQueue::new(0);
    for n in 0..20 {
        q.enqueue(tok(n));
    }
    assert_eq!(q.len(), 20);
    assert_eq!(q.peek(15).unwrap().start.offset, 15);
    assert_eq!(q.consume().start.offset, 0);
    q.enqueue(tok(20));
    assert_eq!(drain(&mut q), (1..=20).collect::<Vec<_>>());
}

#[test]
fn ring_wraps_around() {
    let mut q = TokenQueue::new(0);
    for round in 0..5 {
        for n in 0..6 {
            q.enqueue(tok(round * 10 + n));
        }
        let got = drain(&mut q);
        assert_eq!(got, (0..6).map(|n| round * 10 + n).collect::<Vec<_>>());
    }
    assert_eq!(q.consumed(), 30);
}

#[test]
fn insert_at_logical_position() {
    let mut q = TokenQueue::new(0);
    for n in 0..4 {
        q.enqueue(tok(n));
    }
    // Position 2 recorded before anything was consumed.
    q.consume();
    q.insert_at(2, tok(100));
    assert_eq!(drain(&mut q), vec![1, 100, 2, 3]);
}

#[test]
fn insert_at_end_is_enqueue() {
    let mut q = TokenQueue::new(7);
    q.enqueue(tok(1));
    assert_eq!(q.next_position(), 8);
    q.insert_at(8, tok(2));
    assert_eq!(drain(&mut q), vec![1, 2]);
}

#[test]
fn insert_into_full_inline_displaces_into_spill() {
    let mut q = TokenQueue::new(0);
    for n in 0..INLINE_CAPACITY {
        q.enqueue(tok(n));
    }
    q.insert_at(0, tok(100));
    assert_eq!(q.len(), INLINE_CAPACITY + 1);
    let mut expected = vec![100];
    expected.extend(0..INLINE_CAPACITY);
    assert_eq!(drain(&mut q), expected);
}

#[test]
fn insert_into_spill_region() {
    let mut q = TokenQueue::new(0);
    for n in 0..12 {
        q.enqueue(tok(n));
    }
    q.insert_at(10, tok(100));
    let mut expected: Vec<usize> = (0..10).collect();
    expected.push(100);
    expected.extend([10, 11]);
    assert_eq!(drain(&mut q), expected);
}

#[test]
fn clear_keeps_consumed_count() {
    let mut q = TokenQueue::new(0);
    q.enqueue(tok(0));
    q.enqueue(tok(1));
    q.consume();
    q.clear();
    assert!(q.is_empty());
    assert_eq!(q.len(), 0);
    assert_eq!(q.consumed(), 1);
}

#[test]
#[should_panic(expected = "token queue underflow")]
fn consume_empty_panics() {
    let mut q = TokenQueue::new(0);
    q.consume();
}
