use crate::matrix::Cost;
use crate::state::StateId;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

/// Which state a frontier hands out next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontierOrder {
    /// Oldest first.
    Fifo,
    /// Newest first.
    Lifo,
    /// Lowest priority key first, oldest first among equal keys.
    Priority,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    key: Cost,
    seq: u64,
    id: StateId,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // reversed, `BinaryHeap` is a max-heap
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
enum Inner {
    Queue(VecDeque<StateId>),
    Stack(Vec<StateId>),
    Heap { heap: BinaryHeap<Entry>, seq: u64 },
}

/// States discovered but not expanded yet.
#[derive(Debug)]
pub struct Frontier(Inner);

impl Frontier {
    pub fn new(order: FrontierOrder) -> Self {
        Frontier(match order {
            FrontierOrder::Fifo => Inner::Queue(VecDeque::new()),
            FrontierOrder::Lifo => Inner::Stack(Vec::new()),
            FrontierOrder::Priority => Inner::Heap {
                heap: BinaryHeap::new(),
                seq: 0,
            },
        })
    }

    /// Add a state; `key` only matters for priority frontiers.
    pub fn push(&mut self, id: StateId, key: Cost) {
        match &mut self.0 {
            Inner::Queue(queue) => queue.push_back(id),
            Inner::Stack(stack) => stack.push(id),
            Inner::Heap { heap, seq } => {
                heap.push(Entry { key, seq: *seq, id });
                *seq += 1;
            }
        }
    }

    pub fn pop(&mut self) -> Option<StateId> {
        match &mut self.0 {
            Inner::Queue(queue) => queue.pop_front(),
            Inner::Stack(stack) => stack.pop(),
            Inner::Heap { heap, .. } => heap.pop().map(|entry| entry.id),
        }
    }

    pub fn len(&self) -> usize {
        match &self.0 {
            Inner::Queue(queue) => queue.len(),
            Inner::Stack(stack) => stack.len(),
            Inner::Heap { heap, .. } => heap.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
