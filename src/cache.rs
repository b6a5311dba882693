//! Memoization table for the arithmetic evaluator.
//!
//! Entries are keyed by `(p, q, op)`. A reserved entry whose result is still
//! [`PENDING`] belongs to an in-flight recursion frame; garbage collection
//! keeps those and drops only completed entries, while [`OpCache::clear`]
//! (used between the two attempts of an out-of-memory retry) flushes
//! everything.

use std::cell::Cell;

use hashbrown::HashMap;

use crate::reference::NodeId;

/// Operator tag for cache keys. Unary minus memoizes under its own tag with
/// both operands equal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Op {
    Add,
    Mul,
    Reduce,
    Minus,
}

/// Number of reserved sentinel slots in the node pool, one per operator.
pub const NUM_OPS: u32 = 4;

/// Sentinel result of a reserved, not yet completed entry. Distinct from
/// every real id; the zero polynomial is a legitimate cached result.
pub(crate) const PENDING: NodeId = NodeId::new(u32::MAX);

pub struct OpCache {
    map: HashMap<(NodeId, NodeId, Op), NodeId>,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl OpCache {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Looks up `(p, q, op)`. On a hit, returns the completed result. On a
    /// miss (or a pending entry), reserves the entry and returns `None`; the
    /// caller is expected to compute the result and [`store`][Self::store] it.
    pub fn probe(&mut self, p: NodeId, q: NodeId, op: Op) -> Option<NodeId> {
        match self.map.get(&(p, q, op)) {
            Some(&r) if r != PENDING => {
                self.hits.set(self.hits.get() + 1);
                Some(r)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                self.map.insert((p, q, op), PENDING);
                None
            }
        }
    }

    /// Fills a reserved entry with the computed result.
    pub fn store(&mut self, p: NodeId, q: NodeId, op: Op, result: NodeId) {
        debug_assert_ne!(result, PENDING);
        self.map.insert((p, q, op), result);
    }

    /// Drops completed entries, keeping reserved ones (those belong to active
    /// recursion frames).
    pub fn drop_completed(&mut self) {
        self.map.retain(|_, r| *r == PENDING);
    }

    /// Flushes the whole table.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of cache hits.
    pub fn hits(&self) -> usize {
        self.hits.get()
    }
    /// Number of cache misses.
    pub fn misses(&self) -> usize {
        self.misses.get()
    }
}

impl Default for OpCache {
    fn default() -> Self {
        Self::new()
    }
}
