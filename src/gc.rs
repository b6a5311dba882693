//! Mark-and-sweep garbage collection over nodes, value slots and the op
//! cache, plus the mark-epoch scheme shared by all traversals.
//!
//! Roots are (a) every id on the evaluation stack (in-flight recursion
//! frames) and (b) every node with a positive refcount, which covers both
//! handles and pinned nodes. Collection reclaims node slots into the free
//! list, returns value slots of dead constants to the value pool, drops
//! completed op-cache entries, and rebuilds the unique table from the
//! survivors.

use log::debug;

use crate::manager::PddManager;
use crate::reference::NodeId;

impl PddManager {
    /// Collects unreachable nodes. Triggered by node insertion when the free
    /// list is empty; may also be called explicitly.
    pub fn gc(&self) {
        let num_nodes = self.nodes.borrow().len();
        debug!("gc: scanning {} nodes", num_nodes);
        debug_assert!(self.well_formed());

        self.nodes.borrow_mut().free.clear();

        // Seed the reachability set.
        let mut reachable = vec![false; num_nodes];
        let mut todo: Vec<NodeId> = Vec::new();
        {
            let store = self.nodes.borrow();
            for &id in self.stack.borrow().iter() {
                if !reachable[id.index()] {
                    reachable[id.index()] = true;
                    todo.push(id);
                }
            }
            for i in (2..num_nodes).rev() {
                if store.nodes[i].refcount > 0 && !reachable[i] {
                    reachable[i] = true;
                    todo.push(NodeId::new(i as u32));
                }
            }

            // Transitive closure over lo/hi.
            while let Some(p) = todo.pop() {
                let n = &store.nodes[p.index()];
                if n.is_val() {
                    continue;
                }
                if !reachable[n.lo.index()] {
                    reachable[n.lo.index()] = true;
                    todo.push(n.lo);
                }
                if !reachable[n.hi.index()] {
                    reachable[n.hi.index()] = true;
                    todo.push(n.hi);
                }
            }
        }

        // Sweep. Dead value nodes release their value slot and lookup entry,
        // except the frozen rational, whose node is held back entirely.
        let mut freed = 0usize;
        {
            let mut store = self.nodes.borrow_mut();
            let mut pool = self.values.borrow_mut();
            for i in (2..num_nodes).rev() {
                if reachable[i] {
                    continue;
                }
                if store.nodes[i].internal {
                    store.free.push(NodeId::new(i as u32));
                    continue;
                }
                if store.nodes[i].is_val() {
                    let vi = store.nodes[i].value_index();
                    let r = pool.values[vi as usize].clone();
                    if pool.freeze.as_ref() == Some(&r) {
                        continue;
                    }
                    if pool.lookup.remove(&r).is_some() {
                        pool.free.push(vi);
                    }
                }
                debug_assert_eq!(store.nodes[i].refcount, 0);
                store.nodes[i].internal = true;
                store.nodes[i].lo = NodeId::ZERO;
                store.nodes[i].hi = NodeId::ZERO;
                store.free.push(NodeId::new(i as u32));
                freed += 1;
            }
            // Low ids are popped first: adjacent slots get reused in order.
            store.free.sort_unstable_by(|a, b| b.raw().cmp(&a.raw()));
        }
        debug!("gc: freed {} nodes", freed);

        // Keep reserved op-cache entries: they belong to recursion frames
        // that are still running.
        self.cache.borrow_mut().drop_completed();

        // Rebuild the unique table from the survivors.
        {
            let store = self.nodes.borrow();
            let mut table = self.table.borrow_mut();
            table.clear();
            for i in 2..num_nodes {
                let n = &store.nodes[i];
                if reachable[i] && !n.internal {
                    table.insert(n.key(), n.index);
                }
            }
        }
        debug_assert!(self.well_formed());
    }

    /// Full collection: reclaims nodes and flushes the entire op cache.
    /// This is the action taken between the two attempts of an
    /// out-of-memory retry.
    pub fn try_gc(&self) {
        self.gc();
        self.cache.borrow_mut().clear();
        debug_assert!(self.well_formed());
    }

    // -- mark epochs ------------------------------------------------------

    /// Opens a fresh traversal epoch. On wrap-around the mark vector is
    /// cleared and the epoch bumped again so stale marks can never match.
    pub(crate) fn init_mark(&self) {
        let n = self.nodes.borrow().len();
        let mut marks = self.marks.borrow_mut();
        marks.mark.resize(n, 0);
        marks.level = marks.level.wrapping_add(1);
        if marks.level == 0 {
            marks.mark.fill(0);
            marks.level = 1;
        }
    }

    pub(crate) fn set_mark(&self, p: NodeId) {
        let mut marks = self.marks.borrow_mut();
        let level = marks.level;
        marks.mark[p.index()] = level;
    }

    pub(crate) fn is_marked(&self, p: NodeId) -> bool {
        let marks = self.marks.borrow();
        marks.mark[p.index()] == marks.level
    }
}
