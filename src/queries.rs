//! Structural queries: degree, shared and unshared size, free variables.
//!
//! All of these are single-pass traversals over the DAG using the manager's
//! mark epochs, so repeated queries never rescan shared subgraphs.

use crate::manager::PddManager;
use crate::pdd::Pdd;
use crate::reference::NodeId;

impl PddManager {
    /// Number of distinct nodes in the DAG rooted at `p`, not counting the
    /// constant terminals 0 and 1.
    pub fn dag_size(&self, p: &Pdd<'_>) -> usize {
        self.check_manager(p);
        self.init_mark();
        self.set_mark(NodeId::ZERO);
        self.set_mark(NodeId::ONE);
        let mut size = 0;
        let mut todo = vec![p.id()];
        while let Some(r) = todo.pop() {
            if self.is_marked(r) {
                continue;
            }
            size += 1;
            self.set_mark(r);
            if self.is_val(r) {
                continue;
            }
            let (lo, hi) = (self.lo(r), self.hi(r));
            if !self.is_marked(lo) {
                todo.push(lo);
            }
            if !self.is_marked(hi) {
                todo.push(hi);
            }
        }
        size
    }

    /// Total degree of the polynomial: the longest chain of `hi` edges.
    pub fn degree(&self, p: &Pdd<'_>) -> u32 {
        self.check_manager(p);
        self.init_mark();
        let mut degree = vec![0u32; self.nodes.borrow().len()];
        let mut todo = vec![p.id()];
        while let Some(&r) = todo.last() {
            if self.is_marked(r) {
                todo.pop();
                continue;
            }
            if self.is_val(r) {
                self.set_mark(r);
                todo.pop();
                continue;
            }
            let (lo, hi) = (self.lo(r), self.hi(r));
            if self.is_marked(lo) && self.is_marked(hi) {
                degree[r.index()] = degree[lo.index()].max(degree[hi.index()] + 1);
                self.set_mark(r);
                todo.pop();
            } else {
                if !self.is_marked(lo) {
                    todo.push(lo);
                }
                if !self.is_marked(hi) {
                    todo.push(hi);
                }
            }
        }
        degree[p.id().index()]
    }

    /// Size of the fully expanded expression tree. The DAG can be
    /// exponentially smaller, hence the floating-point result.
    pub fn tree_size(&self, p: &Pdd<'_>) -> f64 {
        self.check_manager(p);
        self.init_mark();
        let mut size = vec![0f64; self.nodes.borrow().len()];
        let mut todo = vec![p.id()];
        while let Some(&r) = todo.last() {
            if self.is_marked(r) {
                todo.pop();
                continue;
            }
            if self.is_val(r) {
                size[r.index()] = 1.0;
                self.set_mark(r);
                todo.pop();
                continue;
            }
            let (lo, hi) = (self.lo(r), self.hi(r));
            if self.is_marked(lo) && self.is_marked(hi) {
                size[r.index()] = 1.0 + size[lo.index()] + size[hi.index()];
                self.set_mark(r);
                todo.pop();
            } else {
                if !self.is_marked(lo) {
                    todo.push(lo);
                }
                if !self.is_marked(hi) {
                    todo.push(hi);
                }
            }
        }
        size[p.id().index()]
    }

    /// The variables occurring in `p`, in discovery order.
    pub fn free_vars(&self, p: &Pdd<'_>) -> Vec<u32> {
        self.check_manager(p);
        self.init_mark();
        let mut vars = Vec::new();
        let mut todo = vec![p.id()];
        while let Some(r) = todo.pop() {
            if self.is_val(r) || self.is_marked(r) {
                continue;
            }
            let v = self.var(r);
            let vnode = self.var_node(v);
            if !self.is_marked(vnode) {
                vars.push(v);
            }
            self.set_mark(r);
            self.set_mark(vnode);
            let (lo, hi) = (self.lo(r), self.hi(r));
            if !self.is_marked(lo) {
                todo.push(lo);
            }
            if !self.is_marked(hi) {
                todo.push(hi);
            }
        }
        vars
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;
    use num_rational::BigRational;

    use super::*;

    fn q(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    #[test]
    fn test_degree_and_free_vars() {
        // degree(x0^3 + x1) == 3, free vars {0, 1}
        let m = PddManager::new(2);
        let x0 = m.mk_var(0).unwrap();
        let x1 = m.mk_var(1).unwrap();
        let x0_2 = m.mul(&x0, &x0).unwrap();
        let x0_3 = m.mul(&x0_2, &x0).unwrap();
        let p = m.add(&x0_3, &x1).unwrap();

        assert_eq!(m.degree(&p), 3);
        let mut vars = m.free_vars(&p);
        vars.sort_unstable();
        assert_eq!(vars, vec![0, 1]);
    }

    #[test]
    fn test_degree_of_constants() {
        let m = PddManager::new(1);
        assert_eq!(m.degree(&m.zero()), 0);
        assert_eq!(m.degree(&m.one()), 0);
        assert_eq!(m.degree(&m.mk_val(q(42)).unwrap()), 0);
        assert_eq!(m.degree(&m.mk_var(0).unwrap()), 1);
    }

    #[test]
    fn test_dag_size_shares_subgraphs() {
        let m = PddManager::new(2);
        let x = m.mk_var(0).unwrap();
        let y = m.mk_var(1).unwrap();
        assert_eq!(m.dag_size(&m.zero()), 0);
        assert_eq!(m.dag_size(&x), 1);
        // x*y + x = y-node over two x-children sharing structure
        let xy = m.mul(&x, &y).unwrap();
        let p = m.add(&xy, &x).unwrap();
        assert!(m.dag_size(&p) <= 3);
    }

    #[test]
    fn test_tree_size_counts_leaves() {
        let m = PddManager::new(2);
        let x = m.mk_var(0).unwrap();
        // x = 1*x + 0: one decision node and two value leaves.
        assert_eq!(m.tree_size(&x), 3.0);
        assert_eq!(m.tree_size(&m.one()), 1.0);
    }

    #[test]
    fn test_free_vars_ignores_absent_variables() {
        let m = PddManager::new(4);
        let x1 = m.mk_var(1).unwrap();
        let x3 = m.mk_var(3).unwrap();
        let p = m.mul(&x1, &x3).unwrap();
        let mut vars = m.free_vars(&p);
        vars.sort_unstable();
        assert_eq!(vars, vec![1, 3]);
    }
}
