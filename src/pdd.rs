//! Owning handles to polynomials.
//!
//! A [`Pdd`] bundles a root id with its manager and holds one reference
//! count on the root: cloning increments, dropping decrements. Handles are
//! the only user-visible object; everything reachable from a live handle is
//! safe from garbage collection.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_rational::BigRational;

use crate::manager::PddManager;
use crate::reference::NodeId;

pub struct Pdd<'a> {
    root: NodeId,
    manager: &'a PddManager,
}

impl<'a> Pdd<'a> {
    pub(crate) fn new(manager: &'a PddManager, root: NodeId) -> Self {
        manager.inc_ref(root);
        Self { root, manager }
    }

    /// The root id. Only meaningful within this manager; equal ids mean
    /// equal polynomials.
    pub fn id(&self) -> NodeId {
        self.root
    }

    pub fn manager(&self) -> &'a PddManager {
        self.manager
    }

    pub fn is_zero(&self) -> bool {
        self.root == NodeId::ZERO
    }

    pub fn is_one(&self) -> bool {
        self.root == NodeId::ONE
    }

    /// True iff this polynomial is a constant.
    pub fn is_val(&self) -> bool {
        self.manager.is_val(self.root)
    }

    /// The constant's value. Panics on a decision node.
    pub fn val(&self) -> BigRational {
        assert!(self.is_val(), "val() on a non-constant pdd");
        self.manager.val(self.root)
    }

    /// The variable at the root. Panics on a constant.
    pub fn var(&self) -> u32 {
        assert!(!self.is_val(), "var() on a constant pdd");
        self.manager.var(self.root)
    }

    /// The polynomial without the root variable's terms: `p = x*hi + lo`.
    pub fn lo(&self) -> Pdd<'a> {
        assert!(!self.is_val(), "lo() on a constant pdd");
        Pdd::new(self.manager, self.manager.lo(self.root))
    }

    /// The coefficient polynomial of the root variable: `p = x*hi + lo`.
    pub fn hi(&self) -> Pdd<'a> {
        assert!(!self.is_val(), "hi() on a constant pdd");
        Pdd::new(self.manager, self.manager.hi(self.root))
    }

    pub fn is_linear(&self) -> bool {
        self.manager.is_linear(self)
    }

    pub fn degree(&self) -> u32 {
        self.manager.degree(self)
    }

    pub fn dag_size(&self) -> usize {
        self.manager.dag_size(self)
    }

    pub fn tree_size(&self) -> f64 {
        self.manager.tree_size(self)
    }

    pub fn free_vars(&self) -> Vec<u32> {
        self.manager.free_vars(self)
    }

    pub fn to_monomials(&self) -> Vec<crate::display::Monomial> {
        self.manager.to_monomials(self)
    }
}

impl Clone for Pdd<'_> {
    fn clone(&self) -> Self {
        Pdd::new(self.manager, self.root)
    }
}

impl Drop for Pdd<'_> {
    fn drop(&mut self) {
        self.manager.dec_ref(self.root);
    }
}

/// Canonicity makes structural equality an id comparison. Handles from
/// different managers never compare equal.
impl PartialEq for Pdd<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.manager, other.manager) && self.root == other.root
    }
}

impl Eq for Pdd<'_> {}

impl fmt::Debug for Pdd<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pdd({})", self.root)
    }
}

// Operator sugar over the manager's fallible API. These panic when the node
// pool is exhausted; use the manager methods to handle that case.

impl<'a> Add for &Pdd<'a> {
    type Output = Pdd<'a>;

    fn add(self, rhs: Self) -> Self::Output {
        self.manager.add(self, rhs).expect("pdd: node pool limit reached")
    }
}

impl<'a> Sub for &Pdd<'a> {
    type Output = Pdd<'a>;

    fn sub(self, rhs: Self) -> Self::Output {
        self.manager.sub(self, rhs).expect("pdd: node pool limit reached")
    }
}

impl<'a> Mul for &Pdd<'a> {
    type Output = Pdd<'a>;

    fn mul(self, rhs: Self) -> Self::Output {
        self.manager.mul(self, rhs).expect("pdd: node pool limit reached")
    }
}

impl<'a> Neg for &Pdd<'a> {
    type Output = Pdd<'a>;

    fn neg(self) -> Self::Output {
        self.manager.minus(self).expect("pdd: node pool limit reached")
    }
}
