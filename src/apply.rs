//! The memoized recursive evaluator for `add`, `mul` and `reduce`, plus
//! unary minus.
//!
//! Each entry point wraps a recursive worker in a retry loop: an
//! out-of-memory signal unwinds to the entry point, which flushes the op
//! cache and collects garbage once before giving up. The workers keep every
//! intermediate id alive by pushing it on the manager's evaluation stack
//! *before* any call that may allocate; the garbage collector scans that
//! stack as a root set.

use log::debug;

use crate::cache::Op;
use crate::error::{Error, Result};
use crate::manager::PddManager;
use crate::pdd::Pdd;
use crate::reference::NodeId;

impl PddManager {
    /// `a + b`.
    pub fn add(&self, a: &Pdd<'_>, b: &Pdd<'_>) -> Result<Pdd<'_>> {
        self.check_manager(a);
        self.check_manager(b);
        Ok(Pdd::new(self, self.apply(a.id(), b.id(), Op::Add)?))
    }

    /// `a - b`, built as `a + (-b)`.
    pub fn sub(&self, a: &Pdd<'_>, b: &Pdd<'_>) -> Result<Pdd<'_>> {
        let m = self.minus(b)?;
        self.add(a, &m)
    }

    /// `a * b`.
    pub fn mul(&self, a: &Pdd<'_>, b: &Pdd<'_>) -> Result<Pdd<'_>> {
        self.check_manager(a);
        self.check_manager(b);
        Ok(Pdd::new(self, self.apply(a.id(), b.id(), Op::Mul)?))
    }

    /// Reduces `a` modulo `b`: repeatedly cancels leading terms of `a` that
    /// the leading monomial of `b` divides.
    pub fn reduce(&self, a: &Pdd<'_>, b: &Pdd<'_>) -> Result<Pdd<'_>> {
        self.check_manager(a);
        self.check_manager(b);
        Ok(Pdd::new(self, self.apply(a.id(), b.id(), Op::Reduce)?))
    }

    /// `r + b` for a scalar `r`.
    pub fn add_scalar(&self, r: num_rational::BigRational, b: &Pdd<'_>) -> Result<Pdd<'_>> {
        let c = self.mk_val(r)?;
        self.add(&c, b)
    }

    /// `r * b` for a scalar `r`.
    pub fn mul_scalar(&self, r: num_rational::BigRational, b: &Pdd<'_>) -> Result<Pdd<'_>> {
        let c = self.mk_val(r)?;
        self.mul(&c, b)
    }

    /// `-a`. The identity in mod-2 mode.
    pub fn minus<'a>(&'a self, a: &Pdd<'a>) -> Result<Pdd<'a>> {
        self.check_manager(a);
        if self.mod2_semantics() {
            return Ok(a.clone());
        }
        let mark = self.stack.borrow().len();
        let mut first = true;
        loop {
            match self.minus_rec(a.id()) {
                Ok(r) => {
                    self.stack.borrow_mut().truncate(mark);
                    return Ok(Pdd::new(self, r));
                }
                Err(Error::MemOut) => {
                    self.stack.borrow_mut().truncate(mark);
                    debug!("minus: out of memory, collecting");
                    self.try_gc();
                    if !first {
                        return Err(Error::MemOut);
                    }
                    first = false;
                }
            }
        }
    }

    // -- evaluation stack ------------------------------------------------

    pub(crate) fn push(&self, id: NodeId) {
        self.stack.borrow_mut().push(id);
    }

    pub(crate) fn pop(&self, n: usize) {
        let mut stack = self.stack.borrow_mut();
        let len = stack.len();
        debug_assert!(n <= len);
        stack.truncate(len - n);
    }

    /// Reads the `i`-th entry from the top of the evaluation stack
    /// (`read(1)` is the most recent push).
    pub(crate) fn read(&self, i: usize) -> NodeId {
        let stack = self.stack.borrow();
        stack[stack.len() - i]
    }

    // -- the evaluator ---------------------------------------------------

    /// Runs `apply_rec` with the one-shot out-of-memory retry. The stack is
    /// rebalanced after an unwind, so partially pushed frames cannot leak.
    pub(crate) fn apply(&self, a: NodeId, b: NodeId, op: Op) -> Result<NodeId> {
        let mark = self.stack.borrow().len();
        let mut first = true;
        loop {
            match self.apply_rec(a, b, op) {
                Ok(r) => {
                    self.stack.borrow_mut().truncate(mark);
                    return Ok(r);
                }
                Err(Error::MemOut) => {
                    self.stack.borrow_mut().truncate(mark);
                    debug!("apply: out of memory, collecting");
                    self.try_gc();
                    if !first {
                        return Err(Error::MemOut);
                    }
                    first = false;
                }
            }
        }
    }

    pub(crate) fn apply_rec(&self, p: NodeId, q: NodeId, op: Op) -> Result<NodeId> {
        let (mut p, mut q) = (p, q);

        // Structural short-circuits, applied before memoization, and the
        // canonical argument order: a value (or the smaller level) goes
        // second, halving the cache key space.
        match op {
            Op::Add => {
                if self.is_zero(p) {
                    return Ok(q);
                }
                if self.is_zero(q) {
                    return Ok(p);
                }
                if self.is_val(p) && self.is_val(q) {
                    return self.imk_val(self.val(p) + self.val(q));
                }
                if !self.is_val(p) && self.level(p) < self.level(q) {
                    std::mem::swap(&mut p, &mut q);
                }
                if self.is_val(p) {
                    std::mem::swap(&mut p, &mut q);
                }
            }
            Op::Mul => {
                if self.is_zero(p) || self.is_zero(q) {
                    return Ok(NodeId::ZERO);
                }
                if self.is_one(p) {
                    return Ok(q);
                }
                if self.is_one(q) {
                    return Ok(p);
                }
                if self.is_val(p) && self.is_val(q) {
                    return self.imk_val(self.val(p) * self.val(q));
                }
                if !self.is_val(p) && self.level(p) < self.level(q) {
                    std::mem::swap(&mut p, &mut q);
                }
                if self.is_val(p) {
                    std::mem::swap(&mut p, &mut q);
                }
            }
            Op::Reduce => {
                if self.is_zero(q) {
                    return Ok(p);
                }
                if self.is_val(p) {
                    return Ok(p);
                }
                // No leading term of q divides any monomial of p.
                if self.level(p) < self.level(q) {
                    return Ok(p);
                }
            }
            Op::Minus => unreachable!("minus is handled by minus_rec"),
        }

        if let Some(r) = self.cache.borrow_mut().probe(p, q, op) {
            return Ok(r);
        }

        let level_p = self.level(p);
        let level_q = self.level(q);
        let r;
        let mut npop = 2;

        match op {
            Op::Add => {
                debug_assert!(!self.is_val(p));
                if self.is_val(q) || level_p > level_q {
                    self.push(self.apply_rec(self.lo(p), q, op)?);
                    r = self.make_node(level_p, self.read(1), self.hi(p))?;
                    npop = 1;
                } else {
                    debug_assert_eq!(level_p, level_q);
                    self.push(self.apply_rec(self.lo(p), self.lo(q), op)?);
                    self.push(self.apply_rec(self.hi(p), self.hi(q), op)?);
                    r = self.make_node(level_p, self.read(2), self.read(1))?;
                }
            }
            Op::Mul => {
                debug_assert!(!self.is_val(p));
                if self.is_val(q) || level_p > level_q {
                    // (x*hi(p) + lo(p)) * q = x*(hi(p)*q) + lo(p)*q
                    self.push(self.apply_rec(self.lo(p), q, op)?);
                    self.push(self.apply_rec(self.hi(p), q, op)?);
                    r = self.make_node(level_p, self.read(2), self.read(1))?;
                } else if self.mod2_semantics() {
                    // (xa+b)*(xc+d) = x*((a+b)*(c+d) + bd) + bd over GF(2),
                    // folding x^2 into x.
                    debug_assert_eq!(level_p, level_q);
                    self.push(self.apply_rec(self.lo(p), self.lo(q), Op::Mul)?);
                    let bd = self.read(1);
                    self.push(self.apply_rec(self.hi(p), self.lo(p), Op::Add)?);
                    self.push(self.apply_rec(self.hi(q), self.lo(q), Op::Add)?);
                    self.push(self.apply_rec(self.read(1), self.read(2), Op::Mul)?);
                    self.push(self.apply_rec(self.read(1), bd, Op::Add)?);
                    r = self.make_node(level_p, bd, self.read(1))?;
                    npop = 5;
                } else {
                    // (xa+b)*(xc+d) = x*(x*ac + (ad+bc)) + bd; when ad+bc
                    // still has a term at this level, the x*ac contribution
                    // is folded into its hi part.
                    debug_assert_eq!(level_p, level_q);
                    self.push(self.apply_rec(self.hi(p), self.hi(q), op)?);
                    self.push(self.apply_rec(self.hi(p), self.lo(q), op)?);
                    self.push(self.apply_rec(self.lo(p), self.hi(q), op)?);
                    self.push(self.apply_rec(self.lo(p), self.lo(q), op)?);
                    let (ac, ad, bc, bd) = (self.read(4), self.read(3), self.read(2), self.read(1));
                    self.push(self.apply_rec(ad, bc, Op::Add)?);
                    let n = self.read(1);
                    if !self.is_val(n) && self.level(n) == level_p {
                        self.push(self.apply_rec(ac, self.hi(n), Op::Add)?);
                        self.push(self.make_node(level_p, self.lo(n), self.read(1))?);
                        r = self.make_node(level_p, bd, self.read(1))?;
                        npop = 7;
                    } else {
                        self.push(self.make_node(level_p, n, ac)?);
                        r = self.make_node(level_p, bd, self.read(1))?;
                        npop = 6;
                    }
                }
            }
            Op::Reduce => {
                if level_p > level_q {
                    self.push(self.apply_rec(self.lo(p), q, op)?);
                    self.push(self.apply_rec(self.hi(p), q, op)?);
                    r = self.make_node(level_p, self.read(2), self.read(1))?;
                } else {
                    debug_assert_eq!(level_p, level_q);
                    r = self.reduce_on_match(p, q)?;
                    npop = 0;
                }
            }
            Op::Minus => unreachable!("minus is handled by minus_rec"),
        }

        self.pop(npop);
        self.cache.borrow_mut().store(p, q, op, r);
        Ok(r)
    }

    pub(crate) fn minus_rec(&self, a: NodeId) -> Result<NodeId> {
        debug_assert!(!self.mod2_semantics());
        if self.is_zero(a) {
            return Ok(NodeId::ZERO);
        }
        if self.is_val(a) {
            return self.imk_val(-self.val(a));
        }
        if let Some(r) = self.cache.borrow_mut().probe(a, a, Op::Minus) {
            return Ok(r);
        }
        self.push(self.minus_rec(self.lo(a))?);
        self.push(self.minus_rec(self.hi(a))?);
        let r = self.make_node(self.level(a), self.read(2), self.read(1))?;
        self.pop(2);
        self.cache.borrow_mut().store(a, a, Op::Minus, r);
        Ok(r)
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
    fn test_add_short_circuits() {
        let m = PddManager::new(2);
        let x = m.mk_var(0).unwrap();
        let zero = m.zero();
        assert_eq!(m.add(&zero, &x).unwrap(), x);
        assert_eq!(m.add(&x, &zero).unwrap(), x);
        let two = m.mk_val(q(2)).unwrap();
        let three = m.mk_val(q(3)).unwrap();
        assert_eq!(m.add(&two, &three).unwrap(), m.mk_val(q(5)).unwrap());
    }

    #[test]
    fn test_mul_short_circuits() {
        let m = PddManager::new(2);
        let x = m.mk_var(0).unwrap();
        assert!(m.mul(&m.zero(), &x).unwrap().is_zero());
        assert_eq!(m.mul(&m.one(), &x).unwrap(), x);
        let two = m.mk_val(q(2)).unwrap();
        let three = m.mk_val(q(3)).unwrap();
        assert_eq!(m.mul(&two, &three).unwrap(), m.mk_val(q(6)).unwrap());
    }

    #[test]
    fn test_square_of_linear() {
        // (x + 1)^2 = x^2 + 2x + 1
        let m = PddManager::new(1);
        let x = m.mk_var(0).unwrap();
        let p = m.add_scalar(q(1), &x).unwrap();
        let sq = m.mul(&p, &p).unwrap();

        let x2 = m.mul(&x, &x).unwrap();
        let two_x = m.mul_scalar(q(2), &x).unwrap();
        let expected = m
            .add(&x2, &m.add_scalar(q(1), &two_x).unwrap())
            .unwrap();
        assert_eq!(sq, expected);
        assert_eq!(m.degree(&sq), 2);
    }

    #[test]
    fn test_square_of_linear_mod2() {
        // Multiplication folds x^2 into x, so (x + 1)^2 = x + 1 over GF(2).
        let m = PddManager::new(1);
        m.set_mod2_semantics();
        let x = m.mk_var(0).unwrap();
        let p = m.add_scalar(q(1), &x).unwrap();
        let sq = m.mul(&p, &p).unwrap();
        assert_eq!(sq, p);
    }

    #[test]
    fn test_add_is_commutative_mul_distributes() {
        let m = PddManager::new(3);
        let x = m.mk_var(0).unwrap();
        let y = m.mk_var(1).unwrap();
        let z = m.mk_var(2).unwrap();

        let xy = m.add(&x, &y).unwrap();
        let yx = m.add(&y, &x).unwrap();
        assert_eq!(xy, yx);

        // z * (x + y) == z*x + z*y
        let lhs = m.mul(&z, &xy).unwrap();
        let zx = m.mul(&z, &x).unwrap();
        let zy = m.mul(&z, &y).unwrap();
        let rhs = m.add(&zx, &zy).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_commuted_product_doubles() {
        // x1*x0 + x0*x1 = 2*x0*x1 over Q, and 0 over GF(2).
        let m = PddManager::new(2);
        let x0 = m.mk_var(0).unwrap();
        let x1 = m.mk_var(1).unwrap();
        let a = m.mul(&x1, &x0).unwrap();
        let b = m.mul(&x0, &x1).unwrap();
        assert_eq!(a, b);
        let sum = m.add(&a, &b).unwrap();
        let prod = m.mul(&x0, &x1).unwrap();
        assert_eq!(sum, m.mul_scalar(q(2), &prod).unwrap());

        let m2 = PddManager::new(2);
        m2.set_mod2_semantics();
        let y0 = m2.mk_var(0).unwrap();
        let y1 = m2.mk_var(1).unwrap();
        let a = m2.mul(&y1, &y0).unwrap();
        let b = m2.mul(&y0, &y1).unwrap();
        assert!(m2.add(&a, &b).unwrap().is_zero());
    }

    #[test]
    fn test_minus_cancels() {
        let m = PddManager::new(2);
        let x = m.mk_var(0).unwrap();
        let y = m.mk_var(1).unwrap();
        let p = m.add(&m.mul(&x, &y).unwrap(), &m.mk_val(q(3)).unwrap()).unwrap();
        let n = m.minus(&p).unwrap();
        assert!(m.add(&p, &n).unwrap().is_zero());
        assert_eq!(m.sub(&p, &p).unwrap(), m.zero());
    }

    #[test]
    fn test_self_addition_mod2() {
        let m = PddManager::new(2);
        m.set_mod2_semantics();
        let x = m.mk_var(0).unwrap();
        let y = m.mk_var(1).unwrap();
        let p = m.add(&m.mul(&x, &y).unwrap(), &y).unwrap();
        assert!(m.add(&p, &p).unwrap().is_zero());
        // minus is the identity
        assert_eq!(m.minus(&p).unwrap(), p);
    }

    #[test]
    fn test_mul_associativity() {
        let m = PddManager::new(3);
        let x = m.mk_var(0).unwrap();
        let y = m.mk_var(1).unwrap();
        let z = m.mk_var(2).unwrap();
        let xy = m.mul(&x, &y).unwrap();
        let yz = m.mul(&y, &z).unwrap();
        assert_eq!(m.mul(&xy, &z).unwrap(), m.mul(&x, &yz).unwrap());
    }

    #[test]
    fn test_same_level_square_keeps_degree() {
        let m = PddManager::new(1);
        let x = m.mk_var(0).unwrap();
        let x2 = m.mul(&x, &x).unwrap();
        let x3 = m.mul(&x2, &x).unwrap();
        assert_eq!(m.degree(&x2), 2);
        assert_eq!(m.degree(&x3), 3);
        assert!(m.well_formed());
    }
}
