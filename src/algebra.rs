//! Leading-term machinery: divisibility, quotients, reduction on matching
//! levels, S-polynomials and leading-term comparisons.
//!
//! The leading monomial of a polynomial is the product of variables along
//! the `hi` spine from the root, which makes all of these spine walks.

use num_integer::Integer;
use num_rational::BigRational;
use num_traits::Zero;

use crate::cache::Op;
use crate::error::Result;
use crate::manager::PddManager;
use crate::pdd::Pdd;
use crate::reference::NodeId;

/// Superposition data for a pair of polynomials, as produced by
/// [`PddManager::common_factors`]:
/// `x^p * lm(b)  =  x^q * lm(a)  =  lcm(lm(a), lm(b))`.
#[derive(Debug, Clone)]
pub struct CommonFactors {
    /// Variables of `lm(a)` missing from `lm(b)`; they multiply `b`.
    pub p: Vec<u32>,
    /// Variables of `lm(b)` missing from `lm(a)`; they multiply `a`.
    pub q: Vec<u32>,
    /// Leading coefficient of `a`.
    pub pc: BigRational,
    /// Leading coefficient of `b`.
    pub qc: BigRational,
}

impl PddManager {
    /// True iff the leading monomial of `p` divides the leading monomial of
    /// `q`. Values divide anything.
    pub(crate) fn lm_divides(&self, p: NodeId, q: NodeId) -> bool {
        let (mut p, mut q) = (p, q);
        loop {
            if self.is_val(p) {
                return true;
            }
            if self.is_val(q) {
                return false;
            }
            if self.level(p) > self.level(q) {
                return false;
            }
            if self.level(p) == self.level(q) {
                p = self.hi(p);
                q = self.hi(q);
            } else {
                q = self.hi(q);
            }
        }
    }

    /// The signed quotient `-lt(q) / lt(p)`, arranged so that
    /// `q + lt_quotient(p, q) * p` cancels the leading term of `q`.
    /// Requires `lm_divides(p, q)`; the divisor coefficient is then
    /// guaranteed non-zero.
    pub(crate) fn lt_quotient(&self, p: NodeId, q: NodeId) -> Result<NodeId> {
        debug_assert!(self.lm_divides(p, q));
        if self.is_val(p) {
            if self.is_val(q) {
                let vp = self.val(p);
                debug_assert!(!vp.is_zero());
                return self.imk_val(-(self.val(q) / vp));
            }
        } else if self.level(p) == self.level(q) {
            return self.lt_quotient(self.hi(p), self.hi(q));
        }
        let v = self.var(q);
        let inner = self.lt_quotient(p, self.hi(q))?;
        self.push(inner);
        let r = self.apply_rec(self.var_node(v), inner, Op::Mul);
        self.pop(1);
        r
    }

    /// Repeatedly cancels the leading term of `a` while the leading monomial
    /// of `b` divides it: `a <- a + (-lt(a)/lt(b)) * b`. Loop state goes on
    /// the evaluation stack, since every round allocates.
    pub(crate) fn reduce_on_match(&self, a: NodeId, b: NodeId) -> Result<NodeId> {
        debug_assert!(self.level(a) == self.level(b) && !self.is_val(a) && !self.is_val(b));
        let mut a = a;
        while self.lm_divides(b, a) {
            self.push(a);
            let qt = self.lt_quotient(b, a)?;
            self.push(qt);
            let r = self.apply_rec(qt, b, Op::Mul)?;
            self.push(r);
            let next = self.apply_rec(a, r, Op::Add)?;
            self.pop(3);
            a = next;
        }
        Ok(a)
    }

    /// Computes the variable lists and leading coefficients needed to
    /// superpose `a` and `b`, or `None` when their leading monomials share
    /// no variable. Over Q both coefficients are reduced by their gcd when
    /// integral.
    pub fn common_factors(&self, a: &Pdd<'_>, b: &Pdd<'_>) -> Option<CommonFactors> {
        self.check_manager(a);
        self.check_manager(b);
        let mut p = Vec::new();
        let mut q = Vec::new();
        let mut x = a.id();
        let mut y = b.id();
        let mut has_common = false;
        loop {
            if self.is_val(x) || self.is_val(y) {
                if !has_common {
                    return None;
                }
                while !self.is_val(y) {
                    q.push(self.var(y));
                    y = self.hi(y);
                }
                while !self.is_val(x) {
                    p.push(self.var(x));
                    x = self.hi(x);
                }
                let mut pc = self.val(x);
                let mut qc = self.val(y);
                if !self.mod2_semantics() && pc.is_integer() && qc.is_integer() {
                    let g = pc.to_integer().gcd(&qc.to_integer());
                    let g = BigRational::from_integer(g);
                    pc /= g.clone();
                    qc /= g;
                }
                return Some(CommonFactors { p, q, pc, qc });
            }
            if self.level(x) == self.level(y) {
                has_common = true;
                x = self.hi(x);
                y = self.hi(y);
            } else if self.level(x) > self.level(y) {
                p.push(self.var(x));
                x = self.hi(x);
            } else {
                q.push(self.var(y));
                y = self.hi(y);
            }
        }
    }

    /// The S-polynomial `a * (qc * x^q) - b * (pc * x^p)`: both products
    /// have the leading term `pc*qc*lcm(lm(a), lm(b))`, which cancels.
    pub fn spoly(&self, a: &Pdd<'_>, b: &Pdd<'_>, f: &CommonFactors) -> Result<Pdd<'_>> {
        let mut r1 = self.mk_val(f.qc.clone())?;
        for &v in f.q.iter().rev() {
            let xv = self.mk_var(v)?;
            r1 = self.mul(&xv, &r1)?;
        }
        let r1 = self.mul(a, &r1)?;
        let mut r2 = self.mk_val(-f.pc.clone())?;
        for &v in f.p.iter().rev() {
            let xv = self.mk_var(v)?;
            r2 = self.mul(&xv, &r2)?;
        }
        let r2 = self.mul(b, &r2)?;
        self.add(&r1, &r2)
    }

    /// S-polynomial of `a` and `b`, or `None` when their leading monomials
    /// share no variable (nothing to superpose on).
    pub fn try_spoly(&self, a: &Pdd<'_>, b: &Pdd<'_>) -> Result<Option<Pdd<'_>>> {
        match self.common_factors(a, b) {
            None => Ok(None),
            Some(f) => self.spoly(a, b, &f).map(Some),
        }
    }

    /// Leading-term order on polynomials. Values compare by value and come
    /// before any variable term; at equal levels the comparison descends on
    /// `lo/lo` when the `hi` parts coincide and on `hi/hi` otherwise; at
    /// unequal levels the higher level wins.
    pub fn lt(&self, a: &Pdd<'_>, b: &Pdd<'_>) -> bool {
        self.check_manager(a);
        self.check_manager(b);
        let mut x = a.id();
        let mut y = b.id();
        if x == y {
            return false;
        }
        loop {
            debug_assert_ne!(x, y);
            if self.is_val(x) {
                return !self.is_val(y) || self.val(x) < self.val(y);
            }
            if self.is_val(y) {
                return false;
            }
            if self.level(x) == self.level(y) {
                if self.hi(x) == self.hi(y) {
                    x = self.lo(x);
                    y = self.lo(y);
                } else {
                    x = self.hi(x);
                    y = self.hi(y);
                }
            } else {
                return self.level(x) > self.level(y);
            }
        }
    }

    /// True iff the leading monomials of `a` and `b` differ.
    pub fn different_leading_term(&self, a: &Pdd<'_>, b: &Pdd<'_>) -> bool {
        self.check_manager(a);
        self.check_manager(b);
        let mut x = a.id();
        let mut y = b.id();
        loop {
            if x == y {
                return false;
            }
            if self.is_val(x) || self.is_val(y) {
                return true;
            }
            if self.level(x) == self.level(y) {
                x = self.hi(x);
                y = self.hi(y);
            } else {
                return true;
            }
        }
    }

    /// True iff `p` has the form `c1*x1 + ... + cn*xn + c` with value
    /// coefficients.
    pub fn is_linear(&self, p: &Pdd<'_>) -> bool {
        self.check_manager(p);
        let mut p = p.id();
        loop {
            if self.is_val(p) {
                return true;
            }
            if !self.is_val(self.hi(p)) {
                return false;
            }
            p = self.lo(p);
        }
    }
}
