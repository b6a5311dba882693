//! Monomial extraction and textual rendering.

use std::fmt;

use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::manager::PddManager;
use crate::pdd::Pdd;
use crate::reference::NodeId;

/// A coefficient together with its variables, innermost level first.
pub type Monomial = (BigRational, Vec<u32>);

impl PddManager {
    /// Expands `p` into its monomials: the `hi` branch contributes the
    /// monomials containing the node's variable, the `lo` branch the rest.
    /// Zero coefficients are dropped, so the zero polynomial yields an empty
    /// list.
    pub fn to_monomials(&self, p: &Pdd<'_>) -> Vec<Monomial> {
        self.check_manager(p);
        self.monomials_rec(p.id())
    }

    fn monomials_rec(&self, p: NodeId) -> Vec<Monomial> {
        if self.is_val(p) {
            let v = self.val(p);
            if v.is_zero() {
                Vec::new()
            } else {
                vec![(v, Vec::new())]
            }
        } else {
            let v = self.var(p);
            let mut mons = self.monomials_rec(self.hi(p));
            for m in &mut mons {
                m.1.push(v);
            }
            mons.extend(self.monomials_rec(self.lo(p)));
            mons
        }
    }

    pub(crate) fn fmt_pdd(&self, out: &mut fmt::Formatter<'_>, p: NodeId) -> fmt::Result {
        let mons = self.monomials_rec(p);
        if mons.is_empty() {
            return write!(out, "0");
        }
        let mut first = true;
        for (coeff, mut vars) in mons {
            if first {
                if coeff.is_negative() {
                    write!(out, "- ")?;
                }
            } else if coeff.is_negative() {
                write!(out, " - ")?;
            } else {
                write!(out, " + ")?;
            }
            first = false;
            let c = coeff.abs();
            // Variables print outermost level first.
            vars.reverse();
            if !c.is_one() || vars.is_empty() {
                write!(out, "{}", c)?;
                if !vars.is_empty() {
                    write!(out, "*")?;
                }
            }
            let mut f = true;
            for v in vars {
                if !f {
                    write!(out, "*")?;
                }
                f = false;
                write!(out, "v{}", v)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Pdd<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.manager().fmt_pdd(out, self.id())
    }
}

/// Dumps the node store, one live node per line.
impl fmt::Display for PddManager {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.nodes.borrow().len();
        for i in 0..len {
            let id = NodeId::new(i as u32);
            let n = self.node(id);
            if i > 1 && n.internal {
                continue;
            }
            if n.is_val() {
                writeln!(out, "{} : {}", i, self.val(id))?;
            } else {
                writeln!(out, "{} : v{} {} {}", i, self.var(id), n.lo.raw(), n.hi.raw())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::*;

    fn q(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    #[test]
    fn test_display_constants() {
        let m = PddManager::new(1);
        assert_eq!(m.zero().to_string(), "0");
        assert_eq!(m.one().to_string(), "1");
        assert_eq!(m.mk_val(q(-7)).unwrap().to_string(), "- 7");
        let half = BigRational::new(BigInt::from(1), BigInt::from(2));
        assert_eq!(m.mk_val(half).unwrap().to_string(), "1/2");
    }

    #[test]
    fn test_display_polynomials() {
        let m = PddManager::new(3);
        let x0 = m.mk_var(0).unwrap();
        let x1 = m.mk_var(1).unwrap();
        assert_eq!(x0.to_string(), "v0");

        let p = m.add_scalar(q(1), &m.mul(&x1, &x0).unwrap()).unwrap();
        assert_eq!(p.to_string(), "v1*v0 + 1");

        let two_x0 = m.mul_scalar(q(2), &x0).unwrap();
        let p = m.sub(&x1, &two_x0).unwrap();
        assert_eq!(p.to_string(), "v1 - 2*v0");
    }

    #[test]
    fn test_display_orders_monomials_leading_first() {
        let m = PddManager::new(2);
        let x0 = m.mk_var(0).unwrap();
        let x1 = m.mk_var(1).unwrap();
        let x0sq = m.mul(&x0, &x0).unwrap();
        // x1 sits at the higher level, so it leads.
        let p = m.add(&x0sq, &x1).unwrap();
        assert_eq!(p.to_string(), "v1 + v0*v0");
    }

    #[test]
    fn test_to_monomials() {
        let m = PddManager::new(2);
        let x0 = m.mk_var(0).unwrap();
        let x1 = m.mk_var(1).unwrap();
        let p = {
            let t = m.mul_scalar(q(3), &m.mul(&x0, &x1).unwrap()).unwrap();
            m.add_scalar(q(-4), &t).unwrap()
        };
        let mons = m.to_monomials(&p);
        assert_eq!(mons.len(), 2);
        assert!(mons.contains(&(q(3), vec![0, 1])));
        assert!(mons.contains(&(q(-4), vec![])));

        assert!(m.to_monomials(&m.zero()).is_empty());
    }

    #[test]
    fn test_manager_display_lists_nodes() {
        let m = PddManager::new(1);
        let x = m.mk_var(0).unwrap();
        let _p = m.add_scalar(q(2), &x).unwrap();
        let dump = m.to_string();
        assert!(dump.contains("0 : 0"));
        assert!(dump.contains("1 : 1"));
        assert!(dump.contains(": v0 0 1"));
        assert!(dump.contains("2"));
    }
}
