//! # pdd-rs: Polynomial Decision Diagrams in Rust
//!
//! **`pdd-rs`** is a manager-centric library for working with **Polynomial
//! Decision Diagrams (PDDs)**: a shared, canonical representation of
//! multivariate polynomials over the rationals, with an optional GF(2) mode.
//! It provides the arithmetic kernel used by Gröbner-basis engines —
//! addition, multiplication, reduction and S-polynomial construction — on
//! top of a hash-consed node store with reference counting and garbage
//! collection.
//!
//! ## What is a PDD?
//!
//! A PDD represents a polynomial as a directed acyclic graph. A decision
//! node at level `ℓ` with children `lo` and `hi` denotes `x_ℓ * hi + lo`;
//! value nodes denote rational constants. The representation is
//! **canonical**: for a fixed variable order, every polynomial has exactly
//! one live node per distinct subterm, so equality is id comparison and
//! common subexpressions are computed once.
//!
//! ## Key features
//!
//! - **Manager-centric architecture**: all operations go through the
//!   [`PddManager`], which owns the unique table, the value pool, the op
//!   cache and the evaluation stack.
//! - **Cheap handles**: [`Pdd`] handles are reference-counted roots into the
//!   shared DAG. Copying a handle never copies a polynomial.
//! - **Memoized arithmetic**: every `add`/`mul`/`reduce` recursion is cached,
//!   within one call and across calls.
//! - **Garbage collection**: unreachable nodes, dead constants and stale
//!   cache entries are reclaimed when the pool fills up; out-of-memory
//!   retries once after a full collection before reporting
//!   [`Error::MemOut`].
//! - **Gröbner primitives**: [`PddManager::reduce`],
//!   [`PddManager::try_spoly`] and leading-term queries.
//!
//! ## Basic usage
//!
//! ```
//! use pdd_rs::PddManager;
//!
//! # fn main() -> pdd_rs::Result<()> {
//! // 1. Initialize the manager with three variables.
//! let m = PddManager::new(3);
//! let x = m.mk_var(0)?;
//! let y = m.mk_var(1)?;
//!
//! // 2. Build (x + y)^2 through the manager.
//! let s = m.add(&x, &y)?;
//! let sq = m.mul(&s, &s)?;
//!
//! // 3. Inspect it.
//! assert_eq!(sq.degree(), 2);
//! assert_eq!(sq.to_string(), "v1*v1 + 2*v1*v0 + v0*v0");
//!
//! // 4. Canonicity: equal polynomials share their root.
//! let sq2 = m.add(&m.mul(&s, &x)?, &m.mul(&s, &y)?)?;
//! assert_eq!(sq, sq2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core components
//!
//! - [`manager`]: the [`PddManager`] with the unique table and node store.
//! - [`pdd`]: the [`Pdd`] handle type and its operator sugar.
//! - [`apply`]: the memoized recursive evaluator.
//! - [`algebra`]: reduction, S-polynomials and leading-term machinery.
//! - [`gc`]: mark-and-sweep collection over nodes, values and the op cache.
//! - [`dot`]: Graphviz export for visualizing diagrams.

pub mod algebra;
pub mod apply;
pub mod cache;
pub mod display;
pub mod dot;
pub mod error;
pub mod gc;
pub mod manager;
pub mod node;
pub mod pdd;
pub mod queries;
pub mod reference;

pub use crate::algebra::CommonFactors;
pub use crate::display::Monomial;
pub use crate::error::{Error, Result};
pub use crate::manager::PddManager;
pub use crate::pdd::Pdd;
pub use crate::reference::NodeId;
