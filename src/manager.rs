//! The PDD manager: single owner of the node pool, the unique table, the
//! value pool, the op cache and the variable order.
//!
//! All polynomials of one manager share subgraphs, so structural equality is
//! id equality. User code holds [`Pdd`] handles; internal algorithms pass raw
//! [`NodeId`]s and protect them through the evaluation stack (see
//! [`apply`][crate::apply]).

use std::cell::{Cell, RefCell};

use hashbrown::HashMap;
use log::debug;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Zero};

use crate::cache::{OpCache, NUM_OPS};
use crate::error::{Error, Result};
use crate::node::{Node, NodeKey, MAX_RC};
use crate::pdd::Pdd;
use crate::reference::NodeId;

/// Default ceiling on the node pool: 2^24 slots.
pub const DEFAULT_MAX_NUM_NODES: usize = 1 << 24;

pub(crate) struct NodeStore {
    pub(crate) nodes: Vec<Node>,
    pub(crate) free: Vec<NodeId>,
}

impl NodeStore {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Appends `n` fresh internal slots and lists them as free, low ids
    /// popped first.
    pub(crate) fn alloc_free_nodes(&mut self, n: usize) {
        let start = self.nodes.len();
        for i in start..start + n {
            self.nodes.push(Node {
                index: NodeId::new(i as u32),
                ..Node::default()
            });
        }
        for i in (start..start + n).rev() {
            self.free.push(NodeId::new(i as u32));
        }
    }
}

pub(crate) struct ConstInfo {
    pub(crate) value_index: u32,
    pub(crate) node: NodeId,
}

pub(crate) struct ValuePool {
    pub(crate) values: Vec<BigRational>,
    pub(crate) free: Vec<u32>,
    pub(crate) lookup: HashMap<BigRational, ConstInfo>,
    /// The rational most recently materialised. Held back by GC so that a
    /// caller still working with it does not thrash the value table.
    pub(crate) freeze: Option<BigRational>,
}

impl ValuePool {
    fn new() -> Self {
        Self {
            values: Vec::new(),
            free: Vec::new(),
            lookup: HashMap::new(),
            freeze: None,
        }
    }
}

pub(crate) struct VarOrder {
    pub(crate) var2level: Vec<u32>,
    pub(crate) level2var: Vec<u32>,
    pub(crate) var2pdd: Vec<NodeId>,
}

pub(crate) struct MarkTable {
    pub(crate) mark: Vec<u32>,
    pub(crate) level: u32,
}

/// Manager for polynomial decision diagrams over the rationals.
///
/// A manager is single-threaded: all operations on it must execute in mutual
/// exclusion, and handles must not cross managers. Independent managers are
/// fully independent.
pub struct PddManager {
    pub(crate) nodes: RefCell<NodeStore>,
    pub(crate) table: RefCell<HashMap<NodeKey, NodeId>>,
    pub(crate) values: RefCell<ValuePool>,
    pub(crate) cache: RefCell<OpCache>,
    pub(crate) order: RefCell<VarOrder>,
    pub(crate) stack: RefCell<Vec<NodeId>>,
    pub(crate) marks: RefCell<MarkTable>,
    max_num_nodes: Cell<usize>,
    disable_gc: Cell<bool>,
    mod2_semantics: Cell<bool>,
}

impl PddManager {
    /// Creates a manager with `num_vars` variables at levels `0..num_vars`.
    ///
    /// Further variables can be added on demand through [`mk_var`][Self::mk_var].
    pub fn new(num_vars: u32) -> Self {
        let m = Self {
            nodes: RefCell::new(NodeStore::new()),
            table: RefCell::new(HashMap::new()),
            values: RefCell::new(ValuePool::new()),
            cache: RefCell::new(OpCache::new()),
            order: RefCell::new(VarOrder {
                var2level: Vec::new(),
                level2var: Vec::new(),
                var2pdd: Vec::new(),
            }),
            stack: RefCell::new(Vec::new()),
            marks: RefCell::new(MarkTable {
                mark: Vec::new(),
                level: 0,
            }),
            max_num_nodes: Cell::new(DEFAULT_MAX_NUM_NODES),
            disable_gc: Cell::new(false),
            mod2_semantics: Cell::new(false),
        };
        m.nodes
            .borrow_mut()
            .alloc_free_nodes(1024 + num_vars as usize);

        // Constants occupy ids 0 and 1.
        let zero = m
            .init_value(BigRational::zero())
            .expect("fresh manager: node pool is preallocated");
        let one = m
            .init_value(BigRational::one())
            .expect("fresh manager: node pool is preallocated");
        debug_assert_eq!(zero, NodeId::ZERO);
        debug_assert_eq!(one, NodeId::ONE);
        m.pin(zero);
        m.pin(one);

        // Sentinel slots for the operator tags, pinned and internal so they
        // never enter the unique table.
        {
            let mut store = m.nodes.borrow_mut();
            for _ in 0..NUM_OPS {
                let id = store
                    .free
                    .pop()
                    .expect("fresh manager: node pool is preallocated");
                store.nodes[id.index()].refcount = MAX_RC;
            }
        }

        if num_vars > 0 {
            m.reserve_var(num_vars - 1)
                .expect("fresh manager: node pool is preallocated");
        }
        m
    }

    // -- configuration --------------------------------------------------

    /// Switches all coefficient arithmetic to GF(2). Must be set before any
    /// polynomial is built.
    pub fn set_mod2_semantics(&self) {
        self.mod2_semantics.set(true);
    }

    pub fn mod2_semantics(&self) -> bool {
        self.mod2_semantics.get()
    }

    /// Sets the hard ceiling on the node pool.
    pub fn set_max_num_nodes(&self, max: usize) {
        self.max_num_nodes.set(max);
    }

    /// Disables the GC trigger in node insertion; out-of-memory then leads
    /// to pool growth only.
    pub fn set_disable_gc(&self, disable: bool) {
        self.disable_gc.set(disable);
    }

    // -- raw node accessors ---------------------------------------------

    pub(crate) fn node(&self, p: NodeId) -> Node {
        self.nodes.borrow().nodes[p.index()]
    }

    pub(crate) fn level(&self, p: NodeId) -> u32 {
        self.node(p).level
    }

    pub(crate) fn lo(&self, p: NodeId) -> NodeId {
        self.node(p).lo
    }

    pub(crate) fn hi(&self, p: NodeId) -> NodeId {
        self.node(p).hi
    }

    pub(crate) fn is_val(&self, p: NodeId) -> bool {
        self.node(p).is_val()
    }

    pub(crate) fn is_zero(&self, p: NodeId) -> bool {
        p == NodeId::ZERO
    }

    pub(crate) fn is_one(&self, p: NodeId) -> bool {
        p == NodeId::ONE
    }

    pub(crate) fn val(&self, p: NodeId) -> BigRational {
        let n = self.node(p);
        self.values.borrow().values[n.value_index() as usize].clone()
    }

    /// The variable bound to the level of decision node `p`.
    pub(crate) fn var(&self, p: NodeId) -> u32 {
        let l = self.level(p);
        debug_assert!(l > 0, "value nodes carry no variable");
        self.order.borrow().level2var[(l - 1) as usize]
    }

    pub(crate) fn var_node(&self, v: u32) -> NodeId {
        self.order.borrow().var2pdd[v as usize]
    }

    fn pin(&self, p: NodeId) {
        self.nodes.borrow_mut().nodes[p.index()].refcount = MAX_RC;
    }

    // -- reference counting ---------------------------------------------

    pub(crate) fn inc_ref(&self, p: NodeId) {
        let mut store = self.nodes.borrow_mut();
        let n = &mut store.nodes[p.index()];
        if n.refcount != MAX_RC {
            n.refcount += 1;
        }
    }

    pub(crate) fn dec_ref(&self, p: NodeId) {
        let mut store = self.nodes.borrow_mut();
        let n = &mut store.nodes[p.index()];
        if n.refcount != MAX_RC {
            debug_assert!(n.refcount > 0, "refcount underflow on {p}");
            n.refcount = n.refcount.saturating_sub(1);
        }
    }

    pub(crate) fn refcount(&self, p: NodeId) -> u32 {
        self.node(p).refcount
    }

    // -- node construction ----------------------------------------------

    /// Sole path for materialising a structural node. Returns the existing
    /// id when an equal node is live, otherwise populates a free slot,
    /// running GC and growing the pool as needed.
    ///
    /// The returned id is unowned: callers must immediately protect it with
    /// a handle or the evaluation stack.
    pub(crate) fn insert_node(&self, n: Node) -> Result<NodeId> {
        let key = n.key();
        if let Some(&id) = self.table.borrow().get(&key) {
            return Ok(id);
        }

        let need_gc = self.nodes.borrow().free.is_empty();
        if need_gc && !self.disable_gc.get() {
            self.gc();
        }
        if self.nodes.borrow().free.is_empty() {
            let len = self.nodes.borrow().len();
            let grow = len / 2;
            if len + grow > self.max_num_nodes.get() {
                debug!("insert_node: pool limit {} reached", self.max_num_nodes.get());
                return Err(Error::MemOut);
            }
            debug!("insert_node: growing pool {} -> {}", len, len + grow);
            self.nodes.borrow_mut().alloc_free_nodes(grow);
        }

        let id = {
            let mut store = self.nodes.borrow_mut();
            let id = match store.free.pop() {
                Some(id) => id,
                None => unreachable!("free list is empty after growth"),
            };
            let slot = &mut store.nodes[id.index()];
            *slot = n;
            slot.index = id;
            slot.refcount = 0;
            slot.internal = false;
            id
        };
        self.table.borrow_mut().insert(key, id);
        Ok(id)
    }

    /// Creates (or finds) the decision node `x_lvl * hi + lo`, enforcing
    /// zero-suppression: `x * 0 + lo` is `lo`.
    pub(crate) fn make_node(&self, lvl: u32, lo: NodeId, hi: NodeId) -> Result<NodeId> {
        if self.is_zero(hi) {
            return Ok(lo);
        }
        debug_assert!(self.is_val(lo) || self.level(lo) < lvl);
        debug_assert!(self.is_val(hi) || self.level(hi) <= lvl);
        self.insert_node(Node::decision(lvl, lo, hi))
    }

    /// Canonicalises a constant: id 0 for zero, id 1 for one, otherwise a
    /// shared value node. In mod-2 mode the rational is reduced modulo 2
    /// first, so only the two constant ids ever materialise.
    pub(crate) fn imk_val(&self, r: BigRational) -> Result<NodeId> {
        if r.is_zero() {
            return Ok(NodeId::ZERO);
        }
        if r.is_one() {
            return Ok(NodeId::ONE);
        }
        if self.mod2_semantics.get() {
            return self.imk_val(mod2_normalize(&r));
        }
        if let Some(info) = self.values.borrow().lookup.get(&r) {
            return Ok(info.node);
        }
        self.init_value(r)
    }

    /// Materialises a fresh rational: claims a value slot, builds the value
    /// node, and records both in the lookup table. The rational becomes the
    /// new freeze value.
    fn init_value(&self, r: BigRational) -> Result<NodeId> {
        let vi = {
            let mut pool = self.values.borrow_mut();
            let vi = match pool.free.pop() {
                Some(vi) => {
                    pool.values[vi as usize] = r.clone();
                    vi
                }
                None => {
                    pool.values.push(r.clone());
                    (pool.values.len() - 1) as u32
                }
            };
            pool.freeze = Some(r.clone());
            vi
        };
        let node = match self.insert_node(Node::value(vi)) {
            Ok(node) => node,
            Err(e) => {
                self.values.borrow_mut().free.push(vi);
                return Err(e);
            }
        };
        self.values.borrow_mut().lookup.insert(
            r,
            ConstInfo {
                value_index: vi,
                node,
            },
        );
        Ok(node)
    }

    // -- variables -------------------------------------------------------

    /// Ensures variables `0..=v` exist. Each variable gets one pinned node
    /// `x_v * 1 + 0` at its level.
    pub(crate) fn reserve_var(&self, v: u32) -> Result<()> {
        loop {
            let next = self.order.borrow().var2level.len() as u32;
            if next > v {
                return Ok(());
            }
            let node = self.make_node(next + 1, NodeId::ZERO, NodeId::ONE)?;
            self.pin(node);
            let mut order = self.order.borrow_mut();
            order.var2level.push(next);
            order.level2var.push(next);
            order.var2pdd.push(node);
        }
    }

    /// The handle for variable `i`, creating it if needed.
    pub fn mk_var(&self, i: u32) -> Result<Pdd<'_>> {
        self.reserve_var(i)?;
        Ok(Pdd::new(self, self.var_node(i)))
    }

    /// The handle for the constant `r`.
    pub fn mk_val(&self, r: BigRational) -> Result<Pdd<'_>> {
        Ok(Pdd::new(self, self.imk_val(r)?))
    }

    /// The zero polynomial.
    pub fn zero(&self) -> Pdd<'_> {
        Pdd::new(self, NodeId::ZERO)
    }

    /// The one polynomial.
    pub fn one(&self) -> Pdd<'_> {
        Pdd::new(self, NodeId::ONE)
    }

    pub fn num_vars(&self) -> u32 {
        self.order.borrow().var2level.len() as u32
    }

    /// Reassigns variables to levels. `level2var` must be a permutation of
    /// the current variables; position `ℓ` names the variable placed at
    /// level `ℓ`. Meant to be called before polynomials are built: existing
    /// diagrams keep their structure and are reinterpreted under the new
    /// names.
    pub fn set_level2var(&self, level2var: &[u32]) -> Result<()> {
        let n = self.order.borrow().level2var.len();
        assert_eq!(level2var.len(), n, "permutation has the wrong length");
        let mut seen = vec![false; n];
        for &v in level2var {
            assert!((v as usize) < n && !seen[v as usize], "not a permutation");
            seen[v as usize] = true;
        }
        debug!("set_level2var({:?})", level2var);
        {
            let mut order = self.order.borrow_mut();
            for (lvl, &v) in level2var.iter().enumerate() {
                order.var2level[v as usize] = lvl as u32;
                order.level2var[lvl] = v;
            }
        }
        // Re-derive the pinned variable nodes; they all exist already, so
        // this is a unique-table lookup.
        for v in 0..n {
            let lvl = self.order.borrow().var2level[v];
            let node = self.make_node(lvl + 1, NodeId::ZERO, NodeId::ONE)?;
            self.pin(node);
            self.order.borrow_mut().var2pdd[v] = node;
        }
        Ok(())
    }

    // -- introspection ---------------------------------------------------

    /// Number of live (non-internal) nodes in the pool.
    pub fn node_count(&self) -> usize {
        self.nodes
            .borrow()
            .nodes
            .iter()
            .filter(|n| !n.internal)
            .count()
    }

    /// Op-cache hit count.
    pub fn cache_hits(&self) -> usize {
        self.cache.borrow().hits()
    }

    /// Op-cache miss count.
    pub fn cache_misses(&self) -> usize {
        self.cache.borrow().misses()
    }

    pub(crate) fn check_manager(&self, p: &Pdd<'_>) {
        assert!(
            std::ptr::eq(self, p.manager()),
            "pdd handle belongs to a different manager"
        );
    }

    /// Checks the store invariants: free slots are internal with a zero
    /// refcount, and every live decision node has a non-zero `hi`, live
    /// children, and strictly (`lo`) / weakly (`hi`) smaller child levels.
    pub fn well_formed(&self) -> bool {
        let store = self.nodes.borrow();
        for &f in &store.free {
            let n = &store.nodes[f.index()];
            if !n.internal || n.refcount != 0 {
                return false;
            }
        }
        for n in &store.nodes {
            if n.internal || n.is_val() {
                continue;
            }
            let lo = &store.nodes[n.lo.index()];
            let hi = &store.nodes[n.hi.index()];
            let ok_lo = !lo.internal && (lo.is_val() || lo.level < n.level);
            let ok_hi = !hi.internal && (hi.is_val() || hi.level <= n.level);
            if !(ok_lo && ok_hi) {
                return false;
            }
        }
        true
    }
}

/// Reduces a rational modulo 2. Only integers occur as mod-2 coefficients.
fn mod2_normalize(r: &BigRational) -> BigRational {
    debug_assert!(r.is_integer(), "mod-2 coefficients must be integers");
    let two = BigInt::from(2);
    BigRational::from_integer(r.to_integer().mod_floor(&two))
}
