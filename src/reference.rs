use std::fmt::{Display, Formatter};

/// An index into the manager's node pool.
///
/// Node ids are plain arena indices: they carry no ownership. A raw id is
/// only guaranteed to stay alive while it is reachable from a
/// [`Pdd`][crate::pdd::Pdd] handle, pinned, or pushed on the manager's
/// evaluation stack.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Id of the constant-zero polynomial.
    pub const ZERO: Self = Self(0);
    /// Id of the constant-one polynomial.
    pub const ONE: Self = Self(1);

    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}
