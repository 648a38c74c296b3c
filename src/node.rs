//! Filepath: src/node.rs
//!
//! A single directory node: latch, child map, parent back-reference.
//!
//! Nodes live behind `Arc`. Ownership runs strictly downward — the `Arc`
//! stored in a parent's child map is what keeps a child alive — while the
//! parent back-reference is a `Weak` that never extends a lifetime. The
//! tree is therefore acyclic for the allocator no matter what `move` does,
//! and teardown is the ordinary drop cascade.
//!
//! The child map itself sits in an `UnsafeCell`: the latch protocol, not
//! the borrow checker, is what serializes access to it. The two accessors
//! below state the exact obligation; every call site carries a `SAFETY:`
//! comment naming the latch hold that satisfies it.

use std::cell::UnsafeCell;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::children::ChildMap;
use crate::latch::Latch;

/// One directory in the tree.
pub(crate) struct Node {
    /// Reader/writer latch and subtree refcount (see [`Latch`]).
    latch: Latch,

    /// Children, keyed by name. Guarded by `latch`, not by the type system.
    children: UnsafeCell<ChildMap>,

    /// The containing node; dangling for the root. Only rebound by `move`,
    /// under writer latches on both the old and the new parent.
    parent: Mutex<Weak<Node>>,
}

// SAFETY: `children` is the only field the auto-traits reject, and it is
// only reached through `children`/`children_mut`, whose contracts require
// the latch: shared access under at least a reader hold, exclusive access
// under a writer hold. The latch makes those holds mutually exclusive
// across threads, which is exactly the guarantee `Sync` asks us to uphold.
unsafe impl Send for Node {}
unsafe impl Sync for Node {}

impl Node {
    /// A parentless node: the root, or a child about to be linked in.
    #[must_use]
    pub(crate) fn new_root() -> Arc<Self> {
        Arc::new(Self {
            latch: Latch::new(),
            children: UnsafeCell::new(ChildMap::new()),
            parent: Mutex::new(Weak::new()),
        })
    }

    /// A fresh empty node whose parent back-reference points at `parent`.
    #[must_use]
    pub(crate) fn new_child(parent: &Arc<Self>) -> Arc<Self> {
        Arc::new(Self {
            latch: Latch::new(),
            children: UnsafeCell::new(ChildMap::new()),
            parent: Mutex::new(Arc::downgrade(parent)),
        })
    }

    /// This node's latch.
    #[inline]
    pub(crate) fn latch(&self) -> &Latch {
        &self.latch
    }

    /// Shared view of the child map.
    ///
    /// # Safety
    ///
    /// The caller must hold this node's latch in reader or writer mode for
    /// the whole lifetime of the returned reference, and must not call
    /// [`Node::children_mut`] while it is live.
    #[inline]
    pub(crate) unsafe fn children(&self) -> &ChildMap {
        // SAFETY: forwarded to the caller's latch-hold obligation.
        unsafe { &*self.children.get() }
    }

    /// Exclusive view of the child map.
    ///
    /// # Safety
    ///
    /// The caller must hold this node's latch in writer mode for the whole
    /// lifetime of the returned reference, and must not create any other
    /// reference into the map (via either accessor) while it is live.
    #[inline]
    #[expect(clippy::mut_from_ref, reason = "exclusivity comes from the writer latch")]
    pub(crate) unsafe fn children_mut(&self) -> &mut ChildMap {
        // SAFETY: forwarded to the caller's latch-hold obligation.
        unsafe { &mut *self.children.get() }
    }

    /// The parent back-reference.
    #[must_use]
    pub(crate) fn parent(&self) -> Weak<Node> {
        self.parent.lock().clone()
    }

    /// Rebind the parent back-reference. Caller must hold writer latches on
    /// both the old and the new parent, as `move` does.
    pub(crate) fn set_parent(&self, parent: Weak<Node>) {
        *self.parent.lock() = parent;
    }
}
