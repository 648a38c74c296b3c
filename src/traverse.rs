//! Filepath: src/traverse.rs
//!
//! Hand-over-hand descent from a node to a path target.
//!
//! A descent walks a relative path component by component. Interior nodes
//! are taken in reader mode, so sibling subtrees stay fully concurrent; only
//! the final node is taken in the caller's requested mode. Each node's
//! subtree refcount is bumped as the descent enters it, and the predecessor's
//! latch is dropped as soon as the successor's is held — at most two latches
//! per thread at any instant.
//!
//! Latch release and refcount release are deliberately split. The latch on
//! the target is freed when the [`Descent`] drops (or earlier, on demand);
//! the refcounts along the whole chain are also freed by the drop, in
//! reverse order. Keeping refcounts alive for the full operation is what
//! gives `move` a meaningful quiescence wait, and routing both through one
//! guard means no error path can forget either half.

use std::sync::Arc;

use crate::node::Node;
use crate::path::DirPath;
use crate::trace::trace_log;

// ============================================================================
//  Mode
// ============================================================================

/// Latch mode requested for the final node of a descent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Shared hold: `list` and interior hops.
    Reader,

    /// Exclusive hold: the node whose child map will be mutated.
    Writer,
}

fn lock(node: &Node, mode: Mode) {
    match mode {
        Mode::Reader => node.latch().lock_reader(),

        Mode::Writer => node.latch().lock_writer(),
    }
}

fn unlock(node: &Node, mode: Mode) {
    match mode {
        Mode::Reader => node.latch().unlock_reader(),

        Mode::Writer => node.latch().unlock_writer(),
    }
}

// ============================================================================
//  Descent
// ============================================================================

/// A completed descent: the target node, still latched in the requested
/// mode, plus the chain of subtree refcounts the walk acquired.
///
/// Dropping the guard releases the target's latch (unless already released
/// via [`Descent::unlock_target`]) and then walks the chain bottom-up,
/// releasing one refcount per node.
pub(crate) struct Descent {
    /// Nodes whose refcount this descent bumped, shallowest first.
    /// Excludes the start node when the caller already held it.
    entered: Vec<Arc<Node>>,

    /// The node the descent stopped at.
    target: Arc<Node>,

    /// Mode the target is held in, when `locked`.
    mode: Mode,

    /// Whether this guard still owns the target's latch. False when the
    /// caller released early, and for an empty descent onto a node whose
    /// latch belongs to an enclosing guard.
    locked: bool,
}

impl Descent {
    /// The node this descent reached.
    #[inline]
    pub(crate) fn target(&self) -> &Arc<Node> {
        &self.target
    }

    /// Release the target's latch now, keeping the refcount chain. The
    /// remaining unwind still happens on drop.
    pub(crate) fn unlock_target(&mut self) {
        if self.locked {
            unlock(&self.target, self.mode);
            self.locked = false;
        }
    }
}

impl Drop for Descent {
    fn drop(&mut self) {
        if self.locked {
            unlock(&self.target, self.mode);
            self.locked = false;
        }
        for node in self.entered.iter().rev() {
            node.latch().leave_subtree();
        }
    }
}

// ============================================================================
//  descend
// ============================================================================

/// Walk `rel` downward from `start`, leaving the final node latched in
/// `mode` and every visited node's subtree refcount bumped.
///
/// `start_held` marks a descent out of a node an enclosing guard already
/// holds exclusively (the pinned LCA of a `move`): the start's latch is not
/// retaken and its refcount is not re-entered — both belong to the outer
/// descent. With `start_held` the returned guard covers only the nodes
/// below `start`.
///
/// Returns `None`, with every acquired latch and refcount released, when a
/// component of `rel` does not exist — the *not-found* outcome.
pub(crate) fn descend(
    start: &Arc<Node>,
    rel: DirPath<'_>,
    mode: Mode,
    start_held: bool,
) -> Option<Descent> {
    let mut entered: Vec<Arc<Node>> = Vec::with_capacity(rel.depth() + 1);

    if rel.is_root() {
        // Descent onto the start node itself.
        if !start_held {
            lock(start, mode);
            start.latch().enter_subtree();
            entered.push(Arc::clone(start));
        }
        return Some(Descent {
            entered,
            target: Arc::clone(start),
            mode,
            locked: !start_held,
        });
    }

    // The start is an interior node of this walk: reader mode, unless the
    // caller's exclusive hold stands in for it.
    if !start_held {
        start.latch().lock_reader();
        start.latch().enter_subtree();
        entered.push(Arc::clone(start));
    }

    let mut current: Arc<Node> = Arc::clone(start);
    let mut current_mode: Option<Mode> = (!start_held).then_some(Mode::Reader);

    let mut components = rel.components().peekable();
    while let Some(name) = components.next() {
        let is_last = components.peek().is_none();

        // SAFETY: `current`'s latch is held — by this walk (`current_mode`)
        // or, for a held start, by the enclosing guard.
        let child = unsafe { current.children() }.get(name).map(Arc::clone);

        let Some(child) = child else {
            trace_log!(component = name, "descent: component missing");
            if let Some(held) = current_mode {
                unlock(&current, held);
            }
            for node in entered.iter().rev() {
                node.latch().leave_subtree();
            }
            return None;
        };

        let child_mode = if is_last { mode } else { Mode::Reader };
        lock(&child, child_mode);
        child.latch().enter_subtree();
        entered.push(Arc::clone(&child));

        // Hand over: the predecessor's latch has done its job.
        if let Some(held) = current_mode {
            unlock(&current, held);
        }
        current = child;
        current_mode = Some(child_mode);
    }

    Some(Descent {
        entered,
        target: current,
        mode,
        locked: true,
    })
}

// ============================================================================
//  Tests
// ============================================================================
