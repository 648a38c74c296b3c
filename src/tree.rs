//! Filepath: src/tree.rs
//!
//! The tree and its four structural operations.
//!
//! This module composes the path utilities, the per-node latch, and the
//! descent engine into `list` / `create` / `remove` / `move_dir`. The
//! concurrency story, in one paragraph: every operation descends with
//! hand-over-hand latching, holding refcounts along its whole path;
//! mutators take a writer latch only on the parent whose child map they
//! touch; `move_dir` first takes a writer latch at the lowest common
//! ancestor of its endpoints, which serializes any two moves whose write
//! sets could overlap, then waits for the source subtree to drain before
//! rebinding it. Latches are always acquired top-down, so the acquisition
//! order is consistent with the tree's partial order and no cycle of waits
//! can form.
//!
//! # Example
//!
//! ```rust
//! use dirtree::{Tree, TreeError};
//!
//! let tree = Tree::new();
//! tree.create("/a/")?;
//! tree.create("/a/x/")?;
//! tree.create("/b/")?;
//!
//! tree.move_dir("/a/x/", "/b/x/")?;
//!
//! assert_eq!(tree.list("/a/")?, "");
//! assert_eq!(tree.list("/b/")?, "x");
//! # Ok::<(), TreeError>(())
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::TreeError;
use crate::node::Node;
use crate::path::{DirPath, MAX_NAME_LEN};
use crate::trace::debug_log;
use crate::traverse::{Mode, descend};

// ============================================================================
//  Tree
// ============================================================================

/// A concurrent in-memory directory tree.
///
/// All operations take `&self` and may be called from any number of threads
/// at once; independent subtrees proceed in parallel. Each operation is
/// linearizable: it takes effect atomically at some point between invocation
/// and return.
///
/// Teardown is `Drop`. Dropping the `Tree` requires owning it, which in turn
/// means no thread still borrows it — the "no operations in flight" teardown
/// precondition is enforced by ownership rather than by convention.
pub struct Tree {
    root: Arc<Node>,
}

impl Tree {
    /// An empty tree: the root directory exists and has no children.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::new_root(),
        }
    }

    // ------------------------------------------------------------------
    //  list
    // ------------------------------------------------------------------

    /// List the children of the directory at `path`: names sorted ascending
    /// by byte value, joined by `,`, empty string for an empty directory.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidArgument`] for a malformed path,
    /// [`TreeError::NotFound`] when the directory does not exist.
    pub fn list(&self, path: &str) -> Result<String, TreeError> {
        let path = DirPath::parse(path)?;

        let Some(mut descent) = descend(&self.root, path, Mode::Reader, false) else {
            return Err(TreeError::NotFound);
        };

        // SAFETY: the descent holds the target's latch in reader mode.
        let listing = unsafe { descent.target().children() }.list_string();

        // The latch has done its job; the refcount chain unwinds on drop.
        descent.unlock_target();
        Ok(listing)
    }

    // ------------------------------------------------------------------
    //  create
    // ------------------------------------------------------------------

    /// Create an empty directory at `path`.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidArgument`] for a malformed path,
    /// [`TreeError::Exists`] when `path` is the root or already present,
    /// [`TreeError::NotFound`] when the parent directory does not exist.
    pub fn create(&self, path: &str) -> Result<(), TreeError> {
        let path = DirPath::parse(path)?;
        let Some((parent_path, name)) = path.split_last() else {
            // The root always exists.
            return Err(TreeError::Exists);
        };

        let Some(descent) = descend(&self.root, parent_path, Mode::Writer, false) else {
            return Err(TreeError::NotFound);
        };
        let parent = descent.target();

        // SAFETY: the descent holds the parent's latch in writer mode, and
        // this is the only reference into its map.
        let children = unsafe { parent.children_mut() };
        if children.contains(name) {
            return Err(TreeError::Exists);
        }

        let inserted = children.insert(name, Node::new_child(parent));
        debug_assert!(inserted);
        debug_log!(path = path.as_str(), "created directory");
        Ok(())
    }

    // ------------------------------------------------------------------
    //  remove
    // ------------------------------------------------------------------

    /// Remove the empty directory at `path`.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidArgument`] for a malformed path,
    /// [`TreeError::Busy`] for the root,
    /// [`TreeError::NotFound`] when the directory does not exist,
    /// [`TreeError::NotEmpty`] when it still has children.
    pub fn remove(&self, path: &str) -> Result<(), TreeError> {
        let path = DirPath::parse(path)?;
        let Some((parent_path, name)) = path.split_last() else {
            return Err(TreeError::Busy);
        };

        let Some(descent) = descend(&self.root, parent_path, Mode::Writer, false) else {
            return Err(TreeError::NotFound);
        };
        let parent = descent.target();

        // SAFETY: the descent holds the parent's latch in writer mode.
        let child = match unsafe { parent.children() }.get(name) {
            Some(child) => Arc::clone(child),
            None => return Err(TreeError::NotFound),
        };

        // The parent's writer latch keeps new operations away from the
        // child; the child's own writer latch waits out anyone already at
        // it.
        child.latch().lock_writer();

        // SAFETY: the child's latch is held in writer mode.
        let empty = unsafe { child.children() }.is_empty();
        if !empty {
            child.latch().unlock_writer();
            return Err(TreeError::NotEmpty);
        }

        // SAFETY: writer latch on the parent; the shared view above ended.
        let removed = unsafe { parent.children_mut() }.remove(name);
        debug_assert!(removed.is_some());

        child.latch().unlock_writer();
        debug_log!(path = path.as_str(), "removed directory");
        Ok(())
        // The unlinked node's storage is released by the Arc cascade once
        // the last straggling unwind drops its clone.
    }

    // ------------------------------------------------------------------
    //  move
    // ------------------------------------------------------------------

    /// Move the directory at `source` (with its whole subtree) to `target`.
    ///
    /// Moving a path onto itself succeeds and changes nothing.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidArgument`] for a malformed path or a target
    /// inside the source subtree,
    /// [`TreeError::Busy`] when the source is the root,
    /// [`TreeError::Exists`] when the target is the root or already present,
    /// [`TreeError::NotFound`] when the source, its parent, or the target's
    /// parent does not exist.
    pub fn move_dir(&self, source: &str, target: &str) -> Result<(), TreeError> {
        let source = DirPath::parse(source)?;
        let target = DirPath::parse(target)?;

        let Some((source_parent_path, source_name)) = source.split_last() else {
            return Err(TreeError::Busy);
        };
        let Some((target_parent_path, target_name)) = target.split_last() else {
            // The root always exists.
            return Err(TreeError::Exists);
        };
        if source != target && source.is_ancestor_of(target) {
            return Err(TreeError::InvalidArgument);
        }

        // Writer-latch the lowest common ancestor of the two parents and
        // pin it for the whole operation. For distinct endpoints this is
        // exactly the LCA of the endpoints themselves (their paths diverge
        // before either ends); for the self-move it is the shared parent,
        // which keeps the descents below well-defined. Any two moves whose
        // write sets could overlap share an ancestor at or above one of
        // their anchors, so the higher anchor serializes them.
        let lca = source_parent_path.lca(target_parent_path);
        let Some(anchor) = descend(&self.root, lca, Mode::Writer, false) else {
            return Err(TreeError::NotFound);
        };
        let lca_node = anchor.target();

        // Descend from the anchor to each endpoint's parent. The anchor is
        // the parents' longest shared prefix, so the two relative walks
        // either diverge at their first component or one of them is empty —
        // they never contend below the anchor.
        let same_parent = source_parent_path == target_parent_path;
        let source_rel = source_parent_path.strip_prefix(lca);
        let target_rel = target_parent_path.strip_prefix(lca);

        let Some(source_side) = descend(lca_node, source_rel, Mode::Writer, true) else {
            return Err(TreeError::NotFound);
        };
        let target_side = if same_parent {
            None
        } else {
            match descend(lca_node, target_rel, Mode::Writer, true) {
                Some(d) => Some(d),
                None => return Err(TreeError::NotFound),
            }
        };

        let source_parent = source_side.target();
        let target_parent = target_side.as_ref().map_or(source_parent, |d| d.target());

        // SAFETY: the source parent's latch is held in writer mode — by its
        // own descent, or by the anchor when the parent is the LCA itself.
        let source_node = match unsafe { source_parent.children() }.get(source_name) {
            Some(node) => Arc::clone(node),
            None => return Err(TreeError::NotFound),
        };

        // SAFETY: as above, for the target parent.
        if unsafe { target_parent.children() }.contains(target_name) {
            if source == target {
                return Ok(());
            }
            debug_assert!(!source.is_ancestor_of(target));
            return Err(TreeError::Exists);
        }

        // No new operation can enter the source subtree now that its parent
        // is writer-latched; wait for the ones already inside to drain.
        // Readers elsewhere under the anchor keep draining freely because
        // refcounts are independent of latch mode.
        source_node.latch().wait_quiescent();

        debug_log!(
            source = source.as_str(),
            target = target.as_str(),
            "moving subtree"
        );

        {
            // SAFETY: writer latch on the source parent, sole map reference.
            let removed = unsafe { source_parent.children_mut() }.remove(source_name);
            debug_assert!(removed.is_some());
        }
        source_node.set_parent(Arc::downgrade(target_parent));
        {
            // SAFETY: writer latch on the target parent, sole map reference.
            let inserted =
                unsafe { target_parent.children_mut() }.insert(target_name, source_node);
            debug_assert!(inserted);
        }

        Ok(())
        // Guards drop in reverse declaration order — target side, source
        // side, anchor — releasing latches and refcounts bottom-up.
    }

    // ------------------------------------------------------------------
    //  Verification
    // ------------------------------------------------------------------

    /// Walk the whole tree and check its structural invariants, returning
    /// the node count (root included).
    ///
    /// Taking `&mut self` makes the quiescence requirement compile-checked:
    /// no other thread can be inside an operation while this runs.
    ///
    /// # Panics
    ///
    /// Panics if any invariant is violated: a node reachable twice (shared
    /// or cyclic structure), a parent back-reference that disagrees with
    /// the child map, an invalid child name, or latch counters that are not
    /// all zero on an idle tree.
    pub fn verify_structure(&mut self) -> usize {
        fn walk(node: &Arc<Node>, seen: &mut HashSet<*const Node>) -> usize {
            assert!(
                seen.insert(Arc::as_ptr(node)),
                "node reachable by more than one path"
            );
            assert!(
                node.latch().is_idle(),
                "latch counters nonzero on an idle tree"
            );

            // SAFETY: `&mut Tree` gives this walk exclusive access to every
            // node; no latch is needed.
            let children = unsafe { node.children() };

            let mut count: usize = 1;
            for (name, child) in children.iter() {
                assert!(
                    !name.is_empty()
                        && name.len() <= MAX_NAME_LEN
                        && name.bytes().all(|b| b.is_ascii_lowercase()),
                    "invalid child name {name:?}"
                );

                let parent = child
                    .parent()
                    .upgrade()
                    .unwrap_or_else(|| panic!("child {name:?} has a dangling parent"));
                assert!(
                    Arc::ptr_eq(&parent, node),
                    "child {name:?} disagrees about its parent"
                );

                count += walk(child, seen);
            }
            count
        }

        let mut seen = HashSet::new();
        walk(&self.root, &mut seen)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
//  Tests
// ============================================================================
