//! # dirtree
//!
//! A concurrent in-memory directory tree with fine-grained per-node locking.
//!
//! The tree maps slash-delimited lowercase paths (`/a/b/`) to directories and
//! supports `list`, `create`, `remove`, and `move` from any number of threads
//! at once. The interesting part is not the tree, it is the protocol:
//!
//! - Each node carries a writer-preferring reader/writer latch and a subtree
//!   reference count with a quiescence wait ([`latch`]).
//! - Operations reach their target with hand-over-hand descent: interior
//!   nodes are shared-latched and released as soon as the next hop is held,
//!   so disjoint subtrees never contend.
//! - `move` anchors itself with a writer latch at the lowest common ancestor
//!   of its endpoints, which serializes overlapping moves without any global
//!   lock, and waits for the source subtree to drain before rebinding it.
//!
//! ## Example
//!
//! ```rust
//! use dirtree::Tree;
//!
//! let tree = Tree::new();
//! tree.create("/a/").unwrap();
//! tree.create("/b/").unwrap();
//!
//! assert_eq!(tree.list("/").unwrap(), "a,b");
//! ```
//!
//! ## Features
//!
//! - `tracing`: forward operation and descent diagnostics to the `tracing`
//!   crate; compiled out entirely by default.
//! - `shuttle`: build the randomized-schedule protocol tests.

pub mod error;
pub mod latch;
pub mod path;
pub mod tree;

mod children;
mod node;
mod trace;
mod traverse;

pub use error::TreeError;
pub use tree::Tree;
