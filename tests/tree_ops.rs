//! Sequential operation scenarios.
//!
//! Single-threaded, exact-output tests for the four operations: the happy
//! paths, every error variant, and the structural edge cases `move` has to
//! get right (shared parents, parents that coincide with the lowest common
//! ancestor, renames in place).

#![expect(clippy::unwrap_used, reason = "fail fast in tests")]

mod common;

use dirtree::{Tree, TreeError};

// =============================================================================
//  Listing
// =============================================================================

#[test]
fn list_empty_root() {
    common::init_tracing();
    let tree = Tree::new();
    assert_eq!(tree.list("/").unwrap(), "");
}

#[test]
fn list_is_sorted_and_comma_joined() {
    let tree = Tree::new();
    for name in ["delta", "alpha", "charlie", "bravo"] {
        tree.create(&format!("/{name}/")).unwrap();
    }

    assert_eq!(tree.list("/").unwrap(), "alpha,bravo,charlie,delta");
}

#[test]
fn list_missing_directory() {
    let tree = Tree::new();
    assert_eq!(tree.list("/nope/"), Err(TreeError::NotFound));

    tree.create("/a/").unwrap();
    assert_eq!(tree.list("/a/b/"), Err(TreeError::NotFound));
}

#[test]
fn list_rejects_malformed_paths() {
    let tree = Tree::new();
    for raw in ["a/", "/A/", "/a//b/", "", "/a", "a"] {
        assert_eq!(tree.list(raw), Err(TreeError::InvalidArgument), "{raw:?}");
    }
}

// =============================================================================
//  Creation
// =============================================================================

#[test]
fn create_then_list_parent() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();
    tree.create("/b/").unwrap();

    assert_eq!(tree.list("/").unwrap(), "a,b");
}

#[test]
fn create_nested_chain() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();
    tree.create("/a/b/").unwrap();
    tree.create("/a/b/c/").unwrap();

    assert_eq!(tree.list("/a/b/").unwrap(), "c");
    assert_eq!(tree.list("/a/b/c/").unwrap(), "");
}

#[test]
fn create_existing_fails() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();

    assert_eq!(tree.create("/a/"), Err(TreeError::Exists));
    assert_eq!(tree.create("/"), Err(TreeError::Exists));
}

#[test]
fn create_without_parent_fails() {
    let tree = Tree::new();
    assert_eq!(tree.create("/a/b/c/"), Err(TreeError::NotFound));
    assert_eq!(tree.create(""), Err(TreeError::InvalidArgument));
}

// =============================================================================
//  Removal
// =============================================================================

#[test]
fn remove_refuses_nonempty() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();
    tree.create("/a/b/").unwrap();

    assert_eq!(tree.remove("/a/"), Err(TreeError::NotEmpty));
    assert_eq!(tree.list("/a/").unwrap(), "b");
}

#[test]
fn remove_leaf_then_parent() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();
    tree.create("/a/b/").unwrap();

    tree.remove("/a/b/").unwrap();
    tree.remove("/a/").unwrap();
    assert_eq!(tree.list("/").unwrap(), "");
}

#[test]
fn remove_missing_or_root() {
    let tree = Tree::new();
    assert_eq!(tree.remove("/a/"), Err(TreeError::NotFound));
    assert_eq!(tree.remove("/a/b/"), Err(TreeError::NotFound));
    assert_eq!(tree.remove("/"), Err(TreeError::Busy));
    assert_eq!(tree.remove("//"), Err(TreeError::InvalidArgument));
}

#[test]
fn removed_name_is_reusable() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();
    tree.remove("/a/").unwrap();
    tree.create("/a/").unwrap();

    assert_eq!(tree.list("/").unwrap(), "a");
}

// =============================================================================
//  Moves
// =============================================================================

#[test]
fn move_across_subtrees() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();
    tree.create("/b/").unwrap();
    tree.create("/a/x/").unwrap();

    tree.move_dir("/a/x/", "/b/x/").unwrap();

    assert_eq!(tree.list("/a/").unwrap(), "");
    assert_eq!(tree.list("/b/").unwrap(), "x");
}

#[test]
fn move_carries_whole_subtree() {
    let tree = Tree::new();
    for path in ["/a/", "/a/x/", "/a/x/one/", "/a/x/two/", "/b/"] {
        tree.create(path).unwrap();
    }

    tree.move_dir("/a/x/", "/b/y/").unwrap();

    assert_eq!(tree.list("/b/y/").unwrap(), "one,two");
    assert_eq!(tree.list("/b/y/one/").unwrap(), "");
}

#[test]
fn move_rename_within_parent() {
    // Source and target share a parent, which is also the LCA.
    let tree = Tree::new();
    tree.create("/dir/").unwrap();
    tree.create("/dir/old/").unwrap();

    tree.move_dir("/dir/old/", "/dir/new/").unwrap();
    assert_eq!(tree.list("/dir/").unwrap(), "new");
}

#[test]
fn move_when_one_parent_is_the_lca() {
    // Source parent sits strictly below the LCA, target parent *is* it.
    let tree = Tree::new();
    for path in ["/top/", "/top/deep/", "/top/deep/item/"] {
        tree.create(path).unwrap();
    }

    tree.move_dir("/top/deep/item/", "/top/item/").unwrap();
    assert_eq!(tree.list("/top/").unwrap(), "deep,item");
    assert_eq!(tree.list("/top/deep/").unwrap(), "");
}

#[test]
fn move_into_descendant_rejected() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();
    tree.create("/a/b/").unwrap();

    assert_eq!(
        tree.move_dir("/a/", "/a/b/c/"),
        Err(TreeError::InvalidArgument)
    );
    assert_eq!(tree.list("/a/").unwrap(), "b");
}

#[test]
fn move_onto_itself_is_ok() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();

    assert_eq!(tree.move_dir("/a/", "/a/"), Ok(()));
    assert_eq!(tree.list("/").unwrap(), "a");
}

#[test]
fn move_onto_itself_requires_existence() {
    let tree = Tree::new();
    assert_eq!(tree.move_dir("/a/", "/a/"), Err(TreeError::NotFound));
}

#[test]
fn move_to_occupied_target_fails() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();
    tree.create("/b/").unwrap();

    assert_eq!(tree.move_dir("/a/", "/b/"), Err(TreeError::Exists));
}

#[test]
fn move_missing_pieces() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();

    // Source missing.
    assert_eq!(tree.move_dir("/ghost/", "/a/g/"), Err(TreeError::NotFound));
    // Target parent missing.
    assert_eq!(tree.move_dir("/a/", "/nowhere/a/"), Err(TreeError::NotFound));
    // Source parent missing.
    assert_eq!(tree.move_dir("/x/y/", "/a/y/"), Err(TreeError::NotFound));
}

#[test]
fn move_root_cases() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();

    assert_eq!(tree.move_dir("/", "/a/r/"), Err(TreeError::Busy));
    assert_eq!(tree.move_dir("/a/", "/"), Err(TreeError::Exists));
}

#[test]
fn move_rejects_malformed_paths() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();

    assert_eq!(tree.move_dir("a/", "/b/"), Err(TreeError::InvalidArgument));
    assert_eq!(tree.move_dir("/a/", "b"), Err(TreeError::InvalidArgument));
}

#[test]
fn move_back_restores_layout() {
    let tree = Tree::new();
    for path in ["/a/", "/a/x/", "/a/x/kid/", "/b/"] {
        tree.create(path).unwrap();
    }

    tree.move_dir("/a/x/", "/b/x/").unwrap();
    tree.move_dir("/b/x/", "/a/x/").unwrap();

    assert_eq!(tree.list("/a/").unwrap(), "x");
    assert_eq!(tree.list("/a/x/").unwrap(), "kid");
    assert_eq!(tree.list("/b/").unwrap(), "");
}
