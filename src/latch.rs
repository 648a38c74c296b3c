//! Filepath: src/latch.rs
//!
//! Per-node synchronization: a writer-preferring reader/writer latch plus a
//! subtree reference count with a quiescence wait.
//!
//! # Concurrency Model
//!
//! Every node carries one [`Latch`]. Two independent facilities share its
//! internal mutex:
//!
//! 1. **Reader/writer latch** over the node's child map. Readers share,
//!    a writer excludes everyone, and a *waiting* writer blocks new readers
//!    (writer preference). When a writer leaves and readers are queued, the
//!    whole batch is admitted at once via a handoff flag, so a stream of
//!    writers cannot starve readers either.
//! 2. **Subtree reference count**: the number of in-flight operations that
//!    have entered the subtree rooted at this node. [`Latch::wait_quiescent`]
//!    blocks until it reaches zero. The count is independent of the latch
//!    mode on purpose: a mover pinning an ancestor must be able to wait for
//!    stragglers while readers elsewhere under that ancestor keep draining.
//!
//! The mutex is only ever held for a few loads and stores; all waiting
//! happens on the three condvars.

use parking_lot::{Condvar, Mutex};


// ============================================================================
//  LatchState
// ============================================================================

/// Counter block guarded by the latch's internal mutex.
#[derive(Default)]
struct LatchState {
    /// Readers currently inside the latch.
    readers_active: u32,

    /// Whether a writer is currently inside. Never more than one.
    writer_active: bool,

    /// Readers blocked in [`Latch::lock_reader`].
    readers_waiting: u32,

    /// Writers blocked in [`Latch::lock_writer`].
    writers_waiting: u32,

    /// Set by a departing writer when it wakes the reader queue; lets the
    /// woken batch pass the writer-preference gate exactly once. Cleared by
    /// the last reader of the batch to get in.
    handoff: bool,

    /// In-flight operations inside the subtree rooted at this node.
    subtree_refs: u32,
}

// ============================================================================
//  Latch
// ============================================================================

/// Writer-preferring reader/writer latch with a subtree refcount.
pub struct Latch {
    state: Mutex<LatchState>,
    readers: Condvar,
    writers: Condvar,
    quiescence: Condvar,
}

impl Latch {
    /// New latch, unlocked and with a zero refcount.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LatchState::default()),
            readers: Condvar::new(),
            writers: Condvar::new(),
            quiescence: Condvar::new(),
        }
    }

    // ------------------------------------------------------------------
    //  Reader side
    // ------------------------------------------------------------------

    /// Acquire in reader mode.
    ///
    /// Blocks while a writer is active or waiting, unless this thread is
    /// part of a handoff batch released by a departing writer.
    pub fn lock_reader(&self) {
        let mut s = self.state.lock();
        while s.writer_active || (s.writers_waiting > 0 && !s.handoff) {
            s.readers_waiting += 1;
            self.readers.wait(&mut s);
            s.readers_waiting -= 1;
        }

        debug_assert!(!s.writer_active);
        s.readers_active += 1;

        // Last reader of a handoff batch closes the gate behind itself.
        if s.readers_waiting == 0 {
            s.handoff = false;
        }
    }

    /// Release reader mode. The last reader out wakes one waiting writer.
    pub fn unlock_reader(&self) {
        let mut s = self.state.lock();

        debug_assert!(s.readers_active > 0);
        debug_assert!(!s.writer_active);
        s.readers_active -= 1;

        if s.readers_active == 0 && s.writers_waiting > 0 {
            self.writers.notify_one();
        }
    }

    // ------------------------------------------------------------------
    //  Writer side
    // ------------------------------------------------------------------

    /// Acquire in writer mode. Blocks while anyone is inside, or while a
    /// reader handoff batch is still being admitted.
    pub fn lock_writer(&self) {
        let mut s = self.state.lock();
        while s.readers_active > 0 || s.writer_active || s.handoff {
            s.writers_waiting += 1;
            self.writers.wait(&mut s);
            s.writers_waiting -= 1;
        }

        debug_assert_eq!(s.readers_active, 0);
        s.writer_active = true;
    }

    /// Release writer mode.
    ///
    /// Queued readers are all woken at once (and marked as a handoff batch);
    /// failing that, one queued writer is woken.
    pub fn unlock_writer(&self) {
        let mut s = self.state.lock();

        debug_assert!(s.writer_active);
        debug_assert_eq!(s.readers_active, 0);
        s.writer_active = false;

        if s.readers_waiting > 0 {
            s.handoff = true;
            self.readers.notify_all();
        } else if s.writers_waiting > 0 {
            self.writers.notify_one();
        }
    }

    // ------------------------------------------------------------------
    //  Subtree refcount
    // ------------------------------------------------------------------

    /// Record an operation entering the subtree rooted at this node.
    pub fn enter_subtree(&self) {
        self.state.lock().subtree_refs += 1;
    }

    /// Record an operation leaving the subtree rooted at this node.
    /// The transition to zero wakes every quiescence waiter.
    pub fn leave_subtree(&self) {
        let mut s = self.state.lock();

        debug_assert!(s.subtree_refs > 0);
        s.subtree_refs -= 1;

        if s.subtree_refs == 0 {
            self.quiescence.notify_all();
        }
    }

    /// Block until no operation holds a reference inside this subtree.
    ///
    /// The caller is expected to have cut off new entrants first (by holding
    /// a writer latch on the subtree's parent); otherwise this can wait
    /// forever.
    pub fn wait_quiescent(&self) {
        let mut s = self.state.lock();
        while s.subtree_refs > 0 {
            self.quiescence.wait(&mut s);
        }
    }

    /// Whether all counters are zero: nothing active, nothing waiting,
    /// nothing inside the subtree. Diagnostic; racy unless the caller has
    /// otherwise quiesced the tree.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        let s = self.state.lock();
        s.readers_active == 0
            && !s.writer_active
            && s.readers_waiting == 0
            && s.writers_waiting == 0
            && s.subtree_refs == 0
    }
}

impl Default for Latch {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Latch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.state.lock();
        f.debug_struct("Latch")
            .field("readers_active", &s.readers_active)
            .field("writer_active", &s.writer_active)
            .field("readers_waiting", &s.readers_waiting)
            .field("writers_waiting", &s.writers_waiting)
            .field("subtree_refs", &s.subtree_refs)
            .finish()
    }
}

// ============================================================================
//  Tests
// ============================================================================
