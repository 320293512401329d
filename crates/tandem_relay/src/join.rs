//! Two-way completion join for the branches of one run.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Progress of a run's two branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    /// Neither branch has terminated
    BothPending,
    /// Exactly one branch has terminated
    OneDone,
    /// Both branches have terminated
    BothDone,
}

/// Race-free join over two branches.
///
/// Each branch slot can be marked done at most once; repeated marks are
/// ignored. Among all `mark_done` calls, exactly one returns
/// [`JoinState::BothDone`].
///
/// # Examples
///
/// ```
/// use tandem_relay::{BranchJoin, JoinState};
///
/// let join = BranchJoin::new();
/// assert_eq!(join.mark_done(0), JoinState::OneDone);
/// assert_eq!(join.mark_done(0), JoinState::OneDone);
/// assert_eq!(join.mark_done(1), JoinState::BothDone);
/// ```
#[derive(Debug, Default)]
pub struct BranchJoin {
    done: [AtomicBool; 2],
    completed: AtomicU8,
}

impl BranchJoin {
    /// Both branches pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark branch `slot` (0 or 1) as terminated and report the join state.
    ///
    /// Repeated marks and slots outside 0..2 change nothing and never return
    /// [`JoinState::BothDone`], even after both branches finished; use
    /// [`BranchJoin::state`] to observe the settled state.
    pub fn mark_done(&self, slot: usize) -> JoinState {
        let Some(flag) = self.done.get(slot) else {
            return self.state_below_done();
        };
        if flag.swap(true, Ordering::AcqRel) {
            return self.state_below_done();
        }
        match self.completed.fetch_add(1, Ordering::AcqRel) + 1 {
            1 => JoinState::OneDone,
            _ => JoinState::BothDone,
        }
    }

    /// Current state without marking anything.
    pub fn state(&self) -> JoinState {
        match self.completed.load(Ordering::Acquire) {
            0 => JoinState::BothPending,
            1 => JoinState::OneDone,
            _ => JoinState::BothDone,
        }
    }

    fn state_below_done(&self) -> JoinState {
        match self.state() {
            JoinState::BothPending => JoinState::BothPending,
            _ => JoinState::OneDone,
        }
    }
}
