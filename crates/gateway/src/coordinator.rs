//! Single-flight coordination of access-token refresh
//!
//! Holds the "refresh in progress" flag and the ordered queue of
//! continuations waiting for its outcome. The first request to see an expired
//! token becomes the leader and performs the refresh; everyone arriving while
//! it runs is queued and woken with the leader's outcome.
//!
//! State transitions:
//! - Idle → Refreshing (`begin_or_join` with no refresh running, leader lease issued)
//! - Refreshing → Refreshing (`begin_or_join` while running, continuation queued)
//! - Refreshing → Idle (lease settled or dropped: flag reset and queue drained
//!   under one lock, then continuations run in registration order)

use std::sync::{Mutex, MutexGuard, PoisonError};

use common::Secret;
use session::RefreshError;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Result of one refresh: the new access token, or why there is none.
pub type RefreshOutcome = Result<Secret<String>, RefreshError>;

type Continuation = Box<dyn FnOnce(RefreshOutcome) + Send>;

#[derive(Default)]
struct State {
    in_progress: bool,
    waiters: Vec<Continuation>,
}

/// Owner of the refresh flag and waiter queue.
///
/// The mutex is a plain `std` mutex: it is only held to flip the flag or
/// push/take the queue, never across an `.await`.
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<State>,
}

/// What a caller should do after `begin_or_join`.
pub enum Ticket<'a> {
    /// Perform the refresh and settle the lease.
    Leader(RefreshLease<'a>),
    /// Wait for the leader's outcome.
    Follower(Waiter),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Become the refresh leader, or queue behind the refresh in flight.
    pub fn begin_or_join(&self) -> Ticket<'_> {
        let mut state = self.lock();
        if state.in_progress {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(Box::new(move |outcome| {
                // Receiver gone means the waiting request was cancelled
                let _ = tx.send(outcome);
            }));
            debug!(queued = state.waiters.len(), "refresh in flight, request queued");
            Ticket::Follower(Waiter { rx })
        } else {
            state.in_progress = true;
            debug!("starting token refresh");
            Ticket::Leader(RefreshLease {
                coordinator: self,
                settled: false,
            })
        }
    }

    /// Queue a raw continuation for the next settle.
    ///
    /// Continuations run in the order they were registered, once each.
    pub fn subscribe(&self, continuation: impl FnOnce(RefreshOutcome) + Send + 'static) {
        self.lock().waiters.push(Box::new(continuation));
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().in_progress
    }

    /// Number of continuations waiting on the current refresh.
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Reset the flag and drain the queue atomically, then run the drained
    /// continuations outside the lock. Returns how many were woken.
    fn release(&self, outcome: RefreshOutcome) -> usize {
        let waiters = {
            let mut state = self.lock();
            state.in_progress = false;
            std::mem::take(&mut state.waiters)
        };
        let woken = waiters.len();
        for continuation in waiters {
            continuation(outcome.clone());
        }
        woken
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking continuation never runs under the lock, so the state
        // is consistent even if poisoned
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of refresh leadership. Must be settled exactly once.
///
/// Dropping an unsettled lease (the leading request was cancelled) releases
/// every waiter with `RefreshError::Abandoned` so nobody waits forever.
pub struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshLease<'_> {
    /// Publish the refresh outcome to every queued request.
    pub fn settle(mut self, outcome: RefreshOutcome) -> usize {
        self.settled = true;
        let woken = self.coordinator.release(outcome);
        debug!(woken, "token refresh settled");
        woken
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let woken = self.coordinator.release(Err(RefreshError::Abandoned));
            warn!(woken, "refresh leader dropped before settling, waiters released");
        }
    }
}

/// A queued request's handle on the in-flight refresh.
pub struct Waiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl Waiter {
    pub async fn wait(self) -> RefreshOutcome {
        self.rx.await.unwrap_or(Err(RefreshError::Abandoned))
    }
}
