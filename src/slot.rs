//! # Resettable single-assignment slot.
//!
//! [`Slot<T>`] is a one-shot container plus barrier: one producer wins a
//! compare-and-swap transition out of `Running` and delivers exactly one
//! outcome (value, failure, or cancellation); any number of consumers await
//! the same terminal outcome. Unlike a conventional one-shot future, the
//! owner may [`reset`](Slot::reset) a terminal slot back to `Running` so the
//! same logical slot can be reused across repeated open/close cycles.
//!
//! ## State machine
//! ```text
//!              complete / fail          cancel(false) / cancel(true)
//! Running ──► Completing ──► Completed        Cancelled / Interrupted
//!    ▲                            │                     │
//!    └────────────── reset ◄──────┴─────────────────────┘
//! ```
//!
//! ## Rules
//! - At most one producer wins the transition out of `Running`; a losing
//!   `complete`/`fail`/`cancel` is a silent no-op returning `false`.
//! - `wait()` parks until a terminal state; all waiters observe the same
//!   outcome. `wait_timeout()` leaves the slot `Running` on expiry, so a
//!   later completion is still observable by a fresh wait.
//! - `reset()` is only valid when no producer is mid-`Completing` and the
//!   owner has drained all waiters (the orchestrator enforces this by
//!   resetting only slots it has closed the hardware behind).

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time;

use crate::error::SlotError;

const RUNNING: u8 = 0;
const COMPLETING: u8 = 1;
const COMPLETED: u8 = 2;
const CANCELLED: u8 = 3;
const INTERRUPTED: u8 = 4;

/// Observable state of a [`Slot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No terminal assignment yet; waiters park.
    Running,
    /// A producer won the transition and is storing the outcome.
    Completing,
    /// A value or failure was stored.
    Completed,
    /// Cancelled without interrupting the producer.
    Cancelled,
    /// Cancelled with interrupt intent.
    Interrupted,
}

impl SlotState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            RUNNING => SlotState::Running,
            COMPLETING => SlotState::Completing,
            COMPLETED => SlotState::Completed,
            CANCELLED => SlotState::Cancelled,
            _ => SlotState::Interrupted,
        }
    }
}

enum Outcome<T> {
    Value(T),
    Failure(Arc<str>),
}

/// Resettable, cancellable single-assignment future.
///
/// `T: Clone` is required for consuming operations so that N concurrent
/// waiters can each receive the value; handle types stored in slots are cheap
/// `Arc`-backed clones.
pub struct Slot<T> {
    /// Stable name for logs and debugging.
    name: &'static str,
    state: AtomicU8,
    /// Guarded outcome cell; the lock is held only for store/clone, never
    /// across an await point.
    outcome: Mutex<Option<Outcome<T>>>,
    notify: Notify,
}

impl<T> Slot<T> {
    /// Creates a new slot in the `Running` state.
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            state: AtomicU8::new(RUNNING),
            outcome: Mutex::new(None),
            notify: Notify::new(),
        }
    }

    /// Returns the slot's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the current state (non-blocking).
    pub fn state(&self) -> SlotState {
        SlotState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// True once a terminal assignment happened (value, failure, or cancel).
    pub fn is_done(&self) -> bool {
        matches!(
            self.state(),
            SlotState::Completed | SlotState::Cancelled | SlotState::Interrupted
        )
    }

    /// True if the slot was cancelled or interrupted.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.state(), SlotState::Cancelled | SlotState::Interrupted)
    }

    /// Stores a value and wakes all waiters.
    ///
    /// Returns `false` (no-op, not an error) if the slot already left
    /// `Running`; the stored outcome is never overwritten.
    pub fn complete(&self, value: T) -> bool {
        self.finish(Some(Outcome::Value(value)), COMPLETED)
    }

    /// Stores a failure cause; waiters observe [`SlotError::Failed`].
    pub fn fail(&self, cause: impl Into<Arc<str>>) -> bool {
        self.finish(Some(Outcome::Failure(cause.into())), COMPLETED)
    }

    /// Cancels the slot; waiters observe [`SlotError::Cancelled`].
    ///
    /// `interrupt` selects the `Interrupted` terminal state, which is
    /// distinguishable via [`state`](Slot::state) but surfaces to waiters as
    /// the same cancellation failure.
    pub fn cancel(&self, interrupt: bool) -> bool {
        let terminal = if interrupt { INTERRUPTED } else { CANCELLED };
        self.finish(None, terminal)
    }

    /// Forces the slot back to `Running` and clears any stored outcome.
    ///
    /// If a producer is mid-`Completing`, waits it out first (the completion
    /// window is a store plus a state publish). The owner must guarantee no
    /// stale waiters remain.
    pub fn reset(&self) {
        while self.state.load(Ordering::Acquire) == COMPLETING {
            std::hint::spin_loop();
        }
        *self.lock_outcome() = None;
        self.state.store(RUNNING, Ordering::Release);
    }

    /// Single CAS-guarded transition out of `Running`.
    fn finish(&self, outcome: Option<Outcome<T>>, terminal: u8) -> bool {
        if self
            .state
            .compare_exchange(RUNNING, COMPLETING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        if let Some(out) = outcome {
            *self.lock_outcome() = Some(out);
        }
        self.state.store(terminal, Ordering::Release);
        self.notify.notify_waiters();
        true
    }

    fn lock_outcome(&self) -> std::sync::MutexGuard<'_, Option<Outcome<T>>> {
        // Poisoning cannot leave the cell inconsistent: writers store a whole
        // Option in one step.
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Slot<T> {
    /// Waits until the slot reaches a terminal state.
    ///
    /// Returns the stored value on completion, [`SlotError::Failed`] if the
    /// producer recorded a failure, or [`SlotError::Cancelled`] if the slot
    /// was cancelled/interrupted. Safe to call from any number of tasks.
    pub async fn wait(&self) -> Result<T, SlotError> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register as a waiter before re-checking state so a concurrent
            // notify_waiters() cannot slip between the check and the await.
            notified.as_mut().enable();
            if let Some(outcome) = self.try_outcome() {
                return outcome;
            }
            notified.await;
        }
    }

    /// As [`wait`](Slot::wait), but fails with [`SlotError::Timeout`] if the
    /// deadline elapses first. The slot stays `Running` and may still
    /// complete later.
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<T, SlotError> {
        match time::timeout(timeout, self.wait()).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => Err(SlotError::Timeout { timeout }),
        }
    }

    /// Returns the stored value without waiting, if the slot completed with
    /// one. Cancelled, failed, or still-running slots yield `None`.
    pub fn peek(&self) -> Option<T> {
        if self.state.load(Ordering::Acquire) != COMPLETED {
            return None;
        }
        match &*self.lock_outcome() {
            Some(Outcome::Value(v)) => Some(v.clone()),
            _ => None,
        }
    }

    fn try_outcome(&self) -> Option<Result<T, SlotError>> {
        match self.state.load(Ordering::Acquire) {
            COMPLETED => {
                let guard = self.lock_outcome();
                Some(match &*guard {
                    Some(Outcome::Value(v)) => Ok(v.clone()),
                    Some(Outcome::Failure(cause)) => Err(SlotError::Failed {
                        cause: Arc::clone(cause),
                    }),
                    None => Err(SlotError::Failed {
                        cause: "slot completed without an outcome".into(),
                    }),
                })
            }
            CANCELLED | INTERRUPTED => Some(Err(SlotError::Cancelled)),
            _ => None,
        }
    }
}

impl<T> std::fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}
