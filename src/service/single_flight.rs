// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-flight execution of an async producer.
//!
//! A [`SingleFlight`] runs its producer for the first caller and queues every caller that
//! arrives while the run is in flight. When the run settles, queued callers are released in
//! arrival order with a clone of the outcome. A success is cached for all later callers; a
//! failure is either cached too ([`FailurePolicy::Sticky`]) or cleared so the next caller
//! starts a new run ([`FailurePolicy::Retry`]).
//!
//! A run whose driving caller is dropped before it settles produces no outcome. The next
//! queued caller starts another run, so the producer can run more than once in that case.

use crate::domain::ConfigError;
use futures::future::{BoxFuture, FutureExt};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

type Producer<T, E> = Box<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;
type Waiter<T, E> = oneshot::Sender<Result<T, E>>;

/// What happens to a failed run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The error is cached and returned to every later caller; the producer never runs again.
    #[default]
    Sticky,
    /// Queued callers receive the error, then the flight returns to idle.
    Retry,
}

/// Observable state of a flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlightState {
    /// No run has started, or a retryable run failed
    Idle,
    /// A run is executing
    InFlight,
    /// A run succeeded; its value is cached
    Resolved,
    /// A run failed under the sticky policy; its error is cached
    Failed,
}

enum Slot<T, E> {
    Idle,
    InFlight(VecDeque<Waiter<T, E>>),
    Resolved(T),
    Failed(E),
}

/// Runs an async producer at most once per settled outcome, sharing it with all callers.
///
/// A run abandoned before settling is not an outcome: it still counts in [`runs`], and the
/// next caller starts a fresh run.
///
/// [`runs`]: SingleFlight::runs
///
/// # Examples
///
/// ```rust
/// use lazycfg::service::SingleFlight;
/// use lazycfg::domain::ConfigError;
///
/// # #[tokio::main]
/// # async fn main() {
/// let flight: SingleFlight<u32, ConfigError> = SingleFlight::new(|| async { Ok(42) });
///
/// let (a, b) = tokio::join!(flight.get(), flight.get());
/// assert_eq!(a.unwrap(), 42);
/// assert_eq!(b.unwrap(), 42);
/// assert_eq!(flight.runs(), 1);
/// # }
/// ```
pub struct SingleFlight<T, E = ConfigError> {
    producer: Producer<T, E>,
    policy: FailurePolicy,
    slot: Mutex<Slot<T, E>>,
    runs: AtomicUsize,
}

impl<T, E> SingleFlight<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Creates a flight with the sticky failure policy.
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::with_policy(producer, FailurePolicy::Sticky)
    }

    /// Creates a flight with an explicit failure policy.
    pub fn with_policy<F, Fut>(producer: F, policy: FailurePolicy) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            producer: Box::new(move || producer().boxed()),
            policy,
            slot: Mutex::new(Slot::Idle),
            runs: AtomicUsize::new(0),
        }
    }

    /// Returns the shared outcome, starting the producer if nothing is cached or running.
    ///
    /// If the caller driving the producer is dropped before the run settles, the flight
    /// returns to idle and the earliest queued caller starts a new run.
    pub async fn get(&self) -> Result<T, E> {
        loop {
            let waiter = {
                let mut slot = self.lock();
                let waiter = match &mut *slot {
                    Slot::Resolved(value) => return Ok(value.clone()),
                    Slot::Failed(error) => return Err(error.clone()),
                    Slot::InFlight(waiters) => {
                        let (tx, rx) = oneshot::channel();
                        waiters.push_back(tx);
                        Some(rx)
                    }
                    Slot::Idle => None,
                };
                if waiter.is_none() {
                    *slot = Slot::InFlight(VecDeque::new());
                }
                waiter
            };

            match waiter {
                Some(rx) => match rx.await {
                    Ok(outcome) => return outcome,
                    Err(_) => {
                        tracing::debug!("single-flight leader abandoned its run, re-entering");
                        continue;
                    }
                },
                None => return self.lead().await,
            }
        }
    }

    /// Returns the current state without starting a run.
    pub fn state(&self) -> FlightState {
        match &*self.lock() {
            Slot::Idle => FlightState::Idle,
            Slot::InFlight(_) => FlightState::InFlight,
            Slot::Resolved(_) => FlightState::Resolved,
            Slot::Failed(_) => FlightState::Failed,
        }
    }

    /// Returns how many times the producer has been started.
    ///
    /// Includes runs abandoned because their driving caller was dropped before they settled.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// Returns the failure policy.
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    async fn lead(&self) -> Result<T, E> {
        let mut guard = LeaderGuard {
            flight: self,
            settled: false,
        };
        self.runs.fetch_add(1, Ordering::SeqCst);
        let outcome = (self.producer)().await;
        guard.settled = true;
        self.settle(&outcome);
        outcome
    }

    fn settle(&self, outcome: &Result<T, E>) {
        let next = match (outcome, self.policy) {
            (Ok(value), _) => Slot::Resolved(value.clone()),
            (Err(error), FailurePolicy::Sticky) => Slot::Failed(error.clone()),
            (Err(_), FailurePolicy::Retry) => Slot::Idle,
        };
        let waiters = match std::mem::replace(&mut *self.lock(), next) {
            Slot::InFlight(waiters) => waiters,
            _ => VecDeque::new(),
        };
        for waiter in waiters {
            // A waiter that went away no longer needs the outcome
            let _ = waiter.send(outcome.clone());
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T, E>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T, E> fmt::Debug for SingleFlight<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight")
            .field("state", &self.state())
            .field("policy", &self.policy)
            .field("runs", &self.runs())
            .finish()
    }
}

// Resets an unsettled flight when the leading caller is dropped mid-run.
struct LeaderGuard<'a, T, E> {
    flight: &'a SingleFlight<T, E>,
    settled: bool,
}

impl<T, E> Drop for LeaderGuard<'_, T, E> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut slot = self
            .flight
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if matches!(&*slot, Slot::InFlight(_)) {
            // Dropping the senders wakes every waiter so one of them can take over
            *slot = Slot::Idle;
        }
    }
}
