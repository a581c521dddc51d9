use ahash::AHashMap;
use exception_js::Exception;
use futures::channel::oneshot;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// What every subscriber eventually observes.
pub(crate) type Outcome = Result<(), Exception>;

pub(crate) const NEVER_FULFILLED_MESSAGE: &str = "wait list was never fulfilled";

pub(crate) fn never_fulfilled() -> Exception {
  Exception::failed(NEVER_FULFILLED_MESSAGE)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct WaiterId(u64);

#[derive(Debug, Default)]
struct Waiters {
  next_id: u64,
  /// A waiter is linked exactly while its resolver is in here.
  resolvers: AHashMap<WaiterId, oneshot::Sender<Outcome>>,
}

pub(crate) enum Registration {
  /// The state was already resolved.
  Ready(Outcome),
  Linked(WaiterId, oneshot::Receiver<Outcome>),
}

/// The one-shot state shared by a wait list, its fulfiller and all of its waiters.
///
/// `done` only ever goes from false to true, and only while holding the `waiters` lock. The
/// outcome is written before `done` is release-stored, so any thread that acquire-loads `done ==
/// true` sees the outcome without taking the lock. `waiters` is empty once `done` is set.
#[derive(Debug)]
pub(crate) struct State {
  done: AtomicBool,
  outcome: OnceLock<Outcome>,
  waiters: Mutex<Waiters>,
  pub(crate) use_thread_local_optimization: bool,
}

impl State {
  pub(crate) fn new(use_thread_local_optimization: bool) -> Self {
    Self {
      done: AtomicBool::new(false),
      outcome: OnceLock::new(),
      waiters: Mutex::new(Waiters::default()),
      use_thread_local_optimization,
    }
  }

  pub(crate) fn is_done(&self) -> bool {
    self.done.load(Ordering::Acquire)
  }

  /// The outcome, if resolved. Lock-free.
  pub(crate) fn settled(&self) -> Option<Outcome> {
    if self.is_done() {
      self.outcome.get().cloned()
    } else {
      None
    }
  }

  /// Links a new waiter, unless the state got resolved since the caller last checked.
  pub(crate) fn register(&self) -> Registration {
    let mut waiters = self.waiters.lock();
    if let Some(outcome) = self.settled() {
      return Registration::Ready(outcome);
    }
    let id = WaiterId(waiters.next_id);
    waiters.next_id += 1;
    let (resolver, receiver) = oneshot::channel();
    waiters.resolvers.insert(id, resolver);
    Registration::Linked(id, receiver)
  }

  /// Unlinks a waiter that is going away.
  pub(crate) fn unregister(&self, id: WaiterId) {
    // Resolution drains every waiter, so there's nothing to unlink.
    if self.is_done() {
      return;
    }
    self.waiters.lock().resolvers.remove(&id);
  }

  pub(crate) fn waiter_count(&self) -> usize {
    self.waiters.lock().resolvers.len()
  }

  /// Resolves the state and drains all waiters. Returns the number of waiters woken, or `None` if
  /// the state was already resolved.
  fn settle(&self, outcome: Outcome) -> Option<usize> {
    if self.is_done() {
      return None;
    }
    let mut waiters = self.waiters.lock();
    if self.is_done() {
      return None;
    }
    // The lock makes us the only writer.
    let _ = self.outcome.set(outcome.clone());
    self.done.store(true, Ordering::Release);
    let drained = std::mem::take(&mut waiters.resolvers);
    drop(waiters);

    let count = drained.len();
    for (_, resolver) in drained {
      // The receiver may have been dropped by a waiter that is about to unregister.
      let _ = resolver.send(outcome.clone());
    }
    Some(count)
  }

  pub(crate) fn fulfill(&self) {
    if let Some(waiters) = self.settle(Ok(())) {
      tracing::debug!(waiters, "wait list fulfilled");
    }
  }

  pub(crate) fn reject(&self, exception: Exception) {
    if let Some(waiters) = self.settle(Err(exception)) {
      tracing::debug!(waiters, "wait list rejected");
    }
  }

  /// The fulfiller went away without resolving the state.
  pub(crate) fn lost_fulfiller(&self) {
    if let Some(waiters) = self.settle(Err(never_fulfilled())) {
      tracing::trace!(waiters, "wait list abandoned");
    }
  }
}
