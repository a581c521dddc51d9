use crate::state::{never_fulfilled, Outcome, Registration, State, WaiterId};
use ahash::AHashMap;
use exception_js::Exception;
use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::ptr;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

/// A registration in a state's waiter set. Unlinks itself when dropped.
struct Waiter {
  state: Arc<State>,
  id: WaiterId,
}

impl Drop for Waiter {
  fn drop(&mut self) {
    self.state.unregister(self.id);
  }
}

type Signal = Shared<oneshot::Receiver<Outcome>>;

/// The single waiter a thread registers for a given state, shared by every subscription made on
/// that thread while it's alive.
struct LocalWaiter {
  key: usize,
  signal: Signal,
  _waiter: Waiter,
}

thread_local! {
  /// Per-thread index of in-flight local waiters, keyed by state address.
  ///
  /// Entries are weak: they never keep a state alive. A live `LocalWaiter` holds its state, so the
  /// address can't be reused while its entry is upgradable.
  static LOCAL_WAITERS: RefCell<AHashMap<usize, Weak<LocalWaiter>>> = RefCell::new(AHashMap::new());
}

impl Drop for LocalWaiter {
  // Runs before the fields drop, so the entry is gone before the waiter unlinks.
  fn drop(&mut self) {
    let this: *const LocalWaiter = self;
    // Branches may be dropped on another thread, or during thread teardown. Either way the entry
    // on the origin thread is dead and will be replaced by the next subscription there.
    let _ = LOCAL_WAITERS.try_with(|cache| {
      let Ok(mut cache) = cache.try_borrow_mut() else {
        return;
      };
      if cache
        .get(&self.key)
        .is_some_and(|entry| ptr::eq(entry.as_ptr(), this))
      {
        cache.remove(&self.key);
      }
    });
  }
}

enum WaitInner {
  Ready(Option<Outcome>),
  Single {
    receiver: oneshot::Receiver<Outcome>,
    _waiter: Waiter,
  },
  Branch {
    signal: Signal,
    _local: Arc<LocalWaiter>,
  },
}

/// Future returned by [`WaitList::subscribe`](crate::WaitList::subscribe).
///
/// Resolves once the wait list is fulfilled or rejected. Dropping it before then unsubscribes
/// without affecting other subscribers.
#[must_use = "futures do nothing unless polled"]
pub struct Wait {
  inner: WaitInner,
}

impl Wait {
  fn ready(outcome: Outcome) -> Self {
    Self {
      inner: WaitInner::Ready(Some(outcome)),
    }
  }

  fn single(state: &Arc<State>) -> Self {
    match state.register() {
      Registration::Ready(outcome) => Self::ready(outcome),
      Registration::Linked(id, receiver) => Self {
        inner: WaitInner::Single {
          receiver,
          _waiter: Waiter {
            state: state.clone(),
            id,
          },
        },
      },
    }
  }

  fn branch(local: Arc<LocalWaiter>) -> Self {
    Self {
      inner: WaitInner::Branch {
        signal: local.signal.clone(),
        _local: local,
      },
    }
  }
}

impl fmt::Debug for Wait {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let kind = match &self.inner {
      WaitInner::Ready(_) => "ready",
      WaitInner::Single { .. } => "single",
      WaitInner::Branch { .. } => "branch",
    };
    f.debug_struct("Wait").field("kind", &kind).finish()
  }
}

fn flatten(received: Result<Outcome, oneshot::Canceled>) -> Outcome {
  // A resolver is only dropped unsent together with its state, which our waiter keeps alive.
  received.unwrap_or_else(|_| Err(never_fulfilled()))
}

impl Future for Wait {
  type Output = Result<(), Exception>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    match &mut self.get_mut().inner {
      WaitInner::Ready(outcome) => match outcome.take() {
        Some(outcome) => Poll::Ready(outcome),
        None => panic!("`Wait` polled after completion"),
      },
      WaitInner::Single { receiver, .. } => receiver.poll_unpin(cx).map(flatten),
      WaitInner::Branch { signal, .. } => signal.poll_unpin(cx).map(flatten),
    }
  }
}

pub(crate) fn subscribe(state: &Arc<State>) -> Wait {
  if let Some(outcome) = state.settled() {
    return Wait::ready(outcome);
  }
  if state.use_thread_local_optimization {
    subscribe_local(state)
  } else {
    Wait::single(state)
  }
}

fn subscribe_local(state: &Arc<State>) -> Wait {
  let key = Arc::as_ptr(state) as usize;
  let cached = LOCAL_WAITERS
    .try_with(|cache| cache.borrow().get(&key).and_then(Weak::upgrade))
    .ok()
    .flatten();
  if let Some(local) = cached {
    return Wait::branch(local);
  }

  let (id, receiver) = match state.register() {
    Registration::Ready(outcome) => return Wait::ready(outcome),
    Registration::Linked(id, receiver) => (id, receiver),
  };
  let local = Arc::new(LocalWaiter {
    key,
    signal: receiver.shared(),
    _waiter: Waiter {
      state: state.clone(),
      id,
    },
  });
  // Without thread-local storage we just don't coalesce.
  let _ = LOCAL_WAITERS.try_with(|cache| {
    let Ok(mut cache) = cache.try_borrow_mut() else {
      return;
    };
    // Branches dropped on other threads can't clear their entry here, so sweep dead ones.
    cache.retain(|_, entry| entry.strong_count() > 0);
    cache.insert(key, Arc::downgrade(&local));
  });
  Wait::branch(local)
}
