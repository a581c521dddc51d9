//! A one-shot, cross-thread broadcast completion signal.
//!
//! A [`WaitList`] is resolved exactly once, by its [`Fulfiller`] (or by itself), and any number of
//! subscribers on any threads can await that resolution:
//!
//! - Every subscriber, whether it subscribed before or after resolution, observes the same outcome.
//! - Resolving twice is a no-op.
//! - Dropping the fulfiller without resolving rejects the list, so no subscriber waits forever
//!   because its producer unwound.
//!
//! With [`WaitListOptions::use_thread_local_optimization`], subscriptions made on the same thread
//! share a single cross-thread registration, so a thread contributes at most one waiter no matter
//! how many times it subscribes.

mod state;
mod waiter;

use exception_js::Exception;
use state::State;
use std::fmt;
use std::sync::Arc;

pub use waiter::Wait;

/// Description of the exception delivered when a wait list is dropped unresolved.
pub const NEVER_FULFILLED_MESSAGE: &str = state::NEVER_FULFILLED_MESSAGE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitListOptions {
  /// Coalesce same-thread subscriptions into one cross-thread registration.
  pub use_thread_local_optimization: bool,
}

impl Default for WaitListOptions {
  fn default() -> Self {
    Self {
      use_thread_local_optimization: true,
    }
  }
}

pub struct WaitList {
  state: Arc<State>,
  created_fulfiller: bool,
}

impl WaitList {
  pub fn new(options: WaitListOptions) -> Self {
    Self {
      state: Arc::new(State::new(options.use_thread_local_optimization)),
      created_fulfiller: false,
    }
  }

  /// Hands out the fulfiller for this list. Once it exists, dropping the list no longer counts as
  /// abandoning it; dropping the fulfiller does.
  ///
  /// # Panics
  ///
  /// If called more than once.
  pub fn make_fulfiller(&mut self) -> Fulfiller {
    assert!(
      !self.created_fulfiller,
      "make_fulfiller() can only be called once"
    );
    self.created_fulfiller = true;
    Fulfiller {
      state: self.state.clone(),
    }
  }

  /// Returns a future that resolves with the list's outcome. Never blocks.
  pub fn subscribe(&self) -> Wait {
    waiter::subscribe(&self.state)
  }

  pub fn fulfill(&self) {
    self.state.fulfill();
  }

  pub fn reject(&self, exception: Exception) {
    self.state.reject(exception);
  }

  pub fn is_done(&self) -> bool {
    self.state.is_done()
  }

  /// Number of cross-thread registrations currently waiting.
  pub fn waiter_count(&self) -> usize {
    self.state.waiter_count()
  }
}

impl Default for WaitList {
  fn default() -> Self {
    Self::new(WaitListOptions::default())
  }
}

impl Drop for WaitList {
  fn drop(&mut self) {
    if !self.created_fulfiller {
      self.state.lost_fulfiller();
    }
  }
}

impl fmt::Debug for WaitList {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("WaitList")
      .field("done", &self.state.is_done())
      .field("created_fulfiller", &self.created_fulfiller)
      .finish_non_exhaustive()
  }
}

/// The capability to resolve a [`WaitList`].
///
/// Dropping it before resolving rejects the list with [`NEVER_FULFILLED_MESSAGE`].
pub struct Fulfiller {
  state: Arc<State>,
}

impl Fulfiller {
  pub fn fulfill(&self) {
    self.state.fulfill();
  }

  pub fn reject(&self, exception: Exception) {
    self.state.reject(exception);
  }

  /// Whether the list is still unresolved.
  ///
  /// This stays true even while nobody is subscribed, since someone may subscribe later.
  pub fn is_waiting(&self) -> bool {
    !self.state.is_done()
  }
}

impl Drop for Fulfiller {
  fn drop(&mut self) {
    self.state.lost_fulfiller();
  }
}

impl fmt::Debug for Fulfiller {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Fulfiller")
      .field("waiting", &self.is_waiting())
      .finish()
  }
}
