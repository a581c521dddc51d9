use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Engine-level category of an [`Exception`].
///
/// This is deliberately a closed set: script-visible classification travels inside the
/// description (see [`crate::tunnel`]), not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
  /// Something went wrong. The default.
  Failed,
  /// The resource is temporarily overloaded; retrying later may help.
  Overloaded,
  /// The connection to a remote peer was lost.
  Disconnected,
  /// The requested operation is not implemented by the callee.
  Unimplemented,
}

impl fmt::Display for ExceptionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      ExceptionKind::Failed => "failed",
      ExceptionKind::Overloaded => "overloaded",
      ExceptionKind::Disconnected => "disconnected",
      ExceptionKind::Unimplemented => "unimplemented",
    })
  }
}

/// A failure crossing a thread, sandbox or RPC boundary.
///
/// The description is the only payload that survives the trip, so any classification the far
/// side needs must be encoded into it with [`crate::tunnel`]. Clones share the description.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {description}")]
pub struct Exception {
  kind: ExceptionKind,
  description: Arc<str>,
}

impl Exception {
  pub fn new(kind: ExceptionKind, description: impl Into<Arc<str>>) -> Self {
    Self {
      kind,
      description: description.into(),
    }
  }

  pub fn failed(description: impl Into<Arc<str>>) -> Self {
    Self::new(ExceptionKind::Failed, description)
  }

  pub fn disconnected(description: impl Into<Arc<str>>) -> Self {
    Self::new(ExceptionKind::Disconnected, description)
  }

  pub fn overloaded(description: impl Into<Arc<str>>) -> Self {
    Self::new(ExceptionKind::Overloaded, description)
  }

  pub fn unimplemented(description: impl Into<Arc<str>>) -> Self {
    Self::new(ExceptionKind::Unimplemented, description)
  }

  pub fn kind(&self) -> ExceptionKind {
    self.kind
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn is_disconnected(&self) -> bool {
    self.kind == ExceptionKind::Disconnected
  }

  /// Returns a copy of this exception with its description rewritten, keeping the kind.
  ///
  /// Used when annotating a failure as it propagates outward (e.g. with
  /// [`crate::tunnel::annotate_broken`]).
  pub fn with_description(&self, description: impl Into<Arc<str>>) -> Self {
    Self::new(self.kind, description)
  }
}
