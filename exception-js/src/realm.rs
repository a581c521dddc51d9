use serde::Serialize;
use std::fmt;

/// Native error constructors a realm must be able to invoke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
  Error,
  RangeError,
  TypeError,
  SyntaxError,
  ReferenceError,
  /// `WebAssembly.CompileError`; also used for link and runtime errors.
  WasmCompileError,
}

impl ErrorKind {
  pub fn name(self) -> &'static str {
    match self {
      ErrorKind::Error => "Error",
      ErrorKind::RangeError => "RangeError",
      ErrorKind::TypeError => "TypeError",
      ErrorKind::SyntaxError => "SyntaxError",
      ErrorKind::ReferenceError => "ReferenceError",
      ErrorKind::WasmCompileError => "CompileError",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Non-enumerable flag set on errors tunneled from another worker or actor.
pub const REMOTE_FLAG: &str = "remote";
/// Non-enumerable flag set on errors caused by an actor reset.
pub const ACTOR_RESET_FLAG: &str = "durableObjectReset";

/// The part of a script engine needed to materialize errors.
///
/// This keeps the engine abstract so the tunneling logic can sit on top of any runtime (e.g.
/// `vm-js`). Errors returned by these hooks are engine failures (out of memory, termination), not
/// script exceptions.
pub trait ErrorRealm {
  type Value: Clone;
  type Error;

  /// Allocates a native error object of `kind` with the given message.
  fn new_error(&mut self, kind: ErrorKind, message: &str) -> Result<Self::Value, Self::Error>;

  /// Constructs `new DOMException(message, name)` using the realm's global `DOMException`.
  ///
  /// Returns `Ok(None)` if the global isn't a constructor (e.g. the embedding doesn't expose one).
  fn new_dom_exception(
    &mut self,
    name: &str,
    message: &str,
  ) -> Result<Option<Self::Value>, Self::Error>;

  /// Defines a non-enumerable boolean property `key` on the error object `value`.
  fn set_hidden_flag(
    &mut self,
    value: &Self::Value,
    key: &'static str,
    flag: bool,
  ) -> Result<(), Self::Error>;
}
