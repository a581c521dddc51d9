//! Turning tunneled exceptions back into script-visible errors.
//!
//! This is the point where an exception crosses into script space, so it is also where redaction
//! happens: internal errors are logged here in full and replaced by a generic message.

use crate::exception::Exception;
use crate::realm::{ErrorKind, ErrorRealm, ACTOR_RESET_FLAG, REMOTE_FLAG};
use crate::tunnel::{
  decode, is_do_not_log_exception, trim_error_message, Classification, ErrorType,
  INTERNAL_ERROR_MESSAGE,
};
use std::fmt::Display;

/// Message for every [`ExceptionKind::Disconnected`](crate::ExceptionKind::Disconnected) exception.
pub const CONNECTION_LOST_MESSAGE: &str = "Network connection lost.";

/// Message used when materializing an exception fails.
pub const RENDERING_ERROR_MESSAGE: &str = "error rendering exception";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaterializeOptions {
  /// Log the full description of internal errors before redacting them.
  pub log_internal_errors: bool,
}

impl Default for MaterializeOptions {
  fn default() -> Self {
    Self {
      log_internal_errors: true,
    }
  }
}

/// A script error value together with the classification it was built from.
#[derive(Clone, Debug)]
pub struct DecodedException<V> {
  pub value: V,
  pub classification: Classification,
}

/// Native constructor for `error_type`. `DOMException` maps to `Error`, which is what it degrades
/// to in realms without a `DOMException` constructor.
fn error_kind(error_type: &ErrorType) -> ErrorKind {
  match error_type {
    ErrorType::Error | ErrorType::DomException(_) => ErrorKind::Error,
    ErrorType::RangeError => ErrorKind::RangeError,
    ErrorType::TypeError => ErrorKind::TypeError,
    ErrorType::SyntaxError => ErrorKind::SyntaxError,
    ErrorType::ReferenceError => ErrorKind::ReferenceError,
    ErrorType::CompileError | ErrorType::LinkError | ErrorType::RuntimeError => {
      ErrorKind::WasmCompileError
    }
  }
}

fn set_boundary_flags<R: ErrorRealm>(
  realm: &mut R,
  value: &R::Value,
  classification: &Classification,
) -> Result<(), R::Error> {
  if classification.is_from_remote {
    realm.set_hidden_flag(value, REMOTE_FLAG, true)?;
  }
  if classification.is_actor_reset {
    realm.set_hidden_flag(value, ACTOR_RESET_FLAG, true)?;
  }
  Ok(())
}

/// Builds the script error described by `classification`.
///
/// `raw_message` is the text that followed the type in the diagnostic (e.g. `": boom"`); it is
/// only used for application errors. A `DOMException` degrades to a plain `Error` if the realm
/// has no `DOMException` constructor.
pub fn materialize_error<R: ErrorRealm>(
  realm: &mut R,
  classification: &Classification,
  raw_message: &str,
) -> Result<R::Value, R::Error> {
  let message = if classification.is_internal {
    INTERNAL_ERROR_MESSAGE
  } else {
    trim_error_message(raw_message)
  };

  let dom_exception = match &classification.error_type {
    ErrorType::DomException(name) => realm.new_dom_exception(name, message)?,
    _ => None,
  };
  let value = match dom_exception {
    Some(value) => value,
    None => realm.new_error(error_kind(&classification.error_type), message)?,
  };

  set_boundary_flags(realm, &value, classification)?;
  Ok(value)
}

/// Decodes `diagnostic` and builds the matching script error.
pub fn decode_tunneled_exception<R: ErrorRealm>(
  realm: &mut R,
  diagnostic: &str,
) -> Result<DecodedException<R::Value>, R::Error> {
  let decoded = decode(diagnostic);
  let value = materialize_error(realm, &decoded.classification, &decoded.remainder)?;
  Ok(DecodedException {
    value,
    classification: decoded.classification,
  })
}

/// Logs `internal_message` and returns a generic `Error("internal error")`.
pub fn make_internal_error<R: ErrorRealm>(
  realm: &mut R,
  internal_message: &str,
) -> Result<R::Value, R::Error> {
  tracing::error!(internal_message, "internal error");
  realm.new_error(ErrorKind::Error, INTERNAL_ERROR_MESSAGE)
}

/// Converts an exception into the error value scripts should see.
pub fn exception_to_js<R: ErrorRealm>(
  realm: &mut R,
  exception: &Exception,
) -> Result<R::Value, R::Error> {
  exception_to_js_with_options(realm, exception, MaterializeOptions::default())
}

pub fn exception_to_js_with_options<R: ErrorRealm>(
  realm: &mut R,
  exception: &Exception,
  options: MaterializeOptions,
) -> Result<R::Value, R::Error> {
  let description = exception.description();
  let decoded = decode(description);
  let classification = &decoded.classification;

  if classification.is_internal {
    if options.log_internal_errors {
      // Disconnects and explicitly marked exceptions are unlikely to be bugs worth tracking.
      if exception.is_disconnected() || is_do_not_log_exception(description) {
        tracing::info!(kind = %exception.kind(), description, "internal error crossed into script");
      } else {
        tracing::error!(kind = %exception.kind(), description, "internal error crossed into script");
      }
    }
  }

  // A lost connection reads the same whether or not the peer tagged it.
  if exception.is_disconnected() {
    let value = realm.new_error(ErrorKind::Error, CONNECTION_LOST_MESSAGE)?;
    set_boundary_flags(realm, &value, classification)?;
    return Ok(value);
  }

  materialize_error(realm, classification, &decoded.remainder)
}

/// Like [`exception_to_js`], but if the realm fails while building the error, logs both failures
/// and falls back to a generic internal error.
pub fn exception_to_js_or_fallback<R: ErrorRealm>(
  realm: &mut R,
  exception: &Exception,
) -> Result<R::Value, R::Error>
where
  R::Error: Display,
{
  match exception_to_js(realm, exception) {
    Ok(value) => Ok(value),
    Err(err) => {
      tracing::error!(error = %err, %exception, "error rendering exception");
      make_internal_error(realm, RENDERING_ERROR_MESSAGE)
    }
  }
}
