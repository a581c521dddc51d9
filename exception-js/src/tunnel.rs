//! The exception tunneling grammar.
//!
//! A failure that crosses a boundary only carries a flat description string. To let the far side
//! rebuild a script-visible error of the right type (and to keep internal detail out of script
//! space), the description is prefixed with a classification:
//!
//! ```text
//! [remote.]* ( expected <cond>; ... | [broken.<reason>; ]* ) <tag><Type>[: message]
//! ```
//!
//! where `<tag>` is one of `jsg.`, `cfjs.` (application errors, message is shown to scripts) or
//! `jsg-internal.`, `cfjs-internal.` (internal errors, message is replaced by `"internal error"`).
//! The tokens below are the wire contract between both ends and must never change.
//!
//! Decoding never fails: anything that doesn't parse becomes an internal `Error`.

use serde::Serialize;
use std::fmt;

/// Separates prefix clauses.
pub const ERROR_PREFIX_DELIM: &str = "; ";
/// Marks an error as tunneled from another worker or actor. May repeat.
pub const ERROR_REMOTE_PREFIX: &str = "remote.";
/// Marks an error caused by an actor reset. Followed by a reason and [`ERROR_PREFIX_DELIM`].
pub const ERROR_BROKEN_PREFIX: &str = "broken.";
pub const ERROR_TUNNELED_PREFIX_CFJS: &str = "cfjs.";
pub const ERROR_TUNNELED_PREFIX_JSG: &str = "jsg.";
pub const ERROR_INTERNAL_SOURCE_PREFIX_CFJS: &str = "cfjs-internal.";
pub const ERROR_INTERNAL_SOURCE_PREFIX_JSG: &str = "jsg-internal.";
/// Failed assertions start with this, followed by the failed condition.
pub const ERROR_ASSERTION_PREFIX: &str = "expected ";
/// Added by the RPC transport when an exception is passed over the wire.
pub const REMOTE_EXCEPTION_PREFIX: &str = "remote exception: ";
pub const DOM_EXCEPTION_PREFIX: &str = "DOMException(";
/// Exceptions containing this marker are not worth logging.
pub const DO_NOT_LOG_MARKER: &str = "worker_do_not_log";

/// Script-visible error type carried by a tunneled exception.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "name")]
pub enum ErrorType {
  Error,
  RangeError,
  TypeError,
  SyntaxError,
  ReferenceError,
  /// `WebAssembly.CompileError`.
  CompileError,
  /// `WebAssembly.LinkError`.
  LinkError,
  /// `WebAssembly.RuntimeError`.
  RuntimeError,
  /// `DOMException` with the given `name`.
  DomException(String),
}

/// Plain type names, in match order.
const PLAIN_ERROR_TYPES: [(&str, ErrorType); 8] = [
  ("Error", ErrorType::Error),
  ("RangeError", ErrorType::RangeError),
  ("TypeError", ErrorType::TypeError),
  ("SyntaxError", ErrorType::SyntaxError),
  ("ReferenceError", ErrorType::ReferenceError),
  ("CompileError", ErrorType::CompileError),
  ("LinkError", ErrorType::LinkError),
  ("RuntimeError", ErrorType::RuntimeError),
];

impl ErrorType {
  /// Parses a type at the start of `s`, returning the type and the unparsed remainder.
  fn parse_prefix(s: &str) -> Option<(ErrorType, &str)> {
    for (name, ty) in PLAIN_ERROR_TYPES.iter() {
      if let Some(rest) = s.strip_prefix(name) {
        return Some((ty.clone(), rest));
      }
    }
    let inner = s.strip_prefix(DOM_EXCEPTION_PREFIX)?;
    let close = inner.find(')')?;
    Some((
      ErrorType::DomException(inner[..close].to_string()),
      &inner[close + 1..],
    ))
  }
}

impl fmt::Display for ErrorType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ErrorType::Error => f.write_str("Error"),
      ErrorType::RangeError => f.write_str("RangeError"),
      ErrorType::TypeError => f.write_str("TypeError"),
      ErrorType::SyntaxError => f.write_str("SyntaxError"),
      ErrorType::ReferenceError => f.write_str("ReferenceError"),
      ErrorType::CompileError => f.write_str("CompileError"),
      ErrorType::LinkError => f.write_str("LinkError"),
      ErrorType::RuntimeError => f.write_str("RuntimeError"),
      ErrorType::DomException(name) => write!(f, "{DOM_EXCEPTION_PREFIX}{name})"),
    }
  }
}

/// Security classification recovered from a diagnostic string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Classification {
  pub error_type: ErrorType,
  /// The message must be hidden from scripts (and logged at the origin instead).
  pub is_internal: bool,
  /// The error was tunneled from another worker or actor.
  pub is_from_remote: bool,
  /// The error was produced because an actor was reset.
  pub is_actor_reset: bool,
}

impl Classification {
  /// Generic internal error, used whenever a diagnostic can't be classified.
  pub fn internal() -> Self {
    Self {
      error_type: ErrorType::Error,
      is_internal: true,
      is_from_remote: false,
      is_actor_reset: false,
    }
  }

  pub fn application(error_type: ErrorType) -> Self {
    Self {
      error_type,
      is_internal: false,
      is_from_remote: false,
      is_actor_reset: false,
    }
  }

  /// The prefix that [`decode`] turns back into this classification. Actor resets are rendered
  /// with an empty reason.
  fn prefix(&self) -> String {
    let mut out = String::new();
    if self.is_from_remote {
      out.push_str(ERROR_REMOTE_PREFIX);
    }
    if self.is_actor_reset {
      out.push_str(ERROR_BROKEN_PREFIX);
      out.push_str(ERROR_PREFIX_DELIM);
    }
    out.push_str(tag_for(self.is_internal));
    out.push_str(&self.error_type.to_string());
    out
  }
}

/// A decoded diagnostic: the classification plus whatever followed the type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Decoded {
  pub classification: Classification,
  /// Raw text after the type, e.g. `": boom"`. Empty for unclassified diagnostics.
  pub remainder: String,
}

impl Decoded {
  /// The message scripts may see: `"internal error"` for internal errors, otherwise the text after
  /// the `": "` separator.
  pub fn app_message(&self) -> &str {
    if self.classification.is_internal {
      INTERNAL_ERROR_MESSAGE
    } else {
      trim_error_message(&self.remainder)
    }
  }
}

/// The only message scripts ever see for internal errors.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

fn tag_for(is_internal: bool) -> &'static str {
  if is_internal {
    ERROR_INTERNAL_SOURCE_PREFIX_JSG
  } else {
    ERROR_TUNNELED_PREFIX_JSG
  }
}

/// For strings beginning with `':'` and optional spaces, returns everything after the spaces.
/// Otherwise returns the empty string.
pub fn trim_error_message(s: &str) -> &str {
  match s.strip_prefix(':') {
    Some(rest) => rest.trim_start_matches(' '),
    None => "",
  }
}

/// Strips any number of RPC transport prefixes.
pub fn strip_remote_exception_prefix(mut message: &str) -> &str {
  while let Some(rest) = message.strip_prefix(REMOTE_EXCEPTION_PREFIX) {
    message = rest;
  }
  message
}

/// Text just past the first delimiter, if any.
fn skip_clause(message: &str) -> Option<&str> {
  message
    .find(ERROR_PREFIX_DELIM)
    .map(|idx| &message[idx + ERROR_PREFIX_DELIM.len()..])
}

/// Matches one of the four classification tags, returning `is_internal` and the rest.
fn strip_tag(message: &str) -> Option<(bool, &str)> {
  if let Some(rest) = message.strip_prefix(ERROR_TUNNELED_PREFIX_CFJS) {
    return Some((false, rest));
  }
  if let Some(rest) = message.strip_prefix(ERROR_TUNNELED_PREFIX_JSG) {
    return Some((false, rest));
  }
  if let Some(rest) = message.strip_prefix(ERROR_INTERNAL_SOURCE_PREFIX_CFJS) {
    return Some((true, rest));
  }
  if let Some(rest) = message.strip_prefix(ERROR_INTERNAL_SOURCE_PREFIX_JSG) {
    return Some((true, rest));
  }
  None
}

/// Flags collected from the leading `remote.`/`broken.` clauses.
#[derive(Clone, Copy, Default)]
struct Flags {
  is_from_remote: bool,
  is_actor_reset: bool,
}

impl Flags {
  fn classify(self, error_type: ErrorType, is_internal: bool) -> Classification {
    Classification {
      error_type,
      is_internal,
      is_from_remote: self.is_from_remote,
      is_actor_reset: self.is_actor_reset,
    }
  }
}

/// Classifies the text after the prefixes. `raw_type` is the tag-stripped text when a tag matched.
fn extract(flags: Flags, tagged: Option<(bool, &str)>) -> Decoded {
  let Some((is_internal, raw_type)) = tagged else {
    return Decoded {
      classification: flags.classify(ErrorType::Error, true),
      remainder: String::new(),
    };
  };
  match ErrorType::parse_prefix(raw_type) {
    Some((error_type, rest)) => Decoded {
      classification: flags.classify(error_type, is_internal),
      remainder: rest.to_string(),
    },
    // Unrecognized type. Never trust its message.
    None => Decoded {
      classification: flags.classify(ErrorType::Error, true),
      remainder: String::new(),
    },
  }
}

/// Returns the raw type text (everything after the tag) and the flags, without parsing the type.
fn split(message: &str) -> (Flags, Option<(bool, &str)>) {
  let mut message = strip_remote_exception_prefix(message);
  let mut flags = Flags::default();

  // Errors may be returned through several workers, so allow any number of these.
  while let Some(rest) = message.strip_prefix(ERROR_REMOTE_PREFIX) {
    flags.is_from_remote = true;
    message = rest;
  }

  if message.starts_with(ERROR_ASSERTION_PREFIX) {
    // A failed assertion. Peel clauses until one is classified.
    while let Some(rest) = skip_clause(message) {
      message = rest;
      if let Some(tagged) = strip_tag(message) {
        return (flags, Some(tagged));
      }
    }
    return (flags, None);
  }

  while message.starts_with(ERROR_BROKEN_PREFIX) {
    flags.is_actor_reset = true;
    // Broken reasons can't contain the delimiter.
    match skip_clause(message) {
      Some(rest) => message = rest,
      None => return (flags, None),
    }
  }

  (flags, strip_tag(message))
}

/// Decodes the classification and the trailing message text of a diagnostic.
pub fn decode(message: &str) -> Decoded {
  let (flags, tagged) = split(message);
  extract(flags, tagged)
}

/// Decodes just the classification of a diagnostic.
pub fn decode_classification(message: &str) -> Classification {
  decode(message).classification
}

/// A `DOMException` name the grammar can't carry: decoding stops the name at the first `)`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("DOMException name {0:?} must not contain ')'")]
pub struct InvalidDomExceptionName(pub String);

/// Renders a diagnostic that [`decode`] maps back to `classification` and `message`.
///
/// To re-tag an existing diagnostic as caused by an actor reset, use [`annotate_broken`].
pub fn render_classification(
  classification: &Classification,
  message: &str,
) -> Result<String, InvalidDomExceptionName> {
  if let ErrorType::DomException(name) = &classification.error_type {
    if name.contains(')') {
      return Err(InvalidDomExceptionName(name.clone()));
    }
  }
  let mut out = classification.prefix();
  if !message.is_empty() {
    out.push_str(": ");
    out.push_str(message);
  }
  Ok(out)
}

/// Re-tags `message` as caused by an actor reset for `reason`.
///
/// The remote marker is preserved, any previous `broken.` reasons are replaced by `reason`, and
/// the classification tag is normalized to the `jsg` family. The text after the tag (type and
/// message) is kept verbatim. `reason` gets the `broken.` marker unless it already has it.
pub fn annotate_broken(message: &str, reason: &str) -> String {
  let (flags, tagged) = split(message);
  let (is_internal, raw_type) = match tagged {
    Some((is_internal, raw_type)) => (is_internal, raw_type),
    None => (true, "Error"),
  };

  let mut out = String::new();
  if flags.is_from_remote {
    out.push_str(ERROR_REMOTE_PREFIX);
  }
  if !reason.starts_with(ERROR_BROKEN_PREFIX) {
    out.push_str(ERROR_BROKEN_PREFIX);
  }
  out.push_str(reason);
  out.push_str(ERROR_PREFIX_DELIM);
  out.push_str(tag_for(is_internal));
  out.push_str(raw_type);
  out
}

/// Returns the raw tunneled type text (e.g. `"TypeError: boom"`), or `"Error"` when the
/// diagnostic isn't tunneled.
pub fn extract_tunneled_exception_description(message: &str) -> &str {
  match split(message).1 {
    Some((_, raw_type)) => raw_type,
    None => "Error",
  }
}

/// Whether `message` carries an application (script-visible) error.
pub fn is_tunneled_exception(message: &str) -> bool {
  !decode_classification(message).is_internal
}

pub fn is_do_not_log_exception(message: &str) -> bool {
  message.contains(DO_NOT_LOG_MARKER)
}
