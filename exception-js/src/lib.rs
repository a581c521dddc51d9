//! Exception tunneling for sandboxed JavaScript runtimes.
//!
//! Failures cross threads, sandboxes and RPC boundaries as an [`Exception`]: an engine-level kind
//! plus a flat description. This crate provides:
//! - The tunneling grammar ([`tunnel`]) that encodes a security classification (script-visible
//!   type, internal/redacted, remote origin, actor reset) into that description, and decodes it.
//! - Materialization ([`materialize`]) of a decoded exception into a script error through an
//!   engine-agnostic [`ErrorRealm`], redacting internal errors and tagging boundary flags.
//! - Fixed-template messages for binding type errors ([`type_error`]).

mod exception;
pub mod materialize;
pub mod realm;
pub mod tunnel;
pub mod type_error;

pub use exception::Exception;
pub use exception::ExceptionKind;
pub use materialize::decode_tunneled_exception;
pub use materialize::exception_to_js;
pub use materialize::materialize_error;
pub use materialize::DecodedException;
pub use materialize::MaterializeOptions;
pub use realm::ErrorKind;
pub use realm::ErrorRealm;
pub use tunnel::annotate_broken;
pub use tunnel::decode;
pub use tunnel::decode_classification;
pub use tunnel::render_classification;
pub use tunnel::Classification;
pub use tunnel::Decoded;
pub use tunnel::ErrorType;
pub use tunnel::InvalidDomExceptionName;
pub use type_error::type_error_message;
pub use type_error::unimplemented_message;
pub use type_error::TypeErrorContext;
pub use type_error::TypeErrorKind;
