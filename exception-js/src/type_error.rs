//! Binding-layer diagnostics for values of the wrong type.
//!
//! Messages follow the wording browsers use for WebIDL conversion failures, e.g.
//! `Failed to execute 'frobnicate' on 'Foo': parameter 1 is not of type 'Bar'.`

use crate::realm::{ErrorKind, ErrorRealm};
use serde::Serialize;

/// Where a mistyped value was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeErrorKind {
  MethodArgument,
  ConstructorArgument,
  SetterArgument,
  StructField,
  ArrayElement,
  CallbackArgument,
  CallbackReturn,
  DictKey,
  DictField,
  PromiseResolution,
  Other,
}

impl TypeErrorKind {
  /// Whether [`unimplemented_message`] accepts contexts of this kind.
  pub fn can_be_unimplemented(self) -> bool {
    matches!(
      self,
      TypeErrorKind::MethodArgument
        | TypeErrorKind::ConstructorArgument
        | TypeErrorKind::SetterArgument
        | TypeErrorKind::StructField
        | TypeErrorKind::CallbackArgument
    )
  }
}

/// Call-site context for a type error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeErrorContext {
  pub kind: TypeErrorKind,
  /// Interface (or struct) the member belongs to.
  pub type_name: Option<String>,
  pub member_name: Option<String>,
  /// Zero-based. Rendered one-based for parameters.
  pub argument_index: u32,
}

impl TypeErrorContext {
  fn new(
    kind: TypeErrorKind,
    type_name: Option<&str>,
    member_name: Option<&str>,
    argument_index: u32,
  ) -> Self {
    Self {
      kind,
      type_name: type_name.map(str::to_string),
      member_name: member_name.map(str::to_string),
      argument_index,
    }
  }

  pub fn method_argument(type_name: &str, method: &str, argument_index: u32) -> Self {
    Self::new(
      TypeErrorKind::MethodArgument,
      Some(type_name),
      Some(method),
      argument_index,
    )
  }

  pub fn constructor_argument(type_name: &str, argument_index: u32) -> Self {
    Self::new(
      TypeErrorKind::ConstructorArgument,
      Some(type_name),
      None,
      argument_index,
    )
  }

  pub fn setter_argument(type_name: &str, property: &str) -> Self {
    Self::new(
      TypeErrorKind::SetterArgument,
      Some(type_name),
      Some(property),
      0,
    )
  }

  pub fn struct_field(type_name: &str, field: &str) -> Self {
    Self::new(TypeErrorKind::StructField, Some(type_name), Some(field), 0)
  }

  pub fn array_element(index: u32) -> Self {
    Self::new(TypeErrorKind::ArrayElement, None, None, index)
  }

  pub fn callback_argument(argument_index: u32) -> Self {
    Self::new(TypeErrorKind::CallbackArgument, None, None, argument_index)
  }

  pub fn callback_return() -> Self {
    Self::new(TypeErrorKind::CallbackReturn, None, None, 0)
  }

  pub fn dict_key(key: &str) -> Self {
    Self::new(TypeErrorKind::DictKey, None, Some(key), 0)
  }

  pub fn dict_field(key: &str) -> Self {
    Self::new(TypeErrorKind::DictField, None, Some(key), 0)
  }

  pub fn promise_resolution() -> Self {
    Self::new(TypeErrorKind::PromiseResolution, None, None, 0)
  }

  pub fn other() -> Self {
    Self::new(TypeErrorKind::Other, None, None, 0)
  }

  fn type_name(&self) -> &str {
    self.type_name.as_deref().unwrap_or("")
  }

  fn member_name(&self) -> &str {
    self.member_name.as_deref().unwrap_or("")
  }

  fn parameter(&self) -> u64 {
    u64::from(self.argument_index) + 1
  }
}

/// Renders the message for a value that is not of type `expected_type`.
pub fn type_error_message(context: &TypeErrorContext, expected_type: &str) -> String {
  let ty = context.type_name();
  let member = context.member_name();
  match context.kind {
    TypeErrorKind::MethodArgument => format!(
      "Failed to execute '{member}' on '{ty}': parameter {} is not of type '{expected_type}'.",
      context.parameter()
    ),
    TypeErrorKind::ConstructorArgument => format!(
      "Failed to construct '{ty}': constructor parameter {} is not of type '{expected_type}'.",
      context.parameter()
    ),
    TypeErrorKind::SetterArgument => format!(
      "Failed to set the '{member}' property on '{ty}': the provided value is not of type \
       '{expected_type}'."
    ),
    TypeErrorKind::StructField => format!(
      "Incorrect type for the '{member}' field on '{ty}': the provided value is not of type \
       '{expected_type}'."
    ),
    TypeErrorKind::ArrayElement => format!(
      "Incorrect type for array element {}: the provided value is not of type '{expected_type}'.",
      context.argument_index
    ),
    TypeErrorKind::CallbackArgument => format!(
      "Failed to execute function: parameter {} is not of type '{expected_type}'.",
      context.parameter()
    ),
    TypeErrorKind::CallbackReturn => {
      format!("Callback returned incorrect type; expected '{expected_type}'")
    }
    TypeErrorKind::DictKey => format!(
      "Incorrect type for map entry '{member}': the provided key is not of type '{expected_type}'."
    ),
    TypeErrorKind::DictField => format!(
      "Incorrect type for map entry '{member}': the provided value is not of type \
       '{expected_type}'."
    ),
    TypeErrorKind::PromiseResolution => format!(
      "Incorrect type for Promise: the Promise did not resolve to '{expected_type}'."
    ),
    TypeErrorKind::Other => {
      format!("Incorrect type: the provided value is not of type '{expected_type}'.")
    }
  }
}

/// Renders the message for an argument, property or field the implementation doesn't support.
///
/// # Panics
///
/// Only method/constructor/callback arguments, setters and struct fields can be unimplemented.
/// Any other context is a bug in the bindings.
pub fn unimplemented_message(context: &TypeErrorContext) -> String {
  let ty = context.type_name();
  let member = context.member_name();
  match context.kind {
    TypeErrorKind::MethodArgument => format!(
      "Failed to execute '{member}' on '{ty}': parameter {} is not implemented.",
      context.parameter()
    ),
    TypeErrorKind::ConstructorArgument => format!(
      "Failed to construct '{ty}': constructor parameter {} is not implemented.",
      context.parameter()
    ),
    TypeErrorKind::SetterArgument => format!(
      "Failed to set the '{member}' property on '{ty}': the ability to set this property is not \
       implemented."
    ),
    TypeErrorKind::StructField => format!("The '{member}' field on '{ty}' is not implemented."),
    TypeErrorKind::CallbackArgument => format!(
      "Failed to execute function: parameter {} is not implemented.",
      context.parameter()
    ),
    TypeErrorKind::ArrayElement
    | TypeErrorKind::CallbackReturn
    | TypeErrorKind::DictKey
    | TypeErrorKind::DictField
    | TypeErrorKind::PromiseResolution
    | TypeErrorKind::Other => {
      unreachable!("{:?} values cannot be unimplemented", context.kind)
    }
  }
}

/// Short name of `T`: module path and generic arguments are stripped.
pub fn type_name<T: ?Sized>() -> &'static str {
  short_type_name(std::any::type_name::<T>())
}

fn short_type_name(full: &'static str) -> &'static str {
  let base = match full.find('<') {
    Some(idx) => &full[..idx],
    None => full,
  };
  match base.rfind(':') {
    Some(idx) => &base[idx + 1..],
    None => base,
  }
}

/// Builds a `TypeError` for a value that is not of type `expected_type`.
pub fn new_type_error<R: ErrorRealm>(
  realm: &mut R,
  context: &TypeErrorContext,
  expected_type: &str,
) -> Result<R::Value, R::Error> {
  realm.new_error(
    ErrorKind::TypeError,
    &type_error_message(context, expected_type),
  )
}

/// Builds a plain `Error` for an unimplemented argument, property or field.
pub fn new_unimplemented_error<R: ErrorRealm>(
  realm: &mut R,
  context: &TypeErrorContext,
) -> Result<R::Value, R::Error> {
  realm.new_error(ErrorKind::Error, &unimplemented_message(context))
}
