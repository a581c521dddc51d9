#![allow(dead_code)]

use exception_js::{ErrorKind, ErrorRealm};
use std::fmt;

#[derive(Debug, PartialEq)]
pub enum ToyError {
  OutOfMemory,
}

impl fmt::Display for ToyError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ToyError::OutOfMemory => f.write_str("out of memory"),
    }
  }
}

impl std::error::Error for ToyError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToyObject(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToyClass {
  Native(ErrorKind),
  DomException(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToyErrorObject {
  pub class: ToyClass,
  pub message: String,
  /// Non-enumerable own properties, in definition order.
  pub hidden: Vec<(&'static str, bool)>,
}

impl ToyErrorObject {
  pub fn flag(&self, key: &str) -> Option<bool> {
    self
      .hidden
      .iter()
      .find(|(k, _)| *k == key)
      .map(|(_, v)| *v)
  }
}

pub struct ToyRealm {
  pub objects: Vec<ToyErrorObject>,
  pub has_dom_exception: bool,
  /// Make `DOMException` construction throw.
  pub dom_exception_fails: bool,
  /// Fail allocation once this many objects exist.
  pub max_objects: usize,
}

impl Default for ToyRealm {
  fn default() -> Self {
    Self {
      objects: Vec::new(),
      has_dom_exception: true,
      dom_exception_fails: false,
      max_objects: usize::MAX,
    }
  }
}

impl ToyRealm {
  pub fn without_dom_exception() -> Self {
    Self {
      has_dom_exception: false,
      ..Self::default()
    }
  }

  pub fn object(&self, obj: ToyObject) -> &ToyErrorObject {
    &self.objects[obj.0]
  }

  fn alloc(&mut self, class: ToyClass, message: &str) -> Result<ToyObject, ToyError> {
    if self.objects.len() >= self.max_objects {
      return Err(ToyError::OutOfMemory);
    }
    self.objects.push(ToyErrorObject {
      class,
      message: message.to_string(),
      hidden: Vec::new(),
    });
    Ok(ToyObject(self.objects.len() - 1))
  }
}

impl ErrorRealm for ToyRealm {
  type Value = ToyObject;
  type Error = ToyError;

  fn new_error(&mut self, kind: ErrorKind, message: &str) -> Result<ToyObject, ToyError> {
    self.alloc(ToyClass::Native(kind), message)
  }

  fn new_dom_exception(
    &mut self,
    name: &str,
    message: &str,
  ) -> Result<Option<ToyObject>, ToyError> {
    if !self.has_dom_exception {
      return Ok(None);
    }
    if self.dom_exception_fails {
      return Err(ToyError::OutOfMemory);
    }
    self
      .alloc(ToyClass::DomException(name.to_string()), message)
      .map(Some)
  }

  fn set_hidden_flag(
    &mut self,
    value: &ToyObject,
    key: &'static str,
    flag: bool,
  ) -> Result<(), ToyError> {
    self.objects[value.0].hidden.push((key, flag));
    Ok(())
  }
}
