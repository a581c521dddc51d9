mod toy;

use exception_js::type_error::{new_type_error, new_unimplemented_error};
use exception_js::{type_error_message, unimplemented_message, ErrorKind, TypeErrorContext};
use toy::{ToyClass, ToyRealm};

#[test]
fn argument_messages_are_one_based() {
  assert_eq!(
    type_error_message(&TypeErrorContext::method_argument("Bar", "frobnicate", 0), "Foo"),
    "Failed to execute 'frobnicate' on 'Bar': parameter 1 is not of type 'Foo'."
  );
  assert_eq!(
    type_error_message(&TypeErrorContext::constructor_argument("Request", 1), "RequestInit"),
    "Failed to construct 'Request': constructor parameter 2 is not of type 'RequestInit'."
  );
  assert_eq!(
    type_error_message(&TypeErrorContext::callback_argument(2), "string"),
    "Failed to execute function: parameter 3 is not of type 'string'."
  );
}

#[test]
fn array_elements_are_zero_based() {
  assert_eq!(
    type_error_message(&TypeErrorContext::array_element(4), "ArrayBuffer"),
    "Incorrect type for array element 4: the provided value is not of type 'ArrayBuffer'."
  );
}

#[test]
fn property_and_field_messages() {
  assert_eq!(
    type_error_message(&TypeErrorContext::setter_argument("Response", "status"), "number"),
    "Failed to set the 'status' property on 'Response': the provided value is not of type \
     'number'."
  );
  assert_eq!(
    type_error_message(&TypeErrorContext::struct_field("RequestInit", "method"), "string"),
    "Incorrect type for the 'method' field on 'RequestInit': the provided value is not of type \
     'string'."
  );
  assert_eq!(
    type_error_message(&TypeErrorContext::dict_key("x-custom"), "ByteString"),
    "Incorrect type for map entry 'x-custom': the provided key is not of type 'ByteString'."
  );
  assert_eq!(
    type_error_message(&TypeErrorContext::dict_field("x-custom"), "ByteString"),
    "Incorrect type for map entry 'x-custom': the provided value is not of type 'ByteString'."
  );
}

#[test]
fn contextless_messages() {
  assert_eq!(
    type_error_message(&TypeErrorContext::callback_return(), "Promise"),
    "Callback returned incorrect type; expected 'Promise'"
  );
  assert_eq!(
    type_error_message(&TypeErrorContext::promise_resolution(), "Response"),
    "Incorrect type for Promise: the Promise did not resolve to 'Response'."
  );
  assert_eq!(
    type_error_message(&TypeErrorContext::other(), "boolean"),
    "Incorrect type: the provided value is not of type 'boolean'."
  );
}

#[test]
fn unimplemented_messages() {
  assert_eq!(
    unimplemented_message(&TypeErrorContext::method_argument("Cache", "put", 2)),
    "Failed to execute 'put' on 'Cache': parameter 3 is not implemented."
  );
  assert_eq!(
    unimplemented_message(&TypeErrorContext::constructor_argument("WebSocket", 1)),
    "Failed to construct 'WebSocket': constructor parameter 2 is not implemented."
  );
  assert_eq!(
    unimplemented_message(&TypeErrorContext::setter_argument("Request", "mode")),
    "Failed to set the 'mode' property on 'Request': the ability to set this property is not \
     implemented."
  );
  assert_eq!(
    unimplemented_message(&TypeErrorContext::struct_field("RequestInit", "integrity")),
    "The 'integrity' field on 'RequestInit' is not implemented."
  );
  assert_eq!(
    unimplemented_message(&TypeErrorContext::callback_argument(0)),
    "Failed to execute function: parameter 1 is not implemented."
  );
}

#[test]
#[should_panic(expected = "cannot be unimplemented")]
fn array_elements_cannot_be_unimplemented() {
  unimplemented_message(&TypeErrorContext::array_element(0));
}

#[test]
#[should_panic(expected = "cannot be unimplemented")]
fn promise_resolution_cannot_be_unimplemented() {
  unimplemented_message(&TypeErrorContext::promise_resolution());
}

#[test]
fn realm_helpers_build_errors() {
  let mut realm = ToyRealm::default();

  let value = new_type_error(
    &mut realm,
    &TypeErrorContext::method_argument("Headers", "append", 1),
    "ByteString",
  )
  .unwrap();
  let obj = realm.object(value);
  assert_eq!(obj.class, ToyClass::Native(ErrorKind::TypeError));
  assert_eq!(
    obj.message,
    "Failed to execute 'append' on 'Headers': parameter 2 is not of type 'ByteString'."
  );

  let value =
    new_unimplemented_error(&mut realm, &TypeErrorContext::struct_field("Init", "cf")).unwrap();
  let obj = realm.object(value);
  assert_eq!(obj.class, ToyClass::Native(ErrorKind::Error));
  assert_eq!(obj.message, "The 'cf' field on 'Init' is not implemented.");
}
