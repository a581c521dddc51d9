use exception_js::{
  annotate_broken, decode, decode_classification, render_classification, Classification,
  ErrorType,
};
use proptest::prelude::*;

fn arb_error_type() -> impl Strategy<Value = ErrorType> {
  prop_oneof![
    Just(ErrorType::Error),
    Just(ErrorType::RangeError),
    Just(ErrorType::TypeError),
    Just(ErrorType::SyntaxError),
    Just(ErrorType::ReferenceError),
    Just(ErrorType::CompileError),
    Just(ErrorType::LinkError),
    Just(ErrorType::RuntimeError),
    "[A-Za-z]{1,12}".prop_map(ErrorType::DomException),
  ]
}

fn arb_classification() -> impl Strategy<Value = Classification> {
  (arb_error_type(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
    |(error_type, is_internal, is_from_remote, is_actor_reset)| Classification {
      error_type,
      is_internal,
      is_from_remote,
      is_actor_reset,
    },
  )
}

/// Strings built from protocol tokens, so the interesting branches are actually reached.
fn arb_diagnostic() -> impl Strategy<Value = String> {
  let token = prop_oneof![
    Just("remote.".to_string()),
    Just("broken.".to_string()),
    Just("; ".to_string()),
    Just("jsg.".to_string()),
    Just("cfjs-internal.".to_string()),
    Just("expected ".to_string()),
    Just("remote exception: ".to_string()),
    Just("DOMException(".to_string()),
    Just(")".to_string()),
    Just("TypeError".to_string()),
    Just(": ".to_string()),
    "\\PC{0,6}",
  ];
  prop::collection::vec(token, 0..10).prop_map(|parts| parts.concat())
}

proptest! {
  #[test]
  fn decode_is_total(message in arb_diagnostic()) {
    let decoded = decode(&message);
    if decoded.classification.is_internal {
      prop_assert_eq!(decoded.app_message(), "internal error");
    }
  }

  #[test]
  fn decode_accepts_arbitrary_text(message in "\\PC*") {
    let _ = decode(&message);
  }

  #[test]
  fn annotate_sets_reset_and_keeps_the_rest(
    message in arb_diagnostic(),
    reason in "[a-zA-Z]{1,12}",
  ) {
    let before = decode_classification(&message);
    let after = decode_classification(&annotate_broken(&message, &reason));
    prop_assert!(after.is_actor_reset);
    prop_assert_eq!(after.is_from_remote, before.is_from_remote);
    prop_assert_eq!(after.is_internal, before.is_internal);
    prop_assert_eq!(after.error_type, before.error_type);
  }

  #[test]
  fn render_then_decode_recovers_classification(
    classification in arb_classification(),
    message in "([^ ][^;]{0,20})?",
  ) {
    let decoded = decode(&render_classification(&classification, &message).unwrap());
    prop_assert_eq!(&decoded.classification, &classification);
    if !classification.is_internal {
      prop_assert_eq!(decoded.app_message(), message.as_str());
    }
  }
}
