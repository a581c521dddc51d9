use assert_cmd::Command;
use serde_json::Value;

fn cli() -> Command {
  Command::cargo_bin("exception-js").unwrap()
}

fn stdout_of(cmd: &mut Command) -> String {
  let assert = cmd.assert().success();
  String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

#[test]
fn decode_prints_classification() {
  let out = stdout_of(cli().args(["decode", "remote.broken.r; jsg.TypeError: boom"]));
  assert_eq!(
    out,
    "type: TypeError\ninternal: false\nremote: true\nactor_reset: true\nmessage: boom\n"
  );
}

#[test]
fn decode_json_redacts_internal_messages() {
  let out = stdout_of(cli().args(["decode", "--json", "jsg-internal.RangeError: secret"]));
  let json: Value = serde_json::from_str(&out).unwrap();
  assert_eq!(json["classification"]["error_type"]["kind"], "RangeError");
  assert_eq!(json["classification"]["is_internal"], true);
  assert_eq!(json["message"], "internal error");
  assert_eq!(json["tunneled"], false);
  assert!(!out.contains("secret"));
}

#[test]
fn decode_json_dom_exception() {
  let out = stdout_of(cli().args(["decode", "--json", "jsg.DOMException(AbortError): stop"]));
  let json: Value = serde_json::from_str(&out).unwrap();
  assert_eq!(json["classification"]["error_type"]["kind"], "DomException");
  assert_eq!(json["classification"]["error_type"]["name"], "AbortError");
  assert_eq!(json["message"], "stop");
  assert_eq!(json["tunneled"], true);
}

#[test]
fn annotate_prints_reset_diagnostic() {
  let out = stdout_of(cli().args(["annotate", "remote.jsg.Error: x", "outputGateBroken"]));
  assert_eq!(out, "remote.broken.outputGateBroken; jsg.Error: x\n");
}

#[test]
fn encode_builds_prefix() {
  let out = stdout_of(cli().args([
    "encode",
    "--type",
    "DOMException(NotFoundError)",
    "--remote",
    "missing",
  ]));
  assert_eq!(out, "remote.jsg.DOMException(NotFoundError): missing\n");
}

#[test]
fn encode_rejects_unknown_types() {
  cli()
    .args(["encode", "--type", "EvalError", "x"])
    .assert()
    .failure();
}

#[test]
fn render_redacts_internal_errors() {
  let out = stdout_of(cli().args(["render", "remote.jsg-internal.Error: db password wrong"]));
  assert_eq!(out, "Error: internal error\nflags: remote\n");
}

#[test]
fn render_disconnected_as_connection_lost() {
  let out = stdout_of(cli().args([
    "render",
    "--kind",
    "disconnected",
    "--json",
    "jsg.TypeError: ignored",
  ]));
  let json: Value = serde_json::from_str(&out).unwrap();
  assert_eq!(json["name"], "Error");
  assert_eq!(json["message"], "Network connection lost.");
}

#[test]
fn verbose_render_logs_internal_details_to_stderr() {
  let assert = cli()
    .args(["--verbose", "render", "jsg-internal.Error: db password wrong"])
    .assert()
    .success();
  let output = assert.get_output();
  assert_eq!(
    String::from_utf8_lossy(&output.stdout),
    "Error: internal error\n"
  );
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("db password wrong"), "{stderr}");
  assert!(stderr.contains("ERROR"), "{stderr}");
}

#[test]
fn type_error_message() {
  let out = stdout_of(cli().args([
    "type-error",
    "--kind",
    "method-argument",
    "--type-name",
    "Bar",
    "--member",
    "frobnicate",
    "Foo",
  ]));
  assert_eq!(
    out,
    "Failed to execute 'frobnicate' on 'Bar': parameter 1 is not of type 'Foo'.\n"
  );
}

#[test]
fn unimplemented_message() {
  let out = stdout_of(cli().args([
    "unimplemented",
    "--kind",
    "constructor-argument",
    "--type-name",
    "WebSocket",
    "--index",
    "1",
  ]));
  assert_eq!(
    out,
    "Failed to construct 'WebSocket': constructor parameter 2 is not implemented.\n"
  );
}

#[test]
fn unimplemented_rejects_unsupported_kinds() {
  cli()
    .args(["unimplemented", "--kind", "dict-key", "--member", "k"])
    .assert()
    .failure();
}
