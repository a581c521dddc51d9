use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use exception_js::materialize::exception_to_js_with_options;
use exception_js::realm::ErrorRealm;
use exception_js::tunnel::is_tunneled_exception;
use exception_js::{
  annotate_broken, decode, render_classification, type_error_message, unimplemented_message,
  Classification, ErrorKind, ErrorType, Exception, ExceptionKind, MaterializeOptions,
  TypeErrorContext, TypeErrorKind,
};
use serde::Serialize;
use std::convert::Infallible;
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(version, about = "Inspect tunneled exception diagnostics")]
struct Cli {
  /// Log to stderr as JSON, including full internal error details.
  #[arg(long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Classify a diagnostic string.
  Decode(DecodeArgs),
  /// Tag a diagnostic as caused by an actor reset.
  Annotate(AnnotateArgs),
  /// Build a diagnostic string from a classification.
  Encode(EncodeArgs),
  /// Show the error a script would observe for an exception.
  Render(RenderArgs),
  /// Print the message for a binding type error.
  TypeError(TypeErrorArgs),
  /// Print the message for an unimplemented argument, property or field.
  Unimplemented(ContextArgs),
}

#[derive(Args, Debug)]
struct DecodeArgs {
  message: String,

  /// Emit JSON instead of text.
  #[arg(long)]
  json: bool,
}

#[derive(Args, Debug)]
struct AnnotateArgs {
  message: String,

  /// Reset reason, with or without the `broken.` prefix.
  reason: String,
}

#[derive(Args, Debug)]
struct EncodeArgs {
  /// Error type, e.g. `TypeError` or `DOMException(AbortError)`.
  #[arg(long = "type", default_value = "Error")]
  error_type: String,

  #[arg(long)]
  internal: bool,

  #[arg(long)]
  remote: bool,

  #[arg(long)]
  actor_reset: bool,

  #[arg(default_value = "")]
  message: String,
}

#[derive(Args, Debug)]
struct RenderArgs {
  description: String,

  #[arg(long, value_enum, default_value_t = KindArg::Failed)]
  kind: KindArg,

  /// Don't log internal errors before redacting them.
  #[arg(long)]
  quiet: bool,

  /// Emit JSON instead of text.
  #[arg(long)]
  json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
  Failed,
  Overloaded,
  Disconnected,
  Unimplemented,
}

impl From<KindArg> for ExceptionKind {
  fn from(kind: KindArg) -> Self {
    match kind {
      KindArg::Failed => ExceptionKind::Failed,
      KindArg::Overloaded => ExceptionKind::Overloaded,
      KindArg::Disconnected => ExceptionKind::Disconnected,
      KindArg::Unimplemented => ExceptionKind::Unimplemented,
    }
  }
}

#[derive(Args, Debug)]
struct TypeErrorArgs {
  #[command(flatten)]
  context: ContextArgs,

  /// The type the value should have had.
  expected: String,
}

#[derive(Args, Debug)]
struct ContextArgs {
  #[arg(long, value_enum)]
  kind: ContextKindArg,

  /// Interface or struct owning the member.
  #[arg(long)]
  type_name: Option<String>,

  /// Method, property, field or map key.
  #[arg(long)]
  member: Option<String>,

  /// Zero-based argument or element index.
  #[arg(long, default_value_t = 0)]
  index: u32,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ContextKindArg {
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

impl From<ContextKindArg> for TypeErrorKind {
  fn from(kind: ContextKindArg) -> Self {
    match kind {
      ContextKindArg::MethodArgument => TypeErrorKind::MethodArgument,
      ContextKindArg::ConstructorArgument => TypeErrorKind::ConstructorArgument,
      ContextKindArg::SetterArgument => TypeErrorKind::SetterArgument,
      ContextKindArg::StructField => TypeErrorKind::StructField,
      ContextKindArg::ArrayElement => TypeErrorKind::ArrayElement,
      ContextKindArg::CallbackArgument => TypeErrorKind::CallbackArgument,
      ContextKindArg::CallbackReturn => TypeErrorKind::CallbackReturn,
      ContextKindArg::DictKey => TypeErrorKind::DictKey,
      ContextKindArg::DictField => TypeErrorKind::DictField,
      ContextKindArg::PromiseResolution => TypeErrorKind::PromiseResolution,
      ContextKindArg::Other => TypeErrorKind::Other,
    }
  }
}

impl ContextArgs {
  fn context(&self) -> TypeErrorContext {
    TypeErrorContext {
      kind: self.kind.into(),
      type_name: self.type_name.clone(),
      member_name: self.member.clone(),
      argument_index: self.index,
    }
  }
}

#[derive(Serialize)]
struct DecodeOutput<'a> {
  classification: &'a Classification,
  message: &'a str,
  tunneled: bool,
}

/// A script error as the toy realm below builds it.
#[derive(Clone, Debug, Serialize)]
struct RenderedError {
  name: String,
  message: String,
  flags: Vec<&'static str>,
}

/// Realm that records errors as plain data.
#[derive(Default)]
struct RenderRealm {
  errors: Vec<RenderedError>,
}

impl RenderRealm {
  fn push(&mut self, name: &str, message: &str) -> usize {
    self.errors.push(RenderedError {
      name: name.to_string(),
      message: message.to_string(),
      flags: Vec::new(),
    });
    self.errors.len() - 1
  }
}

impl ErrorRealm for RenderRealm {
  type Value = usize;
  type Error = Infallible;

  fn new_error(&mut self, kind: ErrorKind, message: &str) -> Result<usize, Infallible> {
    Ok(self.push(kind.name(), message))
  }

  fn new_dom_exception(&mut self, name: &str, message: &str) -> Result<Option<usize>, Infallible> {
    Ok(Some(self.push(name, message)))
  }

  fn set_hidden_flag(
    &mut self,
    value: &usize,
    key: &'static str,
    flag: bool,
  ) -> Result<(), Infallible> {
    if flag {
      self.errors[*value].flags.push(key);
    }
    Ok(())
  }
}

fn init_tracing(enabled: bool) {
  if !enabled {
    return;
  }
  let _ = tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_writer(std::io::stderr)
    .json()
    .with_ansi(false)
    .try_init();
}

fn parse_error_type(raw: &str) -> Result<ErrorType> {
  let decoded = decode(&format!("jsg.{raw}"));
  if decoded.classification.is_internal || !decoded.remainder.is_empty() {
    bail!("unknown error type '{raw}'");
  }
  Ok(decoded.classification.error_type)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn run_decode(args: DecodeArgs) -> Result<()> {
  let decoded = decode(&args.message);
  let c = &decoded.classification;
  if args.json {
    return print_json(&DecodeOutput {
      classification: c,
      message: decoded.app_message(),
      tunneled: is_tunneled_exception(&args.message),
    });
  }
  println!("type: {}", c.error_type);
  println!("internal: {}", c.is_internal);
  println!("remote: {}", c.is_from_remote);
  println!("actor_reset: {}", c.is_actor_reset);
  println!("message: {}", decoded.app_message());
  Ok(())
}

fn run_encode(args: EncodeArgs) -> Result<()> {
  let classification = Classification {
    error_type: parse_error_type(&args.error_type)?,
    is_internal: args.internal,
    is_from_remote: args.remote,
    is_actor_reset: args.actor_reset,
  };
  println!("{}", render_classification(&classification, &args.message)?);
  Ok(())
}

fn run_render(args: RenderArgs, verbose: bool) -> Result<()> {
  let exception = Exception::new(args.kind.into(), args.description.as_str());
  let options = MaterializeOptions {
    log_internal_errors: verbose && !args.quiet,
  };
  let mut realm = RenderRealm::default();
  let index = exception_to_js_with_options(&mut realm, &exception, options)
    .unwrap_or_else(|never| match never {});
  let rendered = &realm.errors[index];
  if args.json {
    return print_json(rendered);
  }
  println!("{}: {}", rendered.name, rendered.message);
  if !rendered.flags.is_empty() {
    println!("flags: {}", rendered.flags.join(", "));
  }
  Ok(())
}

fn run_unimplemented(args: ContextArgs) -> Result<()> {
  let context = args.context();
  if !context.kind.can_be_unimplemented() {
    bail!("{:?} values cannot be unimplemented", context.kind);
  }
  println!("{}", unimplemented_message(&context));
  Ok(())
}

fn main() -> ExitCode {
  match try_main() {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("{err}");
      ExitCode::FAILURE
    }
  }
}

fn try_main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);
  match cli.command {
    Command::Decode(args) => run_decode(args),
    Command::Annotate(args) => {
      println!("{}", annotate_broken(&args.message, &args.reason));
      Ok(())
    }
    Command::Encode(args) => run_encode(args),
    Command::Render(args) => run_render(args, cli.verbose),
    Command::TypeError(args) => {
      println!(
        "{}",
        type_error_message(&args.context.context(), &args.expected)
      );
      Ok(())
    }
    Command::Unimplemented(args) => run_unimplemented(args),
  }
}
