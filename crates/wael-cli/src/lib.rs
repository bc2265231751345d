//! Command-line front end for WAEL.
//!
//! Argument parsing, result rendering and the line-oriented REPL. The
//! `wael` binary is a thin wrapper over [`run`].

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use wael_eval::{EvalError, EvalOptions, Session, Value};
use wael_types::SourceFile;

/// Prompt printed when the REPL waits for a new expression.
pub const PROMPT: &str = "wael> ";

/// Ends a REPL block; everything before it is evaluated as one program.
pub const END_TOKEN: &str = ";;";

#[derive(Debug, Parser)]
#[command(name = "wael", version, about = "Evaluate WAEL geometry programs")]
pub struct Cli {
    /// Program files, evaluated in order in one session
    pub files: Vec<PathBuf>,

    /// Evaluate TEXT before any files
    #[arg(short = 'e', long = "eval", value_name = "TEXT")]
    pub eval: Option<String>,

    /// Bind NAME to Import("URI") before anything else runs
    #[arg(short = 'b', long = "bind-import", value_name = "NAME=URI")]
    pub bind_imports: Vec<String>,

    /// Start the REPL after evaluating the inputs
    #[arg(short = 'i', long)]
    pub interactive: bool,

    /// Rendering of geometry results
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Wkt)]
    pub format: OutputFormat,

    /// Shorthand for --format geojson
    #[arg(long, conflicts_with = "format")]
    pub geojson: bool,

    /// Directory that relative imports resolve against
    #[arg(short = 'C', long = "cwd", value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Bind each result to $0, $1, ...
    #[arg(long)]
    pub history: bool,

    /// Reject http(s) imports
    #[arg(long)]
    pub no_network: bool,

    /// Rendering of errors
    #[arg(long, value_enum, default_value_t = ErrorFormat::Text)]
    pub error_format: ErrorFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Wkt,
    Geojson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ErrorFormat {
    Text,
    Json,
}

impl Cli {
    /// Session settings derived from the flags.
    pub fn options(&self) -> EvalOptions {
        let mut options = EvalOptions::default()
            .with_history(self.history)
            .with_network(!self.no_network);
        if let Some(dir) = &self.cwd {
            options = options.with_working_directory(dir);
        } else if let Some(parent) = self.files.first().and_then(|f| f.parent()) {
            if !parent.as_os_str().is_empty() {
                options = options.with_working_directory(parent);
            }
        }
        options
    }

    /// Effective result rendering once `--geojson` is folded in.
    pub fn output_format(&self) -> OutputFormat {
        if self.geojson {
            OutputFormat::Geojson
        } else {
            self.format
        }
    }

    /// Source of each `--bind-import`, in order.
    pub fn import_bindings(&self) -> Result<Vec<SourceFile>, String> {
        self.bind_imports
            .iter()
            .map(String::as_str)
            .map(bind_import_source)
            .collect()
    }
}

/// Turn `NAME=URI` into the program `NAME = Import("URI")`.
pub fn bind_import_source(binding: &str) -> Result<SourceFile, String> {
    let invalid = || format!("invalid import binding \"{binding}\", expected NAME=URI");
    let (name, uri) = binding.split_once('=').ok_or_else(invalid)?;
    let (name, uri) = (name.trim(), uri.trim());
    if name.is_empty() || uri.is_empty() {
        return Err(invalid());
    }
    let uri = uri.replace('\\', "\\\\").replace('"', "\\\"");
    Ok(SourceFile::new(
        format!("<bind-import {name}>"),
        format!("{name} = Import(\"{uri}\")"),
    ))
}

// ══════════════════════════════════════════════════════════════════════════════
// Rendering
// ══════════════════════════════════════════════════════════════════════════════

/// Render a result for stdout.
pub fn render_value(value: &Value, format: OutputFormat) -> String {
    match format {
        OutputFormat::Wkt => value.to_string(),
        OutputFormat::Geojson => {
            let json = value.to_json();
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        }
    }
}

fn error_kind(err: &EvalError) -> &'static str {
    match err {
        EvalError::Syntax(_) => "SyntaxError",
        EvalError::TypeMismatch(_) => "TypeMismatch",
        EvalError::OperationNotSupported(_) => "OperationNotSupported",
        EvalError::PropertyNotFound { .. } => "PropertyNotFound",
        EvalError::ImportFailed { .. } => "ImportFailed",
    }
}

/// Render an error for stderr.
pub fn render_error(err: &EvalError, format: ErrorFormat) -> String {
    match (format, err) {
        (ErrorFormat::Text, EvalError::Syntax(list)) => {
            let mut out = String::new();
            for e in &list.errors {
                out.push_str(&format!(
                    "{}:{}: {} {}\n  | {}",
                    e.file, e.span, e.code, e.message, e.source_line
                ));
                if let Some(suggestion) = &e.suggestion {
                    out.push_str(&format!("\n  = help: {suggestion}"));
                }
                out.push('\n');
            }
            let hidden = list.total_errors.saturating_sub(list.errors.len());
            if hidden > 0 {
                out.push_str(&format!("... and {hidden} more\n"));
            }
            out.trim_end().to_string()
        }
        (ErrorFormat::Text, other) => format!("{}: {other}", error_kind(other)),
        (ErrorFormat::Json, EvalError::Syntax(list)) => serde_json::json!({
            "error": error_kind(err),
            "diagnostics": list.errors,
            "total_errors": list.total_errors,
        })
        .to_string(),
        (ErrorFormat::Json, other) => serde_json::json!({
            "error": error_kind(other),
            "message": other.to_string(),
        })
        .to_string(),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Running
// ══════════════════════════════════════════════════════════════════════════════

/// Evaluate one source in `session` and render the outcome.
pub fn execute(session: &mut Session, file: &SourceFile, cli: &Cli) -> Result<String, String> {
    session
        .evaluate_file(file)
        .map(|value| render_value(&value, cli.output_format()))
        .map_err(|err| render_error(&err, cli.error_format))
}

fn is_exit_command(line: &str) -> bool {
    line == ".exit" || line.eq_ignore_ascii_case("exit()")
}

/// Read blocks terminated by `;;` until EOF or `.exit`, evaluating each in
/// one session. Text after the terminator on the same line is discarded; an
/// unterminated block left at EOF is still evaluated.
pub fn repl<R, W, E>(
    session: &mut Session,
    cli: &Cli,
    input: R,
    out: &mut W,
    err: &mut E,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    let mut pending = String::new();
    let mut lines = input.lines();
    loop {
        if pending.is_empty() {
            write!(out, "{PROMPT}")?;
            out.flush()?;
        }
        let Some(line) = lines.next() else {
            if !pending.trim().is_empty() {
                evaluate_block(session, cli, &pending, out, err)?;
            }
            writeln!(out)?;
            return Ok(());
        };
        let line = line?;
        let trimmed = line.trim();
        if pending.is_empty() && is_exit_command(trimmed) {
            return Ok(());
        }
        if pending.is_empty() && trimmed.is_empty() {
            continue;
        }
        pending.push_str(trimmed);
        pending.push('\n');
        if let Some(end) = pending.find(END_TOKEN) {
            let block = pending[..end].to_string();
            pending.clear();
            if !block.trim().is_empty() {
                evaluate_block(session, cli, &block, out, err)?;
            }
        }
    }
}

fn evaluate_block<W: Write, E: Write>(
    session: &mut Session,
    cli: &Cli,
    block: &str,
    out: &mut W,
    err: &mut E,
) -> io::Result<()> {
    match execute(session, &SourceFile::new("<repl>", block), cli) {
        Ok(rendered) => writeln!(out, "{rendered}"),
        Err(rendered) => writeln!(err, "{rendered}"),
    }
}

/// Install the stderr subscriber when `WAEL_LOG` or `RUST_LOG` is set.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match std::env::var("WAEL_LOG") {
        Ok(directives) => EnvFilter::new(directives),
        Err(_) if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        Err(_) => return,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .with(filter)
        .init();
}

/// Every non-interactive input in evaluation order: import bindings, then
/// `--eval` text, then files.
pub fn batch_inputs(cli: &Cli) -> Result<Vec<SourceFile>, String> {
    let mut inputs = cli.import_bindings()?;
    if let Some(text) = &cli.eval {
        inputs.push(SourceFile::new("<eval>", text.as_str()));
    }
    for path in &cli.files {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("error: cannot read {}: {e}", path.display()))?;
        inputs.push(SourceFile::new(path.display().to_string(), text));
    }
    Ok(inputs)
}

/// Evaluate `inputs` in order, stopping at the first failure. Returns the
/// rendering of the last result, or `None` when there was nothing to run.
pub fn run_batch(
    session: &mut Session,
    cli: &Cli,
    inputs: &[SourceFile],
) -> Result<Option<String>, String> {
    let mut last = None;
    for file in inputs {
        tracing::debug!(file = %file.name, "evaluating");
        last = Some(execute(session, file, cli)?);
    }
    Ok(last)
}

/// Entry point shared by the binary.
pub fn run(cli: Cli) -> ExitCode {
    let mut session = Session::with_options(cli.options());

    let outcome = batch_inputs(&cli).and_then(|inputs| run_batch(&mut session, &cli, &inputs));
    let ran_inputs = match outcome {
        Ok(Some(rendered)) => {
            println!("{rendered}");
            true
        }
        Ok(None) => false,
        Err(rendered) => {
            eprintln!("{rendered}");
            return ExitCode::FAILURE;
        }
    };

    if ran_inputs && !cli.interactive {
        return ExitCode::SUCCESS;
    }
    let stdin = io::stdin();
    match repl(
        &mut session,
        &cli,
        stdin.lock(),
        &mut io::stdout(),
        &mut io::stderr(),
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
