//! Session — the host-facing entry point.
//!
//! A session owns one scope arena whose global frame carries the standard
//! library. Successive evaluations share that frame, so bindings made by
//! one program are visible to the next.

use std::path::PathBuf;

use wael_parser::parse_source;
use wael_types::SourceFile;

use crate::builtins::{standard_library, PRELUDE};
use crate::env::ScopeId;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use crate::value::Value;

/// Name bound to the result of the most recent evaluation.
pub const LAST_RESULT: &str = "$?";

/// Host settings for a session.
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Base directory for relative file imports.
    pub working_directory: PathBuf,
    /// Also bind every result as `$0`, `$1`, ...
    pub store_history: bool,
    /// Permit `http://` and `https://` imports.
    pub allow_network: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            working_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            store_history: false,
            allow_network: true,
        }
    }
}

impl EvalOptions {
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = dir.into();
        self
    }

    pub fn with_history(mut self, store_history: bool) -> Self {
        self.store_history = store_history;
        self
    }

    pub fn with_network(mut self, allow_network: bool) -> Self {
        self.allow_network = allow_network;
        self
    }
}

/// A persistent evaluation context.
pub struct Session {
    eval: Evaluator,
    /// Number of results stored as `$N`.
    history: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::with_options(EvalOptions::default())
    }

    /// Build the global frame: native bindings first, then the prelude.
    pub fn with_options(options: EvalOptions) -> Self {
        let mut eval = Evaluator::new(options);
        let global = eval.scopes.global();
        for (name, value) in standard_library() {
            eval.scopes.define(global, &name, value);
        }

        let mut session = Self { eval, history: 0 };
        let prelude = SourceFile::new("<prelude>", PRELUDE);
        if let Err(err) = session.run(&prelude) {
            tracing::error!(%err, "prelude failed to load");
        }
        session
    }

    pub fn options(&self) -> &EvalOptions {
        self.eval.options()
    }

    pub fn global(&self) -> ScopeId {
        self.eval.scopes.global()
    }

    /// Look up a global binding; unbound names give `Unit`.
    pub fn get(&self, name: &str) -> Value {
        self.eval.scopes.resolve(self.global(), name)
    }

    /// Bind a private global.
    pub fn set(&mut self, name: &str, value: Value) {
        let global = self.global();
        self.eval.scopes.define(global, name, value);
    }

    /// Evaluate source text in the global frame.
    pub fn evaluate(&mut self, source: &str) -> EvalResult<Value> {
        self.evaluate_file(&SourceFile::new("<input>", source))
    }

    /// Evaluate a named source; its name appears in syntax diagnostics.
    #[tracing::instrument(level = "debug", skip_all, fields(file = %file.name))]
    pub fn evaluate_file(&mut self, file: &SourceFile) -> EvalResult<Value> {
        let value = self.run(file)?;

        let global = self.global();
        self.eval.scopes.define(global, LAST_RESULT, value.clone());
        if self.eval.options().store_history {
            let name = format!("${}", self.history);
            self.eval.scopes.define(global, &name, value.clone());
            self.history += 1;
        }
        Ok(value)
    }

    fn run(&mut self, file: &SourceFile) -> EvalResult<Value> {
        let program = parse_source(file)
            .into_program()
            .map_err(EvalError::Syntax)?;
        let result = self.eval.eval_program(&program);
        self.eval.reset();
        if let Err(err) = &result {
            tracing::debug!(%err, "evaluation failed");
        }
        result
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// A fresh session whose global frame holds the standard library.
pub fn create_global_scope() -> Session {
    Session::new()
}

/// Evaluate `source` against `session`'s global frame.
pub fn evaluate(source: &str, session: &mut Session) -> EvalResult<Value> {
    session.evaluate(source)
}
