//! `Import(...)`: module values, files and URLs.
//!
//! Importing never copies bindings directly. A callee frame (a function
//! call or an imported program) stages its public bindings in the
//! importing frame's `available` map when it finishes; `Import` then
//! drains that map into a module value, optionally binding names.

use wael_parser::parse_source;
use wael_types::ast::{Expr, ImportNames};
use wael_types::SourceFile;

use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use crate::geojson::parse_geojson;
use crate::value::{ModuleFields, Value, DEFAULT_EXPORT};

impl Evaluator {
    pub(crate) fn eval_import(
        &mut self,
        source: &Expr,
        names: Option<&ImportNames>,
    ) -> EvalResult<Value> {
        let value = match self.eval_expr(source)? {
            Value::String(uri) => self.import_external(&uri)?,
            other => other,
        };

        match names {
            None => {
                let mut fields = self.scopes.consume_available(self.current, None);
                if fields.is_empty() {
                    return Ok(value);
                }
                if !value.is_unit() {
                    fields.insert(DEFAULT_EXPORT.to_string(), value);
                }
                Ok(Value::module(fields))
            }
            Some(ImportNames::All) => Ok(Value::module(
                self.scopes.use_available(self.current, None),
            )),
            Some(ImportNames::Named(idents)) => {
                let names: Vec<String> = idents.iter().map(|i| i.name.clone()).collect();
                Ok(Value::module(
                    self.scopes.use_available(self.current, Some(&names)),
                ))
            }
        }
    }

    /// Load `uri` and return its value. Its exports end up staged in the
    /// current frame.
    ///
    /// GeoJSON documents become a geometry with no exports; anything else
    /// is evaluated as a WAEL program in a fresh child of the global frame.
    pub(crate) fn import_external(&mut self, uri: &str) -> EvalResult<Value> {
        let text = self.read_import(uri)?;
        let importer = self.current;

        if let Ok(geometry) = parse_geojson(&text) {
            tracing::debug!(uri, "imported GeoJSON");
            self.scopes.stage(importer, ModuleFields::new());
            return Ok(Value::Geometry(geometry));
        }

        let file = SourceFile::new(uri, &text);
        let program = parse_source(&file)
            .into_program()
            .map_err(|errors| EvalError::import_failed(uri, errors))?;

        let frame = self.scopes.push(self.scopes.global(), []);
        self.current = frame;
        let result = self.eval_program(&program);
        self.current = importer;
        self.scopes.pop_into(frame, importer, ModuleFields::new());

        tracing::debug!(uri, ok = result.is_ok(), "imported program");
        result.map_err(|err| EvalError::import_failed(uri, err))
    }

    fn read_import(&self, uri: &str) -> EvalResult<String> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            if !self.options.allow_network {
                return Err(EvalError::import_failed(uri, "network imports are disabled"));
            }
            let response = ureq::get(uri)
                .call()
                .map_err(|e| EvalError::import_failed(uri, e))?;
            return response
                .into_string()
                .map_err(|e| EvalError::import_failed(uri, e));
        }

        let path = self.options.working_directory.join(uri);
        std::fs::read_to_string(&path).map_err(|e| EvalError::import_failed(uri, e))
    }
}
