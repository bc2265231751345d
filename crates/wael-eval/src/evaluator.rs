//! Core expression evaluator.

use std::rc::Rc;

use wael_types::ast::*;

use crate::env::{ScopeId, Scopes};
use crate::error::{EvalError, EvalResult};
use crate::geometry::{Coord, Geometry};
use crate::ops;
use crate::session::EvalOptions;
use crate::value::{BoundFunction, Closure, FunctionValue, ModuleFields, Value, DEFAULT_EXPORT};

/// The core evaluator: walks AST nodes and produces Values.
///
/// `current` is the frame that identifiers resolve against. Function
/// calls and imports move it and always put it back, on success or error.
pub struct Evaluator {
    /// Every frame of the session.
    pub scopes: Scopes,
    /// The frame active right now.
    pub(crate) current: ScopeId,
    pub(crate) options: EvalOptions,
}

impl Evaluator {
    /// Create an evaluator with an empty global frame.
    pub fn new(options: EvalOptions) -> Self {
        let scopes = Scopes::new();
        let current = scopes.global();
        Self {
            scopes,
            current,
            options,
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Point the current-scope register back at the global frame.
    pub fn reset(&mut self) {
        self.current = self.scopes.global();
    }

    // ══════════════════════════════════════════════════════════════════════
    // Programs
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate every statement in order; the result is the last value.
    pub fn eval_program(&mut self, program: &Program) -> EvalResult<Value> {
        let mut last = Value::Unit;
        for stmt in &program.body {
            last = self.eval_expr(stmt)?;
        }
        Ok(last)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression to a Value.
    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::NumberLit(n) => Ok(Value::Number(*n)),
            ExprKind::StringLit(s) => Ok(Value::String(s.clone())),
            ExprKind::BoolLit(b) => Ok(Value::Boolean(*b)),
            ExprKind::EmptyLit => Ok(Value::Unit),

            ExprKind::Geometry { kind, members } => self.eval_geometry(*kind, members.as_deref()),
            ExprKind::KindName(kind) => Ok(Value::String(kind.name().to_string())),
            ExprKind::PointPair { x, y } => self.eval_point_pair(x, y),
            ExprKind::Collection(members) => {
                let values = self.eval_items(members)?;
                Ok(Value::Geometry(ops::construct(
                    GeometryKind::GeometryCollection,
                    &values,
                )?))
            }

            ExprKind::Identifier(name) => Ok(self.scopes.resolve(self.current, name)),
            ExprKind::Assign {
                target,
                value,
                export,
                local,
            } => self.eval_assign(target, value, *export, *local),
            ExprKind::Sequence(stmts) => {
                let mut last = Value::Unit;
                for stmt in stmts {
                    last = self.eval_expr(stmt)?;
                }
                Ok(last)
            }

            ExprKind::Call { callee, args } => {
                let callee = self.eval_expr(callee)?;
                let args = self.eval_items(args)?;
                self.call_value(&callee, args)
            }
            ExprKind::Accessor { object, name, args } => {
                self.eval_accessor(object, &name.name, args.as_deref())
            }

            ExprKind::Binary { left, op, right } => self.eval_binary(left, *op, right),
            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand),
            ExprKind::Pipe {
                value,
                op,
                function,
            } => self.eval_pipe(value, *op, function),
            ExprKind::Generate { count, producer } => self.eval_generate(count, producer),

            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.eval_if(condition, then_branch, else_branch.as_deref()),

            ExprKind::Lambda(lambda) => Ok(self.make_closure(lambda)),
            ExprKind::Import { source, names } => self.eval_import(source, names.as_ref()),

            ExprKind::Paren(inner) => self.eval_expr(inner),
        }
    }

    /// Evaluate a list of expressions left to right.
    pub(crate) fn eval_items(&mut self, items: &[Expr]) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(self.eval_expr(item)?);
        }
        Ok(values)
    }

    // ── Geometry ──────────────────────────────────────────────────────────

    fn eval_geometry(&mut self, kind: GeometryKind, members: Option<&[Expr]>) -> EvalResult<Value> {
        let Some(members) = members else {
            return Ok(Value::Geometry(Geometry::empty(kind)));
        };
        let values = self.eval_items(members)?;
        Ok(Value::Geometry(ops::construct(kind, &values)?))
    }

    fn eval_point_pair(&mut self, x: &Expr, y: &Expr) -> EvalResult<Value> {
        let xv = self.eval_expr(x)?;
        let yv = self.eval_expr(y)?;
        match (&xv, &yv) {
            (Value::Number(x), Value::Number(y)) => Ok(Value::Geometry(Geometry::point(*x, *y))),
            _ => Err(EvalError::type_mismatch(format!(
                "point coordinates must be numbers but got: {xv} {yv}"
            ))),
        }
    }

    // ── Bindings ──────────────────────────────────────────────────────────

    fn eval_assign(
        &mut self,
        target: &Ident,
        value: &Expr,
        export: bool,
        local: bool,
    ) -> EvalResult<Value> {
        let value = self.eval_expr(value)?;
        let public = if export {
            Some(true)
        } else if local {
            Some(false)
        } else {
            None
        };
        self.scopes
            .store(self.current, &target.name, value.clone(), public, !local);
        Ok(value)
    }

    // ── Operators ─────────────────────────────────────────────────────────

    fn eval_binary(&mut self, left: &Expr, op: BinOp, right: &Expr) -> EvalResult<Value> {
        // Short-circuit logical operators.
        match op {
            BinOp::And => {
                let l = self.eval_expr(left)?;
                if !l.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                let r = self.eval_expr(right)?;
                return Ok(Value::Boolean(r.is_truthy()));
            }
            BinOp::Or => {
                let l = self.eval_expr(left)?;
                if l.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                let r = self.eval_expr(right)?;
                return Ok(Value::Boolean(r.is_truthy()));
            }
            _ => {}
        }

        let l = self.eval_expr(left)?;
        let r = self.eval_expr(right)?;
        match op {
            BinOp::Eq => Ok(Value::Boolean(l == r)),
            BinOp::NotEq => Ok(Value::Boolean(l != r)),
            BinOp::Less | BinOp::LessEq | BinOp::Greater | BinOp::GreaterEq => {
                ops::compare(op, &l, &r)
            }
            BinOp::Concat => ops::concat(&l, &r),
            _ => ops::arithmetic(op, &l, &r),
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> EvalResult<Value> {
        let value = self.eval_expr(operand)?;
        match op {
            UnaryOp::Neg => ops::negate(&value),
            UnaryOp::Not => Ok(Value::Boolean(!value.is_truthy())),
        }
    }

    // ── Control Flow ──────────────────────────────────────────────────────

    fn eval_if(
        &mut self,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: Option<&Expr>,
    ) -> EvalResult<Value> {
        match self.eval_expr(condition)? {
            Value::Boolean(true) => self.eval_expr(then_branch),
            Value::Boolean(false) => match else_branch {
                Some(branch) => self.eval_expr(branch),
                None => Ok(Value::Unit),
            },
            other => Err(EvalError::type_mismatch(format!(
                "if condition must be a boolean but got: {other}"
            ))),
        }
    }

    // ── Pipes ─────────────────────────────────────────────────────────────

    fn eval_pipe(&mut self, value: &Expr, op: PipeOp, function: &Expr) -> EvalResult<Value> {
        let value = self.eval_expr(value)?;
        let function = self.eval_expr(function)?;

        match op {
            PipeOp::Apply => self.call_value(&function, vec![value]),
            PipeOp::Coordinates => {
                let Value::Geometry(geometry) = &value else {
                    return Err(EvalError::type_mismatch(format!(
                        "'|*' expects a geometry but got: {value}"
                    )));
                };
                let mapped = geometry.try_map_coords(&mut |c| -> EvalResult<Coord> {
                    match self.call_value(&function, vec![Value::Geometry(Geometry::Point(c))])? {
                        Value::Geometry(Geometry::Point(p)) => Ok(p),
                        other => Err(EvalError::type_mismatch(format!(
                            "'|*' callback must return a Point but got: {other}"
                        ))),
                    }
                })?;
                Ok(Value::Geometry(mapped))
            }
            PipeOp::Map | PipeOp::Filter | PipeOp::Reduce => {
                let items = ops::flatten_array_like(&value)?;
                let kind = value
                    .as_geometry()
                    .map_or(GeometryKind::GeometryCollection, Geometry::kind);
                match op {
                    PipeOp::Map => self.pipe_map(kind, items, &function),
                    PipeOp::Filter => self.pipe_filter(kind, items, &function),
                    _ => self.pipe_reduce(items, &function),
                }
            }
        }
    }

    fn pipe_map(
        &mut self,
        kind: GeometryKind,
        items: Vec<Geometry>,
        function: &Value,
    ) -> EvalResult<Value> {
        let mut mapped = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let args = vec![Value::Geometry(item), Value::Number(index as f64)];
            match self.call_value(function, args)? {
                Value::Geometry(g) => mapped.push(g),
                other => {
                    return Err(EvalError::type_mismatch(format!(
                        "'||' callback must return a geometry but got: {other}"
                    )))
                }
            }
        }
        Ok(Value::Geometry(ops::rebuild_array_like(kind, mapped)))
    }

    fn pipe_filter(
        &mut self,
        kind: GeometryKind,
        items: Vec<Geometry>,
        function: &Value,
    ) -> EvalResult<Value> {
        let mut kept = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            let args = vec![Value::Geometry(item.clone()), Value::Number(index as f64)];
            if self.call_value(function, args)?.is_truthy() {
                kept.push(item);
            }
        }
        Ok(Value::Geometry(ops::rebuild_array_like(kind, kept)))
    }

    /// Left fold seeded with the first element; the callback also gets the
    /// element's index.
    fn pipe_reduce(&mut self, items: Vec<Geometry>, function: &Value) -> EvalResult<Value> {
        let mut items = items.into_iter().enumerate();
        let Some((_, seed)) = items.next() else {
            return Ok(Value::Unit);
        };
        let mut accumulator = Value::Geometry(seed);
        for (index, item) in items {
            let args = vec![accumulator, Value::Geometry(item), Value::Number(index as f64)];
            accumulator = self.call_value(function, args)?;
        }
        Ok(accumulator)
    }

    // ── Generate ──────────────────────────────────────────────────────────

    fn eval_generate(&mut self, count: &Expr, producer: &Expr) -> EvalResult<Value> {
        enum Count {
            Fixed(usize),
            While(Value),
        }

        let count = match self.eval_expr(count)? {
            Value::Number(n) if n >= 0.0 && n.fract() == 0.0 => Count::Fixed(n as usize),
            f @ Value::Function(_) => Count::While(f),
            other => {
                return Err(EvalError::type_mismatch(format!(
                    "Generate expects a non-negative integer or a function but got: {other}"
                )))
            }
        };
        let producer = match self.eval_expr(producer)? {
            p @ (Value::Function(_) | Value::Geometry(_)) => p,
            other => {
                return Err(EvalError::type_mismatch(format!(
                    "Generate expects a geometry or a function but got: {other}"
                )))
            }
        };

        let mut items = Vec::new();
        let mut index = 0usize;
        loop {
            let keep_going = match &count {
                Count::Fixed(n) => index < *n,
                Count::While(predicate) => self
                    .call_value(predicate, vec![Value::Number(index as f64)])?
                    .is_truthy(),
            };
            if !keep_going {
                break;
            }
            let produced = match &producer {
                Value::Function(_) => self.call_value(&producer, vec![Value::Number(index as f64)])?,
                fixed => fixed.clone(),
            };
            match produced {
                Value::Geometry(g) => items.push(g),
                Value::Unit => {}
                other => {
                    return Err(EvalError::type_mismatch(format!(
                        "Generate producer must return a geometry but got: {other}"
                    )))
                }
            }
            index += 1;
        }
        Ok(Value::Geometry(Geometry::GeometryCollection(items)))
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    fn eval_accessor(
        &mut self,
        object: &Expr,
        name: &str,
        args: Option<&[Expr]>,
    ) -> EvalResult<Value> {
        let value = self.eval_expr(object)?;
        let args = match args {
            Some(args) => Some(self.eval_items(args)?),
            None => None,
        };

        match value {
            Value::Function(function) => {
                if name != "bind" {
                    return Err(EvalError::unsupported(format!(
                        "method '{name}' on a function; only 'bind' is defined"
                    )));
                }
                Ok(Value::Function(bind(function, args.unwrap_or_default())))
            }
            Value::Geometry(geometry) => {
                ops::geometry_property(&geometry, name, args.as_deref().unwrap_or(&[]))
            }
            Value::Module(fields) => {
                let field = fields.get(name).cloned().unwrap_or(Value::Unit);
                match (field, args) {
                    (field @ Value::Function(_), Some(args)) => self.call_value(&field, args),
                    (field, _) => Ok(field),
                }
            }
            Value::Unit => Err(EvalError::PropertyNotFound {
                property: name.to_string(),
                target: "undefined".to_string(),
            }),
            // Plain values carry no fields.
            _ => Ok(Value::Unit),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Functions
    // ══════════════════════════════════════════════════════════════════════

    fn make_closure(&self, lambda: &Rc<LambdaExpr>) -> Value {
        Value::Function(FunctionValue::Closure(Rc::new(Closure {
            lambda: Rc::clone(lambda),
            fn_scope: self.current,
        })))
    }

    /// Call any value with the current frame as the call-site context.
    ///
    /// Modules call their `Default` export; values that are not callable
    /// evaluate to themselves.
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult<Value> {
        match callee {
            Value::Function(function) => self.call_function(function, args),
            Value::Module(fields) => match fields.get(DEFAULT_EXPORT) {
                Some(default) => {
                    let default = default.clone();
                    self.call_value(&default, args)
                }
                None => Ok(callee.clone()),
            },
            other => Ok(other.clone()),
        }
    }

    fn call_function(&mut self, function: &FunctionValue, args: Vec<Value>) -> EvalResult<Value> {
        match function {
            FunctionValue::Closure(closure) => self.call_closure(closure, args),
            FunctionValue::Native(native) => {
                tracing::trace!(name = native.name, args = args.len(), "call native");
                (native.func)(&args)
            }
            FunctionValue::Bound(bound) => {
                let mut all = bound.args.clone();
                all.extend(args);
                self.call_function(&bound.target, all)
            }
        }
    }

    /// Invoke a closure.
    ///
    /// The new frame's parent is the caller's frame; the closure's defining
    /// frame is captured for one extra level of lookup. Public bindings of
    /// the frame are staged into the caller's `available` map on return.
    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>) -> EvalResult<Value> {
        let context = self.current;
        let frame = self.scopes.push(context, []);
        self.scopes.capture(frame, closure.fn_scope);
        tracing::trace!(
            level = self.scopes.level(frame),
            args = args.len(),
            "call closure"
        );

        match &closure.lambda.params {
            Params::Positional(names) => {
                let mut args = args.into_iter();
                for name in names {
                    let value = args.next().unwrap_or(Value::Unit);
                    self.scopes.store(frame, &name.name, value, None, false);
                }
            }
            Params::Spread(name) => {
                let members = args
                    .into_iter()
                    .map(|arg| match arg {
                        Value::Geometry(g) => Ok(g),
                        other => Err(EvalError::type_mismatch(format!(
                            "spread parameter '{}' collects geometries but got: {other}",
                            name.name
                        ))),
                    })
                    .collect::<EvalResult<Vec<_>>>()?;
                let collection = Value::Geometry(Geometry::GeometryCollection(members));
                self.scopes.store(frame, &name.name, collection, None, false);
            }
        }

        self.current = frame;
        let result = self.eval_expr(&closure.lambda.body);
        self.scopes.release(frame);
        self.scopes.pop(frame, ModuleFields::new());
        self.current = context;
        result
    }
}

/// `f:bind(args)`: a function with `args` prepended to every call.
fn bind(function: FunctionValue, args: Vec<Value>) -> FunctionValue {
    match function {
        FunctionValue::Bound(bound) => {
            let mut all = bound.args.clone();
            all.extend(args);
            FunctionValue::Bound(Rc::new(BoundFunction {
                target: bound.target.clone(),
                args: all,
            }))
        }
        target => FunctionValue::Bound(Rc::new(BoundFunction { target, args })),
    }
}
