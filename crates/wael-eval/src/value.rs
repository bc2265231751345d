//! Runtime values.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use wael_types::ast::{LambdaExpr, Params};

use crate::env::ScopeId;
use crate::error::EvalResult;
use crate::geometry::Geometry;
use crate::geojson;

/// Module field that holds the value an import expression evaluated to.
pub const DEFAULT_EXPORT: &str = "Default";

/// A module: exported names in the order they were staged.
pub type ModuleFields = IndexMap<String, Value>;

/// Every runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    String(String),
    Geometry(Geometry),
    Function(FunctionValue),
    Module(Rc<ModuleFields>),
    /// `undefined`: unbound names, missing arguments, `EMPTY`.
    Unit,
}

/// Callable values.
#[derive(Debug, Clone)]
pub enum FunctionValue {
    /// A lambda plus the frame it was created in.
    Closure(Rc<Closure>),
    /// A builtin implemented in Rust.
    Native(NativeFn),
    /// `f:bind(a, b)`
    Bound(Rc<BoundFunction>),
}

#[derive(Debug)]
pub struct Closure {
    pub lambda: Rc<LambdaExpr>,
    pub fn_scope: ScopeId,
}

#[derive(Debug)]
pub struct BoundFunction {
    pub target: FunctionValue,
    pub args: Vec<Value>,
}

/// Signature of a builtin.
pub type NativeImpl = fn(&[Value]) -> EvalResult<Value>;

#[derive(Clone, Copy)]
pub struct NativeFn {
    pub name: &'static str,
    pub func: NativeImpl,
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn({})", self.name)
    }
}

impl FunctionValue {
    fn same(&self, other: &FunctionValue) -> bool {
        match (self, other) {
            (FunctionValue::Closure(a), FunctionValue::Closure(b)) => Rc::ptr_eq(a, b),
            (FunctionValue::Bound(a), FunctionValue::Bound(b)) => Rc::ptr_eq(a, b),
            (FunctionValue::Native(a), FunctionValue::Native(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Display for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionValue::Closure(closure) => match &closure.lambda.params {
                Params::Positional(names) => {
                    let names: Vec<&str> = names.iter().map(|n| n.name.as_str()).collect();
                    write!(f, "[Function ({})]", names.join(", "))
                }
                Params::Spread(name) => write!(f, "[Function (...{})]", name.name),
            },
            FunctionValue::Native(native) => write!(f, "[Function {}]", native.name),
            FunctionValue::Bound(bound) => match &bound.target {
                FunctionValue::Native(native) => write!(f, "[Function bound {}]", native.name),
                _ => f.write_str("[Function bound]"),
            },
        }
    }
}

/// Format a number the way results are shown: `1`, `0.5`, `NaN`, `-Infinity`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

impl Value {
    pub fn native(name: &'static str, func: NativeImpl) -> Value {
        Value::Function(FunctionValue::Native(NativeFn { name, func }))
    }

    pub fn module(fields: ModuleFields) -> Value {
        Value::Module(Rc::new(fields))
    }

    /// Name of the value's kind, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Geometry(g) => g.kind().name(),
            Value::Function(_) => "function",
            Value::Module(_) => "module",
            Value::Unit => "undefined",
        }
    }

    /// `Unit`, `false`, `0`, `NaN` and `""` are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Unit => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_geometry(&self) -> Option<&Geometry> {
        match self {
            Value::Geometry(g) => Some(g),
            _ => None,
        }
    }

    /// Structured form of the value: GeoJSON for geometries.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Geometry(g) => geojson::to_geojson(g),
            Value::Function(func) => serde_json::Value::String(func.to_string()),
            Value::Module(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
            Value::Unit => serde_json::Value::Null,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Geometry(a), Value::Geometry(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.same(b),
            (Value::Module(a), Value::Module(b)) => a == b,
            (Value::Unit, Value::Unit) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::String(s) => f.write_str(s),
            Value::Geometry(g) => write!(f, "{g}"),
            Value::Function(func) => write!(f, "{func}"),
            Value::Module(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Unit => f.write_str("undefined"),
        }
    }
}

impl From<Geometry> for Value {
    fn from(g: Geometry) -> Self {
        Value::Geometry(g)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn first(args: &[Value]) -> EvalResult<Value> {
        Ok(args.first().cloned().unwrap_or(Value::Unit))
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(1.311235981941714), "1.311235981941714");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::String("a b".into()).to_string(), "a b");
        assert_eq!(Value::Unit.to_string(), "undefined");
        assert_eq!(Value::from(Geometry::point(1.0, 2.0)).to_string(), "POINT (1 2)");
        assert_eq!(Value::native("Flatten", first).to_string(), "[Function Flatten]");

        let mut fields = ModuleFields::new();
        fields.insert("a".into(), Value::Number(3.0));
        fields.insert(DEFAULT_EXPORT.into(), Value::Number(4.0));
        assert_eq!(Value::module(fields).to_string(), "{a: 3, Default: 4}");
    }

    #[test]
    fn test_truthiness() {
        for falsy in [
            Value::Unit,
            Value::Boolean(false),
            Value::Number(0.0),
            Value::Number(f64::NAN),
            Value::String(String::new()),
        ] {
            assert!(!falsy.is_truthy(), "{falsy:?}");
        }
        for truthy in [
            Value::Boolean(true),
            Value::Number(-1.0),
            Value::String("0".into()),
            Value::from(Geometry::GeometryCollection(vec![])),
            Value::native("f", first),
        ] {
            assert!(truthy.is_truthy(), "{truthy:?}");
        }
    }

    #[test]
    fn test_equality() {
        assert_eq!(Value::Unit, Value::Unit);
        assert_ne!(Value::Unit, Value::Boolean(false));
        assert_ne!(Value::Number(1.0), Value::String("1".into()));
        assert_eq!(
            Value::from(Geometry::point(1.0, 1.0)),
            Value::from(Geometry::point(1.0, 1.0))
        );
        assert_eq!(Value::native("f", first), Value::native("f", first));
        assert_ne!(Value::native("f", first), Value::native("g", first));
    }

    #[test]
    fn test_to_json() {
        let mut fields = ModuleFields::new();
        fields.insert("p".into(), Value::from(Geometry::point(1.0, 2.0)));
        fields.insert("n".into(), Value::Unit);
        assert_eq!(
            Value::module(fields).to_json(),
            json!({"p": {"type": "Point", "coordinates": [1.0, 2.0]}, "n": null})
        );
        assert_eq!(Value::Number(f64::NAN).to_json(), serde_json::Value::Null);
    }
}
