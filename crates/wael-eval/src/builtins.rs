//! Native bindings seeded into every global scope.

use std::f64::consts;

use crate::error::{EvalError, EvalResult};
use crate::geometry::{Coord, Geometry};
use crate::value::{ModuleFields, Value};

/// The language-level helpers evaluated into the global frame after the
/// natives are bound.
pub const PRELUDE: &str = include_str!("prelude.wael");

// ── Argument helpers ──────────────────────────────────────────────────────────

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Unit)
}

fn number(args: &[Value], index: usize, function: &str) -> EvalResult<f64> {
    match args.get(index) {
        Some(Value::Number(n)) => Ok(*n),
        other => Err(EvalError::type_mismatch(format!(
            "{function} expects a number for argument {} but got: {}",
            index + 1,
            other.unwrap_or(&Value::Unit)
        ))),
    }
}

/// A number argument that falls back to `default` when missing.
fn number_or(args: &[Value], index: usize, default: f64, function: &str) -> EvalResult<f64> {
    match args.get(index) {
        None | Some(Value::Unit) => Ok(default),
        _ => number(args, index, function),
    }
}

fn geometry(args: &[Value], index: usize, function: &str) -> EvalResult<Geometry> {
    match args.get(index) {
        Some(Value::Geometry(g)) => Ok(g.clone()),
        other => Err(EvalError::type_mismatch(format!(
            "{function} expects a geometry for argument {} but got: {}",
            index + 1,
            other.unwrap_or(&Value::Unit)
        ))),
    }
}

/// Upper bound on the points a single generator builtin may produce.
pub const MAX_GENERATED_POINTS: usize = 1 << 24;

/// A non-negative whole-number count, bounded by [`MAX_GENERATED_POINTS`].
fn point_count(args: &[Value], index: usize, function: &str) -> EvalResult<usize> {
    let n = number(args, index, function)?;
    if !n.is_finite() || n < 0.0 || n.fract() != 0.0 {
        return Err(EvalError::type_mismatch(format!(
            "{function} expects a non-negative integer for argument {} but got: {n}",
            index + 1
        )));
    }
    if n > MAX_GENERATED_POINTS as f64 {
        return Err(EvalError::unsupported(format!(
            "{function} count {n} exceeds {MAX_GENERATED_POINTS} points"
        )));
    }
    Ok(n as usize)
}

fn numbers(args: &[Value], function: &str) -> EvalResult<Vec<f64>> {
    (0..args.len()).map(|i| number(args, i, function)).collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// Math
// ══════════════════════════════════════════════════════════════════════════════

/// `Math.round`: halves round up, towards positive infinity.
pub fn round_half_up(n: f64) -> f64 {
    (n + 0.5).floor()
}

macro_rules! unary_math {
    ($fields:ident; $($name:literal => $f:expr),* $(,)?) => {
        $(
            $fields.insert(
                $name.to_string(),
                Value::native($name, |args| Ok(Value::Number(($f)(number(args, 0, $name)?)))),
            );
        )*
    };
}

fn math_module() -> Value {
    let mut fields = ModuleFields::new();
    for (name, value) in [
        ("PI", consts::PI),
        ("E", consts::E),
        ("LN2", consts::LN_2),
        ("LN10", consts::LN_10),
        ("LOG2E", consts::LOG2_E),
        ("LOG10E", consts::LOG10_E),
        ("SQRT2", consts::SQRT_2),
        ("SQRT1_2", consts::FRAC_1_SQRT_2),
    ] {
        fields.insert(name.to_string(), Value::Number(value));
    }

    unary_math!(fields;
        "abs" => f64::abs,
        "acos" => f64::acos,
        "acosh" => f64::acosh,
        "asin" => f64::asin,
        "asinh" => f64::asinh,
        "atan" => f64::atan,
        "atanh" => f64::atanh,
        "cbrt" => f64::cbrt,
        "ceil" => f64::ceil,
        "cos" => f64::cos,
        "cosh" => f64::cosh,
        "exp" => f64::exp,
        "floor" => f64::floor,
        "log" => f64::ln,
        "log10" => f64::log10,
        "log2" => f64::log2,
        "round" => round_half_up,
        "sign" => |n: f64| if n == 0.0 || n.is_nan() { n } else { n.signum() },
        "sin" => f64::sin,
        "sinh" => f64::sinh,
        "sqrt" => f64::sqrt,
        "tan" => f64::tan,
        "tanh" => f64::tanh,
        "trunc" => f64::trunc,
    );

    fields.insert(
        "atan2".to_string(),
        Value::native("atan2", |args| {
            Ok(Value::Number(
                number(args, 0, "atan2")?.atan2(number(args, 1, "atan2")?),
            ))
        }),
    );
    fields.insert(
        "pow".to_string(),
        Value::native("pow", |args| {
            Ok(Value::Number(
                number(args, 0, "pow")?.powf(number(args, 1, "pow")?),
            ))
        }),
    );
    fields.insert(
        "hypot".to_string(),
        Value::native("hypot", |args| {
            let sum: f64 = numbers(args, "hypot")?.iter().map(|n| n * n).sum();
            Ok(Value::Number(sum.sqrt()))
        }),
    );
    fields.insert(
        "max".to_string(),
        Value::native("max", |args| {
            Ok(Value::Number(
                numbers(args, "max")?
                    .into_iter()
                    .fold(f64::NEG_INFINITY, f64::max),
            ))
        }),
    );
    fields.insert(
        "min".to_string(),
        Value::native("min", |args| {
            Ok(Value::Number(
                numbers(args, "min")?.into_iter().fold(f64::INFINITY, f64::min),
            ))
        }),
    );
    fields.insert(
        "random".to_string(),
        Value::native("random", |_| Ok(Value::Number(rand::random::<f64>()))),
    );

    Value::module(fields)
}

// ══════════════════════════════════════════════════════════════════════════════
// Geometry builtins
// ══════════════════════════════════════════════════════════════════════════════

fn flatten(args: &[Value]) -> EvalResult<Value> {
    Ok(match arg(args, 0) {
        Value::Geometry(g) => Value::Geometry(g.flatten()),
        other => other,
    })
}

fn point_circle(args: &[Value]) -> EvalResult<Value> {
    let radius = number(args, 0, "PointCircle")?;
    let count = point_count(args, 1, "PointCircle")?;
    let step = (2.0 * consts::PI) / count as f64;
    let points = (0..count)
        .map(|i| {
            let angle = i as f64 * step;
            Geometry::point(radius * angle.cos(), radius * angle.sin())
        })
        .collect();
    Ok(Value::Geometry(Geometry::GeometryCollection(points)))
}

/// One collection per column, each holding that column's points.
fn point_grid(args: &[Value]) -> EvalResult<Value> {
    let columns = point_count(args, 0, "PointGrid")?;
    let rows = point_count(args, 1, "PointGrid")?;
    let spacing = number_or(args, 2, 1.0, "PointGrid")?;
    match columns.checked_mul(rows) {
        Some(total) if total <= MAX_GENERATED_POINTS => {}
        _ => {
            return Err(EvalError::unsupported(format!(
                "PointGrid of {columns} by {rows} exceeds {MAX_GENERATED_POINTS} points"
            )))
        }
    }
    let grid = (0..columns)
        .map(|i| {
            let column = (0..rows)
                .map(|j| Geometry::point(i as f64 * spacing, j as f64 * spacing))
                .collect();
            Geometry::GeometryCollection(column)
        })
        .collect();
    Ok(Value::Geometry(Geometry::GeometryCollection(grid)))
}

/// Rotate every coordinate around `origin`, clockwise for positive degrees.
pub fn rotate(degrees: f64, origin: Coord, geometry: &Geometry) -> Geometry {
    let radians = (degrees * consts::PI) / -180.0;
    let (sin, cos) = radians.sin_cos();
    geometry.map_coords(|p| {
        let dx = p.x - origin.x;
        let dy = p.y - origin.y;
        Coord::new(
            origin.x + dx * cos - dy * sin,
            origin.y + dx * sin + dy * cos,
        )
    })
}

fn rotate_native(args: &[Value]) -> EvalResult<Value> {
    let degrees = number(args, 0, "_Rotate")?;
    let origin = match arg(args, 1) {
        Value::Unit => Coord::new(0.0, 0.0),
        Value::Geometry(Geometry::Point(c)) => c,
        other => {
            return Err(EvalError::type_mismatch(format!(
                "_Rotate expects a point origin but got: {other}"
            )))
        }
    };
    let target = geometry(args, 2, "_Rotate")?;
    Ok(Value::Geometry(rotate(degrees, origin, &target)))
}

/// Round to `precision` decimal places, halves up.
pub fn round_to(precision: f64, n: f64) -> f64 {
    let factor = 10f64.powf(precision);
    round_half_up(n * factor) / factor
}

fn round_native(args: &[Value]) -> EvalResult<Value> {
    let precision = number_or(args, 0, 0.0, "_Round")?;
    match arg(args, 1) {
        Value::Number(n) => Ok(Value::Number(round_to(precision, n))),
        Value::Geometry(g) => Ok(Value::Geometry(
            g.map_coords(|c| Coord::new(round_to(precision, c.x), round_to(precision, c.y))),
        )),
        other => Err(EvalError::unsupported(format!(
            "unable to round value: {other}"
        ))),
    }
}

fn points_equal(args: &[Value]) -> EvalResult<Value> {
    let equal = match (arg(args, 0), arg(args, 1)) {
        (Value::Geometry(Geometry::Point(a)), Value::Geometry(Geometry::Point(b))) => a == b,
        _ => false,
    };
    Ok(Value::Boolean(equal))
}

fn point_list(args: &[Value], function: &str) -> EvalResult<Vec<Coord>> {
    let value = arg(args, 0);
    value
        .as_geometry()
        .and_then(Geometry::point_list)
        .ok_or_else(|| {
            EvalError::type_mismatch(format!(
                "{function} expects a geometry with a points list but got: {value}"
            ))
        })
}

fn to_line_string(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Geometry(Geometry::LineString(point_list(args, "ToLineString")?)))
}

fn to_multi_point(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Geometry(Geometry::MultiPoint(point_list(args, "ToMultiPoint")?)))
}

fn to_polygon(args: &[Value]) -> EvalResult<Value> {
    let mut ring = point_list(args, "ToPolygon")?;
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
    Ok(Value::Geometry(Geometry::Polygon(vec![ring])))
}

fn to_geometry_collection(args: &[Value]) -> EvalResult<Value> {
    let points = point_list(args, "ToGeometryCollection")?
        .into_iter()
        .map(Geometry::Point)
        .collect();
    Ok(Value::Geometry(Geometry::GeometryCollection(points)))
}

/// Every native binding of the global frame.
pub fn standard_library() -> Vec<(String, Value)> {
    let natives: [(&'static str, crate::value::NativeImpl); 10] = [
        ("Flatten", flatten),
        ("PointCircle", point_circle),
        ("PointGrid", point_grid),
        ("_Rotate", rotate_native),
        ("_Round", round_native),
        ("PointsEqual", points_equal),
        ("ToLineString", to_line_string),
        ("ToMultiPoint", to_multi_point),
        ("ToPolygon", to_polygon),
        ("ToGeometryCollection", to_geometry_collection),
    ];
    let mut bindings = vec![("Math".to_string(), math_module())];
    bindings.extend(
        natives
            .into_iter()
            .map(|(name, func)| (name.to_string(), Value::native(name, func))),
    );
    bindings
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lookup(name: &str) -> Value {
        standard_library()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .unwrap()
    }

    fn call(name: &str, args: &[Value]) -> EvalResult<Value> {
        match lookup(name) {
            Value::Function(crate::value::FunctionValue::Native(native)) => (native.func)(args),
            other => panic!("{name} is not native: {other}"),
        }
    }

    fn math(name: &str) -> Value {
        match lookup("Math") {
            Value::Module(fields) => fields.get(name).cloned().unwrap(),
            other => panic!("Math is not a module: {other}"),
        }
    }

    fn math_call(name: &str, args: &[Value]) -> EvalResult<Value> {
        match math(name) {
            Value::Function(crate::value::FunctionValue::Native(native)) => (native.func)(args),
            other => panic!("Math:{name} is not native: {other}"),
        }
    }

    fn n(v: f64) -> Value {
        Value::Number(v)
    }

    fn pt(x: f64, y: f64) -> Value {
        Value::Geometry(Geometry::point(x, y))
    }

    #[test]
    fn test_math_constants_and_functions() {
        assert_eq!(math("PI"), n(consts::PI));
        assert_eq!(math_call("round", &[n(consts::PI)]).unwrap(), n(3.0));
        assert_eq!(math_call("round", &[n(-2.5)]).unwrap(), n(-2.0));
        assert_eq!(math_call("max", &[n(1.0), n(5.0), n(3.0)]).unwrap(), n(5.0));
        assert_eq!(math_call("min", &[]).unwrap(), n(f64::INFINITY));
        assert_eq!(math_call("hypot", &[n(3.0), n(4.0)]).unwrap(), n(5.0));
        assert_eq!(math_call("sign", &[n(-3.0)]).unwrap(), n(-1.0));
        assert!(math_call("sqrt", &[Value::Unit]).is_err());
    }

    #[test]
    fn test_math_random_in_unit_interval() {
        for _ in 0..100 {
            let Value::Number(r) = math_call("random", &[]).unwrap() else {
                panic!("random returned a non-number");
            };
            assert!((0.0..1.0).contains(&r));
        }
    }

    #[test]
    fn test_round() {
        assert_eq!(call("_Round", &[n(0.0), n(1.255)]).unwrap(), n(1.0));
        assert_eq!(call("_Round", &[n(1.0), n(1.255)]).unwrap(), n(1.3));
        assert_eq!(call("_Round", &[Value::Unit, n(2.5)]).unwrap(), n(3.0));
        assert_eq!(
            call("_Round", &[n(1.0), pt(1.26, -0.04)]).unwrap(),
            pt(1.3, 0.0)
        );
        assert!(matches!(
            call("_Round", &[n(1.0), Value::String("x".into())]),
            Err(EvalError::OperationNotSupported(_))
        ));
    }

    #[test]
    fn test_rotate() {
        let rotated = call("_Rotate", &[n(90.0), Value::Unit, pt(1.0, 0.0)]).unwrap();
        let Value::Geometry(Geometry::Point(c)) = rotated else {
            panic!("expected a point");
        };
        assert!((c.x - 0.0).abs() < 1e-12);
        assert!((c.y - -1.0).abs() < 1e-12);

        let around = call("_Rotate", &[n(180.0), pt(1.0, 1.0), pt(2.0, 1.0)]).unwrap();
        let Value::Geometry(Geometry::Point(c)) = around else {
            panic!("expected a point");
        };
        assert!((c.x - 0.0).abs() < 1e-12);
        assert!((c.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_point_circle_and_grid() {
        let Value::Geometry(Geometry::GeometryCollection(circle)) =
            call("PointCircle", &[n(2.0), n(4.0)]).unwrap()
        else {
            panic!("expected a collection");
        };
        assert_eq!(circle.len(), 4);
        assert_eq!(circle[0], Geometry::point(2.0, 0.0));

        let grid = call("PointGrid", &[n(2.0), n(2.0), n(5.0)]).unwrap();
        assert_eq!(
            grid,
            Value::Geometry(Geometry::GeometryCollection(vec![
                Geometry::GeometryCollection(vec![
                    Geometry::point(0.0, 0.0),
                    Geometry::point(0.0, 5.0),
                ]),
                Geometry::GeometryCollection(vec![
                    Geometry::point(5.0, 0.0),
                    Geometry::point(5.0, 5.0),
                ]),
            ]))
        );
        let Value::Geometry(default_spacing) = call("PointGrid", &[n(1.0), n(2.0)]).unwrap() else {
            panic!("expected a geometry");
        };
        assert_eq!(
            default_spacing.to_string(),
            "GEOMETRYCOLLECTION (GEOMETRYCOLLECTION (POINT (0 0), POINT (0 1)))"
        );
    }

    #[test]
    fn test_generator_counts_are_validated() {
        let infinite = n(f64::INFINITY);
        assert!(matches!(
            call("PointGrid", &[infinite.clone(), n(0.0)]),
            Err(EvalError::TypeMismatch(_))
        ));
        assert!(matches!(
            call("PointCircle", &[n(1.0), infinite]),
            Err(EvalError::TypeMismatch(_))
        ));
        assert!(matches!(
            call("PointGrid", &[n(-1.0), n(2.0)]),
            Err(EvalError::TypeMismatch(_))
        ));
        assert!(matches!(
            call("PointCircle", &[n(1.0), n(2.5)]),
            Err(EvalError::TypeMismatch(_))
        ));
        assert!(matches!(
            call("PointGrid", &[n(1e10), n(1e10)]),
            Err(EvalError::OperationNotSupported(_))
        ));
        assert!(matches!(
            call("PointGrid", &[n(5000.0), n(5000.0)]),
            Err(EvalError::OperationNotSupported(_))
        ));
        assert_eq!(
            call("PointGrid", &[n(0.0), n(3.0)]).unwrap(),
            Value::Geometry(Geometry::GeometryCollection(vec![]))
        );
    }

    #[test]
    fn test_conversions() {
        let gc = Value::Geometry(Geometry::GeometryCollection(vec![
            Geometry::point(0.0, 0.0),
            Geometry::point(1.0, 0.0),
            Geometry::point(1.0, 1.0),
        ]));
        assert_eq!(
            call("ToLineString", &[gc.clone()]).unwrap().to_string(),
            "LINESTRING (0 0, 1 0, 1 1)"
        );
        assert_eq!(
            call("ToMultiPoint", &[gc.clone()]).unwrap().to_string(),
            "MULTIPOINT (0 0, 1 0, 1 1)"
        );
        assert_eq!(
            call("ToPolygon", &[gc.clone()]).unwrap().to_string(),
            "POLYGON ((0 0, 1 0, 1 1, 0 0))"
        );
        let line = call("ToLineString", &[gc]).unwrap();
        assert_eq!(
            call("ToGeometryCollection", &[line]).unwrap().to_string(),
            "GEOMETRYCOLLECTION (POINT (0 0), POINT (1 0), POINT (1 1))"
        );
        assert!(call("ToPolygon", &[pt(1.0, 1.0)]).is_err());
    }

    #[test]
    fn test_to_polygon_keeps_closed_ring() {
        let closed = Value::Geometry(Geometry::LineString(vec![
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(0.0, 0.0),
        ]));
        assert_eq!(
            call("ToPolygon", &[closed]).unwrap().to_string(),
            "POLYGON ((0 0, 1 0, 0 0))"
        );
    }

    #[test]
    fn test_points_equal_and_flatten() {
        assert_eq!(call("PointsEqual", &[pt(1.0, 2.0), pt(1.0, 2.0)]).unwrap(), Value::Boolean(true));
        assert_eq!(call("PointsEqual", &[pt(1.0, 2.0), Value::Unit]).unwrap(), Value::Boolean(false));
        assert_eq!(call("Flatten", &[n(3.0)]).unwrap(), n(3.0));
    }
}
