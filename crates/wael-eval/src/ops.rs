//! Operator semantics over evaluated values.
//!
//! Everything here is pure: operands in, new value out. Operators that
//! call back into user functions (pipes, `Generate`) live in the evaluator.

use wael_types::ast::{BinOp, GeometryKind};

use crate::error::{EvalError, EvalResult};
use crate::geometry::{Coord, CoordList, Geometry};
use crate::value::Value;

// ══════════════════════════════════════════════════════════════════════════════
// Arithmetic
// ══════════════════════════════════════════════════════════════════════════════

fn apply(op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Mod => a % b,
        BinOp::Pow => a.powf(b),
        _ => f64::NAN,
    }
}

fn apply_coord(op: BinOp, a: Coord, b: Coord) -> Coord {
    Coord::new(apply(op, a.x, b.x), apply(op, a.y, b.y))
}

fn not_supported(op: BinOp, a: &Value, b: &Value) -> EvalError {
    EvalError::unsupported(format!("{} {} {}", a, op.as_str(), b))
}

/// `+ - * / % ^` with broadcasting over geometries.
///
/// - number, number: plain arithmetic
/// - number with geometry: the number becomes `Point(n n)`
/// - point, point: componentwise
/// - two `LineString`s or two `MultiPoint`s of equal length: pairwise
/// - a point with any other geometry: the point is applied to every coordinate
pub fn arithmetic(op: BinOp, a: &Value, b: &Value) -> EvalResult<Value> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(apply(op, *x, *y))),
        (Value::Number(n), Value::Geometry(g)) => {
            geometry_arithmetic(op, &Geometry::point(*n, *n), g).ok_or_else(|| not_supported(op, a, b))
        }
        (Value::Geometry(g), Value::Number(n)) => {
            geometry_arithmetic(op, g, &Geometry::point(*n, *n)).ok_or_else(|| not_supported(op, a, b))
        }
        (Value::Geometry(ga), Value::Geometry(gb)) => {
            if let (Some(la), Some(lb)) = (pairwise_list(ga, gb), pairwise_list(gb, ga)) {
                if la.len() != lb.len() {
                    return Err(EvalError::unsupported(format!(
                        "{} {} {} (lengths {} and {} differ)",
                        a,
                        op.as_str(),
                        b,
                        la.len(),
                        lb.len()
                    )));
                }
            }
            geometry_arithmetic(op, ga, gb).ok_or_else(|| not_supported(op, a, b))
        }
        _ => Err(not_supported(op, a, b)),
    }
}

/// The coordinates of `g` when it pairs element-wise with `other`.
fn pairwise_list<'g>(g: &'g Geometry, other: &Geometry) -> Option<&'g CoordList> {
    match (g, other) {
        (Geometry::LineString(cs), Geometry::LineString(_))
        | (Geometry::MultiPoint(cs), Geometry::MultiPoint(_)) => Some(cs),
        _ => None,
    }
}

fn geometry_arithmetic(op: BinOp, a: &Geometry, b: &Geometry) -> Option<Value> {
    let result = match (a, b) {
        (Geometry::Point(p), Geometry::Point(q)) => Geometry::Point(apply_coord(op, *p, *q)),
        (Geometry::LineString(ps), Geometry::LineString(qs)) => {
            Geometry::LineString(zip_coords(op, ps, qs))
        }
        (Geometry::MultiPoint(ps), Geometry::MultiPoint(qs)) => {
            Geometry::MultiPoint(zip_coords(op, ps, qs))
        }
        (Geometry::Point(p), other) => other.map_coords(|q| apply_coord(op, *p, q)),
        (other, Geometry::Point(q)) => other.map_coords(|p| apply_coord(op, p, *q)),
        _ => return None,
    };
    Some(Value::Geometry(result))
}

fn zip_coords(op: BinOp, ps: &[Coord], qs: &[Coord]) -> CoordList {
    ps.iter()
        .zip(qs)
        .map(|(p, q)| apply_coord(op, *p, *q))
        .collect()
}

/// Unary minus: numbers and every coordinate of a geometry.
pub fn negate(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Number(n) => Ok(Value::Number(-n)),
        Value::Geometry(g) => Ok(Value::Geometry(g.map_coords(|c| Coord::new(-c.x, -c.y)))),
        other => Err(EvalError::type_mismatch(format!(
            "cannot negate a {}: {other}",
            other.type_name()
        ))),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Comparison
// ══════════════════════════════════════════════════════════════════════════════

/// `< <= > >=` on numbers only.
pub fn compare(op: BinOp, a: &Value, b: &Value) -> EvalResult<Value> {
    let (Value::Number(x), Value::Number(y)) = (a, b) else {
        let offender = if a.as_number().is_none() { a } else { b };
        return Err(EvalError::type_mismatch(format!(
            "expected a number for '{}' but got: {offender}",
            op.as_str()
        )));
    };
    let result = match op {
        BinOp::Less => x < y,
        BinOp::LessEq => x <= y,
        BinOp::Greater => x > y,
        BinOp::GreaterEq => x >= y,
        _ => return Err(EvalError::unsupported(op.as_str())),
    };
    Ok(Value::Boolean(result))
}

// ══════════════════════════════════════════════════════════════════════════════
// Concatenation
// ══════════════════════════════════════════════════════════════════════════════

/// `a ++ b`: merge two geometries, keeping the element kind where possible.
pub fn concat(a: &Value, b: &Value) -> EvalResult<Value> {
    let (Value::Geometry(ga), Value::Geometry(gb)) = (a, b) else {
        return Err(EvalError::type_mismatch(format!(
            "expected geometries for concatenation but found {a} and {b}"
        )));
    };
    let joined = |xs: &CoordList, ys: &[Coord]| -> CoordList {
        xs.iter().chain(ys).copied().collect()
    };
    let merged = match (ga, gb) {
        (Geometry::LineString(xs), Geometry::LineString(ys) | Geometry::MultiPoint(ys)) => {
            Geometry::LineString(joined(xs, ys))
        }
        (Geometry::MultiPoint(xs), Geometry::MultiPoint(ys) | Geometry::LineString(ys)) => {
            Geometry::MultiPoint(joined(xs, ys))
        }
        (Geometry::LineString(xs), Geometry::Point(p)) => Geometry::LineString(joined(xs, &[*p])),
        (Geometry::MultiPoint(xs), Geometry::Point(p)) => Geometry::MultiPoint(joined(xs, &[*p])),
        (Geometry::GeometryCollection(xs), Geometry::GeometryCollection(ys)) => {
            Geometry::GeometryCollection(xs.iter().chain(ys).cloned().collect())
        }
        (Geometry::GeometryCollection(xs), other) => {
            let mut members = xs.clone();
            members.push(other.clone());
            Geometry::GeometryCollection(members)
        }
        (other, Geometry::GeometryCollection(ys)) => {
            let mut members = vec![other.clone()];
            members.extend(ys.iter().cloned());
            Geometry::GeometryCollection(members)
        }
        (x, y) => Geometry::GeometryCollection(vec![x.clone(), y.clone()]),
    };
    Ok(Value::Geometry(merged))
}

// ══════════════════════════════════════════════════════════════════════════════
// Array-like access
// ══════════════════════════════════════════════════════════════════════════════

/// The element sequence of a `LineString`, `MultiPoint` or `GeometryCollection`.
pub fn flatten_array_like(value: &Value) -> EvalResult<Vec<Geometry>> {
    value
        .as_geometry()
        .and_then(Geometry::array_items)
        .ok_or_else(|| {
            EvalError::type_mismatch(format!(
                "expected a LineString, MultiPoint or GeometryCollection but got: {value}"
            ))
        })
}

/// Rebuild a container of `kind` from transformed elements.
///
/// Point containers keep their kind while every element is still a point.
pub fn rebuild_array_like(kind: GeometryKind, items: Vec<Geometry>) -> Geometry {
    let points: Option<CoordList> = items.iter().map(Geometry::as_point).collect();
    match (kind, points) {
        (GeometryKind::LineString, Some(cs)) => Geometry::LineString(cs),
        (GeometryKind::MultiPoint, Some(cs)) => Geometry::MultiPoint(cs),
        _ => Geometry::GeometryCollection(items),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Geometry construction
// ══════════════════════════════════════════════════════════════════════════════

fn expected(kind: GeometryKind, what: &str, got: &Value) -> EvalError {
    EvalError::type_mismatch(format!("{kind} expects {what} but got: {got}"))
}

fn ring(kind: GeometryKind, value: &Value) -> EvalResult<CoordList> {
    value
        .as_geometry()
        .and_then(Geometry::point_list)
        .ok_or_else(|| expected(kind, "a list of points", value))
}

/// Assemble a geometry of `kind` from evaluated constructor arguments.
pub fn construct(kind: GeometryKind, args: &[Value]) -> EvalResult<Geometry> {
    match kind {
        GeometryKind::Point => match args {
            [] => Ok(Geometry::empty(kind)),
            [Value::Geometry(Geometry::Point(c))] => Ok(Geometry::Point(*c)),
            [Value::Number(x), Value::Number(y)] => Ok(Geometry::point(*x, *y)),
            [other, ..] => Err(expected(kind, "two numbers or a point", other)),
        },
        GeometryKind::MultiPoint | GeometryKind::LineString => {
            let coords = args
                .iter()
                .map(|v| match v {
                    Value::Geometry(Geometry::Point(c)) => Ok(*c),
                    other => Err(expected(kind, "points", other)),
                })
                .collect::<EvalResult<CoordList>>()?;
            Ok(if kind == GeometryKind::LineString {
                Geometry::LineString(coords)
            } else {
                Geometry::MultiPoint(coords)
            })
        }
        GeometryKind::MultiLineString => Ok(Geometry::MultiLineString(
            args.iter().map(|v| ring(kind, v)).collect::<EvalResult<_>>()?,
        )),
        GeometryKind::Polygon => match args {
            [Value::Geometry(Geometry::Polygon(rings))] => Ok(Geometry::Polygon(rings.clone())),
            _ => Ok(Geometry::Polygon(
                args.iter().map(|v| ring(kind, v)).collect::<EvalResult<_>>()?,
            )),
        },
        GeometryKind::MultiPolygon => Ok(Geometry::MultiPolygon(
            args.iter()
                .map(polygon_rings)
                .collect::<EvalResult<_>>()?,
        )),
        GeometryKind::GeometryCollection => Ok(Geometry::GeometryCollection(
            args.iter()
                .map(|v| match v {
                    Value::Geometry(g) => Ok(g.clone()),
                    other => Err(expected(kind, "geometries", other)),
                })
                .collect::<EvalResult<_>>()?,
        )),
    }
}

/// One `MultiPolygon` member: a polygon, a ring, or a collection of rings.
fn polygon_rings(value: &Value) -> EvalResult<Vec<CoordList>> {
    let kind = GeometryKind::MultiPolygon;
    match value {
        Value::Geometry(Geometry::Polygon(rings)) => Ok(rings.clone()),
        Value::Geometry(g) => {
            if let Some(points) = g.point_list() {
                return Ok(vec![points]);
            }
            match g {
                Geometry::GeometryCollection(members) => members
                    .iter()
                    .map(|m| m.point_list().ok_or_else(|| expected(kind, "rings", value)))
                    .collect(),
                _ => Err(expected(kind, "polygons or rings", value)),
            }
        }
        other => Err(expected(kind, "polygons or rings", other)),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Geometry accessors
// ══════════════════════════════════════════════════════════════════════════════

fn element_index(args: &[Value], name: &str) -> EvalResult<Option<usize>> {
    match args {
        [Value::Number(i)] if *i >= 0.0 && i.is_finite() => Ok(Some(i.trunc() as usize)),
        [Value::Number(_)] => Ok(None),
        _ => Err(EvalError::type_mismatch(format!(
            "'{name}' expects one numeric index"
        ))),
    }
}

/// `geometry:name(args)`. Names are matched case-insensitively.
///
/// `x` and `y` read a point's coordinate with no arguments and return a
/// moved copy when given one number. Out-of-range element indices give
/// `Unit`.
pub fn geometry_property(geometry: &Geometry, name: &str, args: &[Value]) -> EvalResult<Value> {
    let property = name.to_ascii_lowercase();
    match (property.as_str(), geometry) {
        ("type", _) => Ok(Value::String(geometry.kind().name().to_string())),

        ("x" | "y", Geometry::Point(c)) => match args {
            [] => Ok(Value::Number(if property == "x" { c.x } else { c.y })),
            [Value::Number(n)] => {
                let moved = if property == "x" {
                    Coord::new(*n, c.y)
                } else {
                    Coord::new(c.x, *n)
                };
                Ok(Value::Geometry(Geometry::Point(moved)))
            }
            _ => Err(EvalError::type_mismatch(format!(
                "'{name}' expects no arguments or one number"
            ))),
        },

        ("numgeometries", Geometry::GeometryCollection(members)) => {
            Ok(Value::Number(members.len() as f64))
        }
        ("geometryn", Geometry::GeometryCollection(members)) => {
            Ok(element_index(args, name)?
                .and_then(|i| members.get(i))
                .map_or(Value::Unit, |g| Value::Geometry(g.clone())))
        }

        ("numpoints", Geometry::LineString(coords)) => Ok(Value::Number(coords.len() as f64)),
        ("pointn", Geometry::LineString(coords)) => Ok(element_index(args, name)?
            .and_then(|i| coords.get(i))
            .map_or(Value::Unit, |c| Value::Geometry(Geometry::Point(*c)))),

        _ => Err(EvalError::PropertyNotFound {
            property: name.to_string(),
            target: geometry.kind().name().to_string(),
        }),
    }
}
