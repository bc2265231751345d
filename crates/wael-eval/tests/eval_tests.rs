//! Integration tests for the WAEL evaluator.
//!
//! Tests key evaluator features:
//! - literals, arithmetic broadcasting and comparison
//! - scope rules (plain assignment, `let`, closures)
//! - function calls, binding and pipes
//! - Generate
//! - module export/import, file imports
//! - session conveniences (`$?`, history)

use pretty_assertions::assert_eq;
use wael_eval::{Coord, EvalError, EvalOptions, Geometry, Session, Value};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn session() -> Session {
    Session::with_options(EvalOptions::default().with_network(false))
}

/// Evaluate in a fresh session (panics on error).
fn eval(source: &str) -> Value {
    session()
        .evaluate(source)
        .unwrap_or_else(|e| panic!("evaluation failed: {e}\nsource: {source}"))
}

fn eval_err(source: &str) -> EvalError {
    match session().evaluate(source) {
        Ok(v) => panic!("expected an error, got {v}\nsource: {source}"),
        Err(e) => e,
    }
}

fn num(source: &str) -> f64 {
    match eval(source) {
        Value::Number(n) => n,
        other => panic!("expected a number, got {other}"),
    }
}

fn geometry(source: &str) -> Geometry {
    match eval(source) {
        Value::Geometry(g) => g,
        other => panic!("expected a geometry, got {other}"),
    }
}

/// Coordinates of a point, or of every point in a point list / collection.
fn coords(g: &Geometry) -> Vec<(f64, f64)> {
    match g {
        Geometry::Point(c) => vec![(c.x, c.y)],
        Geometry::MultiPoint(cs) | Geometry::LineString(cs) => {
            cs.iter().map(|c| (c.x, c.y)).collect()
        }
        Geometry::GeometryCollection(gs) => gs.iter().flat_map(coords).collect(),
        other => panic!("no flat coordinate list for {other}"),
    }
}

fn point(x: f64, y: f64) -> Geometry {
    Geometry::point(x, y)
}

// ══════════════════════════════════════════════════════════════════════════════
// Literals and operators
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn literals() {
    assert_eq!(eval("42"), Value::Number(42.0));
    assert_eq!(eval("'hi'"), Value::String("hi".into()));
    assert_eq!(eval("true"), Value::Boolean(true));
    assert_eq!(eval("EMPTY"), Value::Unit);
    assert_eq!(eval(""), Value::Unit);
    assert_eq!(eval("# comment only"), Value::Unit);
}

#[test]
fn geometry_constructors() {
    assert_eq!(geometry("Point(1 2)"), point(1.0, 2.0));
    assert_eq!(geometry("POINT (1 -1)"), point(1.0, -1.0));
    assert_eq!(geometry("point EMPTY"), Geometry::Point(Coord::EMPTY));
    assert_eq!(
        geometry("LineString(1 1, 2 2)"),
        Geometry::LineString(vec![Coord::new(1.0, 1.0), Coord::new(2.0, 2.0)])
    );
    assert_eq!(
        geometry("(Point(1 1), Point(2 2))"),
        Geometry::GeometryCollection(vec![point(1.0, 1.0), point(2.0, 2.0)])
    );
    assert_eq!(
        eval("Polygon((0 0, 1 0, 1 1, 0 0))").to_string(),
        "POLYGON ((0 0, 1 0, 1 1, 0 0))"
    );
}

#[test]
fn arithmetic_broadcasting() {
    assert_eq!(num("1 + 2 * 3"), 7.0);
    assert_eq!(num("2 ^ 3 ^ 2"), 512.0);
    assert_eq!(geometry("Point(1 1) + 1"), point(2.0, 2.0));
    assert_eq!(geometry("2 * Point(1 3)"), point(2.0, 6.0));
    assert_eq!(
        coords(&geometry("Point(1 1) - (3 >> Function(x => Point(x x)))")),
        vec![(1.0, 1.0), (0.0, 0.0), (-1.0, -1.0)]
    );
    assert_eq!(
        coords(&geometry("LineString(1 1, 2 2) + LineString(10 10, 20 20)")),
        vec![(11.0, 11.0), (22.0, 22.0)]
    );
}

#[test]
fn number_point_broadcast_commutes_in_kind() {
    assert_eq!(eval("3 + Point(1 2)"), eval("Point(1 2) + 3"));
    assert_ne!(eval("3 - Point(1 2)"), eval("Point(1 2) - 3"));
}

#[test]
fn arithmetic_errors() {
    assert!(matches!(
        eval_err("LineString(1 1, 2 2) + LineString(1 1)"),
        EvalError::OperationNotSupported(msg) if msg.contains("lengths 2 and 1 differ")
    ));
    assert!(matches!(
        eval_err("Point(1 1) + 'a'"),
        EvalError::OperationNotSupported(_)
    ));
    assert!(matches!(eval_err("'a' < 1"), EvalError::TypeMismatch(_)));
}

#[test]
fn comparison_and_logic() {
    assert_eq!(eval("1 < 2 and 2 <= 2"), Value::Boolean(true));
    assert_eq!(eval("Point(1 1) == Point(1 1)"), Value::Boolean(true));
    assert_eq!(eval("Point(1 1) != Point(1 2)"), Value::Boolean(true));
    assert_eq!(eval("!0"), Value::Boolean(true));
    assert_eq!(eval("EMPTY or 'x'"), Value::Boolean(true));
    // Right operand is skipped once the result is known.
    assert_eq!(eval("false and undefinedFn()"), Value::Boolean(false));
}

#[test]
fn concatenation() {
    assert_eq!(
        coords(&geometry("LineString(1 1) ++ Point(2 2)")),
        vec![(1.0, 1.0), (2.0, 2.0)]
    );
    assert_eq!(
        geometry("GeometryCollection() ++ Point(2 2)"),
        Geometry::GeometryCollection(vec![point(2.0, 2.0)])
    );
}

#[test]
fn if_expressions() {
    assert_eq!(num("if (1 < 2) then (1) else (2)"), 1.0);
    assert_eq!(num("If (1 > 2) Then (1) Else (2)"), 2.0);
    assert_eq!(eval("if (false) then (1)"), Value::Unit);
    assert!(matches!(
        eval_err("if (1) then (1) else (2)"),
        EvalError::TypeMismatch(_)
    ));
}

// ══════════════════════════════════════════════════════════════════════════════
// Scopes and variables
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn let_shadows_outer_binding() {
    assert_eq!(num("a=1; (()=> (let a=2; a))(); a"), 1.0);
}

#[test]
fn plain_assignment_mutates_outer_binding() {
    assert_eq!(num("a=1; (()=> a=2)(); a"), 2.0);
    assert_eq!(num("a = 1; (() => a = 2; a)()"), 2.0);
}

#[test]
fn unbound_names_are_unit() {
    assert_eq!(eval("nothing"), Value::Unit);
    assert_eq!(eval("nothing()"), Value::Unit);
}

#[test]
fn closure_state() {
    assert_eq!(
        num("Counter = () => (let count = 0; () => count = count + 1); counter = Counter(); counter(); counter()"),
        2.0
    );
}

#[test]
fn nested_functions() {
    assert_eq!(num("f = () => (() => (() => 3)); f()()()"), 3.0);
    assert_eq!(num("(() => 3 ; 4 ; 5)()"), 5.0);
    assert_eq!(num("fn = (a) => (a); fn(fn(fn(3)))"), 3.0);
    assert_eq!(num("Adder = ((i) => (a => a+i)); 1 | Adder(2)"), 3.0);
}

#[test]
fn recursion() {
    assert_eq!(
        num("fact = (n) => (if (n <= 1) then (1) else (n * fact(n - 1))); fact(5)"),
        120.0
    );
}

#[test]
fn missing_arguments_are_unit() {
    assert_eq!(eval("f = (a, b) => (b); f(1)"), Value::Unit);
    assert_eq!(num("f = (a) => (a); f(1, 2, 3)"), 1.0);
}

#[test]
fn spread_parameters_collect_geometries() {
    assert_eq!(
        geometry("f = (...g) => (g); f(Point(1 1), Point(2 2))"),
        Geometry::GeometryCollection(vec![point(1.0, 1.0), point(2.0, 2.0)])
    );
    assert!(matches!(
        eval_err("f = (...g) => (g); f(1)"),
        EvalError::TypeMismatch(_)
    ));
}

#[test]
fn failed_call_leaves_session_usable() {
    let mut s = session();
    s.evaluate("a = 1").unwrap();
    assert!(s.evaluate("(() => (let a = 5; Point(1 1) + 'x'))()").is_err());
    assert_eq!(s.evaluate("a").unwrap(), Value::Number(1.0));
}

// ══════════════════════════════════════════════════════════════════════════════
// Accessors and binding
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn geometry_accessors() {
    assert_eq!(num("Point(3 4):x"), 3.0);
    assert_eq!(num("p = Point(3 4); p:Y()"), 4.0);
    assert_eq!(geometry("Point(3 4):x(0)"), point(0.0, 4.0));
    assert_eq!(eval("LineString(1 1, 2 2):type"), Value::String("LineString".into()));
    assert_eq!(eval("val = Point(1 1); val:type == Point"), Value::Boolean(true));
    assert_eq!(num("LineString(1 1, 2 2):numPoints()"), 2.0);
    assert_eq!(geometry("LineString(1 1, 2 2):pointN(1)"), point(2.0, 2.0));
    assert_eq!(num("(Point(1 1), Point(2 2)):numGeometries"), 2.0);
    assert_eq!(eval("(Point(1 1), Point(2 2)):geometryN(5)"), Value::Unit);
}

#[test]
fn accessor_errors() {
    assert!(matches!(
        eval_err("Point(1 1):radius"),
        EvalError::PropertyNotFound { property, target } if property == "radius" && target == "Point"
    ));
    assert!(matches!(
        eval_err("f = (a) => (a); f:call(1)"),
        EvalError::OperationNotSupported(_)
    ));
    assert!(matches!(
        eval_err("missing:x"),
        EvalError::PropertyNotFound { .. }
    ));
}

#[test]
fn bind_prepends_arguments() {
    assert_eq!(
        num("TripleAdd = Function((g1, g2, g3) => g1 + g2 + g3); 4 | TripleAdd:bind(2):bind(3)"),
        9.0
    );
    let line = geometry(
        r#"
        myFn = Function((x, y, last) => (
            first = Point(x y);
            LineString(first, last)
        ));
        myFnPartial = myFn:bind(1, 2);
        myFnPartial(Point(3 4))
    "#,
    );
    assert_eq!(
        line,
        Geometry::LineString(vec![Coord::new(1.0, 2.0), Coord::new(3.0, 4.0)])
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Pipes
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn apply_pipe() {
    assert_eq!(num("2.345325 | Round(2)"), 2.35);
    assert_eq!(num("3 | (x => x * 2)"), 6.0);
}

#[test]
fn coordinate_pipe() {
    assert_eq!(geometry("Point(1 1) |* Function(p => p + 1)"), point(2.0, 2.0));
    assert_eq!(
        eval("Polygon((1 1, 2 2, 3 3, 1 1), (4 4, 5 5, 6 6, 4 4)) |* Function(p => p + 1)")
            .to_string(),
        "POLYGON ((2 2, 3 3, 4 4, 2 2), (5 5, 6 6, 7 7, 5 5))"
    );
    assert!(matches!(eval_err("3 |* (p => p)"), EvalError::TypeMismatch(_)));
    assert!(matches!(
        eval_err("Point(1 1) |* (p => 3)"),
        EvalError::TypeMismatch(_)
    ));
}

#[test]
fn coordinate_pipe_identity_preserves_every_kind() {
    for source in [
        "Point(1 2)",
        "MultiPoint(1 2, 3 4)",
        "LineString(1 2, 3 4)",
        "MultiLineString((1 2, 3 4), (5 6, 7 8))",
        "Polygon((0 0, 1 0, 1 1, 0 0))",
        "MultiPolygon(((0 0, 1 0, 1 1, 0 0)), ((5 5, 6 5, 6 6, 5 5)))",
        "GeometryCollection(Point(1 1), LineString(1 1, 2 2))",
        "LineString EMPTY",
    ] {
        assert_eq!(
            eval(&format!("{source} |* (p => p)")),
            eval(source),
            "identity over {source}"
        );
    }
}

#[test]
fn map_pipe() {
    let g = geometry("MultiPoint(1 1, 2 2, 3 3) || Function(x => x + Point(1 1))");
    assert_eq!(g.kind(), wael_types::ast::GeometryKind::MultiPoint);
    assert_eq!(coords(&g), vec![(2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]);

    let g = geometry("MultiPoint(1 1, 2 2, 3 3) || Function((x, i) => x + Point(i 1))");
    assert_eq!(coords(&g), vec![(1.0, 2.0), (3.0, 3.0), (5.0, 4.0)]);

    let g = geometry("MultiPoint(1 1, 2 2, 3 3) || (x => x)");
    assert_eq!(g, geometry("MultiPoint(1 1, 2 2, 3 3)"));

    // Non-point results turn a point container into a collection.
    let g = geometry(
        "Generate 3 Function(x => (x = x+1; Point(x x))) || Function(x => LineString(x, (x + Point(1 1))))",
    );
    assert_eq!(g.kind(), wael_types::ast::GeometryKind::GeometryCollection);
    assert_eq!(g.to_string(), "GEOMETRYCOLLECTION (LINESTRING (1 1, 2 2), LINESTRING (2 2, 3 3), LINESTRING (3 3, 4 4))");

    assert!(matches!(
        eval_err("MultiPoint(1 1) || (x => 1)"),
        EvalError::TypeMismatch(_)
    ));
    assert!(matches!(eval_err("Point(1 1) || (x => x)"), EvalError::TypeMismatch(_)));
}

#[test]
fn filter_pipe() {
    let g = geometry("MultiPoint(1 1, 2 2, 3 3) |~ Function(x => x:x() <= 2)");
    assert_eq!(g, geometry("MultiPoint(1 1, 2 2)"));
    let g = geometry("MultiPoint(1 1, 2 2, 3 3) |~ Function((x, i) => i < 2)");
    assert_eq!(g, geometry("MultiPoint(1 1, 2 2)"));
    let g = geometry("GeometryCollection(Point(1 1), Point(2 2), Point(3 3)) |~ Function((x, i) => i < 2)");
    assert_eq!(
        g,
        Geometry::GeometryCollection(vec![point(1.0, 1.0), point(2.0, 2.0)])
    );
}

#[test]
fn reduce_pipe() {
    for container in [
        "GeometryCollection(Point(1 1), Point(2 2), Point(3 3))",
        "MultiPoint(1 1, 2 2, 3 3)",
        "LineString(1 1, 2 2, 3 3)",
    ] {
        assert_eq!(
            geometry(&format!("{container} |> Function((total, current) => total + current)")),
            point(6.0, 6.0)
        );
    }
    assert_eq!(
        geometry("GeometryCollection(Point(1 1), Point(2 2), Point(3 3)) |> Function((total, current, index) => total + index)"),
        point(4.0, 4.0)
    );
    assert_eq!(eval("GeometryCollection() |> ((a, b) => a + b)"), Value::Unit);
}

#[test]
fn pipe_chain_with_builtins() {
    let g = geometry(
        r#"
        CreateCircles = Function(() => (
            Generate 5 Function(i => (
                ring = i + 1;
                PointCircle((ring * 2), (ring * 10))
            )) | Flatten
        ));
        CreateCircles()
            || Function(x => If (x:x() <= 0) Then (x + Point(0 10)) Else (x - Point(0 10)))
            || Function(x => GeometryCollection(x, (x + Point(11 0))))
            | Flatten
    "#,
    );
    let Geometry::GeometryCollection(members) = g else {
        panic!("expected a collection");
    };
    assert_eq!(members.len(), 300);
}

// ══════════════════════════════════════════════════════════════════════════════
// Generate
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn generate_fixed_count() {
    assert_eq!(
        coords(&geometry("3 >> Point(0 0)")),
        vec![(0.0, 0.0), (0.0, 0.0), (0.0, 0.0)]
    );
    assert_eq!(
        coords(&geometry("Generate 3 (i => Point(i i))")),
        vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]
    );
    assert_eq!(eval("0 >> Point(0 0)"), Value::Geometry(Geometry::GeometryCollection(vec![])));
}

#[test]
fn generate_predicate_count() {
    assert_eq!(
        geometry("Generate (i => i < 3) (i => Point(i i))"),
        geometry("Generate 3 (i => Point(i i))")
    );
    assert_eq!(
        coords(&geometry("a = 0; ((i) => a < 3) >> (i => (a = a + 1; Point(i i)))")),
        vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]
    );
}

#[test]
fn generate_drops_unit() {
    assert_eq!(
        coords(&geometry(
            "5 >> (i) => (if (i % 2 == 0) then (Point(i i)) else (undefined))"
        )),
        vec![(0.0, 0.0), (2.0, 2.0), (4.0, 4.0)]
    );
}

#[test]
fn generate_errors() {
    assert!(matches!(eval_err("1.5 >> Point(0 0)"), EvalError::TypeMismatch(_)));
    assert!(matches!(eval_err("-1 >> Point(0 0)"), EvalError::TypeMismatch(_)));
    assert!(matches!(eval_err("3 >> 4"), EvalError::TypeMismatch(_)));
    assert!(matches!(eval_err("3 >> (i => i)"), EvalError::TypeMismatch(_)));
}

#[test]
fn generator_builtins_reject_unbounded_counts() {
    assert!(matches!(eval_err("PointGrid(1/0, 0)"), EvalError::TypeMismatch(_)));
    assert!(matches!(
        eval_err("PointGrid(1e10, 1e10)"),
        EvalError::OperationNotSupported(_)
    ));
    assert!(matches!(eval_err("PointCircle(1, 1/0)"), EvalError::TypeMismatch(_)));
    assert_eq!(
        eval("PointGrid(2, 1)").to_string(),
        "GEOMETRYCOLLECTION (GEOMETRYCOLLECTION (POINT (0 0)), GEOMETRYCOLLECTION (POINT (1 0)))"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Standard library
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn math_module() {
    assert_eq!(num("Math:PI"), std::f64::consts::PI);
    assert_eq!(num("Math:max(1, 5, 3)"), 5.0);
    assert_eq!(num("Math:round(2.5)"), 3.0);
    let r = num("Math:random()");
    assert!((0.0..1.0).contains(&r));
}

#[test]
fn native_rotate_and_round() {
    let g = geometry("_Rotate(23, Point(0 0), MultiPoint(1 1, 2 2, 3 3))");
    let (x, y) = coords(&g)[0];
    assert!((x - 1.311235981941714).abs() < 1e-9);
    assert!((y - 0.5297737249631667).abs() < 1e-9);
    assert_eq!(num("_Round(1, 1.255)"), 1.3);
    assert_eq!(geometry("Point(1.26 2.71) | Round(1)"), point(1.3, 2.7));
    assert_eq!(
        eval("MultiPoint(1 1, 2 2) | Rotate(90, Point(0 0)) | Round(0)"),
        eval("MultiPoint(1 -1, 2 -2)")
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Modules
// ══════════════════════════════════════════════════════════════════════════════

const IMPORT_ALL: &str = "Lib = Import(Function(() => (export a = 3; export b = 4))())";

#[test]
fn import_builds_module() {
    let Value::Module(fields) = eval(&format!("{IMPORT_ALL}; Lib")) else {
        panic!("expected a module");
    };
    let names: Vec<&str> = fields.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["a", "b", "Default"]);
    assert_eq!(fields["a"], Value::Number(3.0));
    assert_eq!(fields["Default"], Value::Number(4.0));

    assert_eq!(num(&format!("{IMPORT_ALL}; Lib()")), 4.0);
    assert_eq!(num(&format!("{IMPORT_ALL}; Lib:a")), 3.0);
    assert_eq!(num(&format!("{IMPORT_ALL}; Lib:b")), 4.0);
    assert_eq!(eval(&format!("{IMPORT_ALL}; Lib:Round")), Value::Unit);
}

#[test]
fn import_using_names() {
    let using = "lib = Import(Function(() => (export a = 3; export b = 4))()) Using (a)";
    assert_eq!(num(&format!("{using}; a")), 3.0);
    assert_eq!(eval(&format!("{using}; b")), Value::Unit);
    assert_eq!(num(&format!("{using}; lib:a")), 3.0);

    let using_all = "Import(Function(() => (export a = 3; export b = 4))()) Using (*)";
    assert_eq!(num(&format!("{using_all}; a")), 3.0);
    assert_eq!(num(&format!("{using_all}; b")), 4.0);
}

#[test]
fn import_without_exports_returns_value() {
    assert_eq!(
        num("Lib = (() => let a = 1; let b = 2; a); lib = Import(Lib()); lib()"),
        1.0
    );
    assert_eq!(
        num("Lib = (() => let a = 1; let b = 2; () => a); lib = Import(Lib()); lib()"),
        1.0
    );
}

#[test]
fn nested_imports_require_reexport() {
    assert_eq!(
        eval("Import(Function(() => (Import(Function(() => (export a = 4))()) Using (a)))()) Using (a); a"),
        Value::Unit
    );
    assert_eq!(
        num("Import(Function(() => (Import(Function(() => (export a = 4))()) Using (a); export a=a))()) Using (a); a"),
        4.0
    );
}

#[test]
fn module_instances_keep_state() {
    let g = geometry(
        r#"
        Counter = () => (let count = 0; export let inc = () => (count = count + 1); () => count);
        c1 = Use(Counter());
        c2 = Use(Counter());
        c1:inc();
        c1:inc();
        c1:inc();
        c2:inc();
        c2:inc();
        Point(c1() c2())
    "#,
    );
    assert_eq!(g, point(3.0, 2.0));

    let g = geometry(
        r#"
        List = () => (
            let _value = GeometryCollection();
            export let value = () => (_value);
            export let append = (g) => (_value = _value ++ g);
            export let remove = (index) => (_value = value() |~ (v, i) => (i != index));
            value
        );
        list = Use(List());
        list:append(1 1);
        list:append(2 2);
        list:append(3 3);
        list:remove(1);
        list:value()
    "#,
    );
    assert_eq!(coords(&g), vec![(1.0, 1.0), (3.0, 3.0)]);
}

#[test]
fn multiple_imports() {
    assert_eq!(
        geometry(
            r#"
            let e1 = () => (export let a = 4);
            let e2 = () => (export let b = 5);
            let i1 = Use(e1());
            let i2 = Use(e2());
            Point(i1() i2())
        "#
        ),
        point(4.0, 5.0)
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// External imports
// ══════════════════════════════════════════════════════════════════════════════

fn fixture_session() -> (tempfile::TempDir, Session) {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("lib.wael"),
        "# shared helpers\nexport let Num = (n) => (Point(n n));\nPoint(1 1)\n",
    )
    .expect("write lib.wael");
    std::fs::write(
        dir.path().join("point.json"),
        r#"{"type": "Point", "coordinates": [1, 1]}"#,
    )
    .expect("write point.json");
    std::fs::write(
        dir.path().join("feature.geojson"),
        r#"{"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [1, 1]}}"#,
    )
    .expect("write feature.geojson");
    std::fs::write(dir.path().join("invalid.wael"), "a = ;").expect("write invalid.wael");

    let options = EvalOptions::default()
        .with_working_directory(dir.path())
        .with_network(false);
    (dir, Session::with_options(options))
}

#[test]
fn import_program_file() {
    let (_dir, mut s) = fixture_session();
    assert_eq!(
        s.evaluate(r#"Import("lib.wael"):Default"#).unwrap(),
        Value::Geometry(point(1.0, 1.0))
    );
    assert_eq!(
        s.evaluate(r#"Import("lib.wael") Using (Num); Num(2)"#).unwrap(),
        Value::Geometry(point(2.0, 2.0))
    );
}

#[test]
fn import_geojson_files() {
    let (_dir, mut s) = fixture_session();
    assert_eq!(
        s.evaluate(r#"a = Import("point.json"); a + Point(1 1)"#).unwrap(),
        Value::Geometry(point(2.0, 2.0))
    );
    assert_eq!(
        s.evaluate(r#"path = "feature.geojson"; Import(path) + Point(1 1)"#)
            .unwrap(),
        Value::Geometry(point(2.0, 2.0))
    );
}

#[test]
fn import_failures() {
    let (_dir, mut s) = fixture_session();
    assert!(matches!(
        s.evaluate(r#"Import("invalid.wael"):Default + Point(1 1)"#),
        Err(EvalError::ImportFailed { uri, .. }) if uri == "invalid.wael"
    ));
    assert!(matches!(
        s.evaluate(r#"Import("missing.wael")"#),
        Err(EvalError::ImportFailed { .. })
    ));
    assert!(matches!(
        s.evaluate(r#"Import("https://example.com/lib.wael")"#),
        Err(EvalError::ImportFailed { reason, .. }) if reason.contains("disabled")
    ));
    // The session survives failed imports.
    assert_eq!(s.evaluate("1 + 1").unwrap(), Value::Number(2.0));
}

// ══════════════════════════════════════════════════════════════════════════════
// Session
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn syntax_errors_are_reported() {
    let EvalError::Syntax(errors) = eval_err("a = ;") else {
        panic!("expected a syntax error");
    };
    assert!(errors.has_errors());
}

#[test]
fn last_result_binding() {
    let mut s = session();
    s.evaluate("Point(2 3)").unwrap();
    assert_eq!(s.evaluate("$?").unwrap(), Value::Geometry(point(2.0, 3.0)));
}

#[test]
fn indexed_history() {
    let mut s = Session::with_options(EvalOptions::default().with_history(true));
    s.evaluate("Point(2 3)").unwrap();
    assert_eq!(s.evaluate("$0").unwrap(), Value::Geometry(point(2.0, 3.0)));
    assert_eq!(s.evaluate("$0 + 2").unwrap(), Value::Geometry(point(4.0, 5.0)));
    assert_eq!(s.get("$2"), Value::Geometry(point(4.0, 5.0)));

    // History is opt-in.
    let mut plain = session();
    plain.evaluate("1").unwrap();
    assert_eq!(plain.get("$0"), Value::Unit);
}

#[test]
fn bindings_persist_across_evaluations() {
    let mut s = wael_eval::create_global_scope();
    wael_eval::evaluate("square = (x) => x * x", &mut s).unwrap();
    assert_eq!(
        wael_eval::evaluate("square(4)", &mut s).unwrap(),
        Value::Number(16.0)
    );
}

#[test]
fn wkt_round_trip_through_evaluation() {
    for source in [
        "Point(1 2)",
        "MultiPoint(1 2, 3 4)",
        "LineString(1 2, 3.5 -4)",
        "Polygon((0 0, 1 0, 1 1, 0 0))",
        "GeometryCollection(Point(1 1), LineString(1 1, 2 2))",
        "MultiPolygon EMPTY",
    ] {
        let g = geometry(source);
        assert_eq!(Geometry::from_wkt(&g.to_string()).unwrap(), g, "round trip of {source}");
    }
}

#[test]
fn evaluation_is_deterministic() {
    let source = "3 >> (i => Point(i i)) || ((p, i) => p * i) | Round(2)";
    let first = eval(source).to_string();
    for _ in 0..100 {
        assert_eq!(eval(source).to_string(), first);
    }
}
