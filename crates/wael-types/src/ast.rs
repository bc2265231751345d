//! AST node types for the WAEL language.
//!
//! Every node carries a [`Span`] for error reporting.
//! Large recursive types are boxed to keep enum sizes reasonable. Lambda
//! nodes are reference-counted so closures can hold their body after the
//! program that defined them has been dropped.

use crate::Span;
use std::fmt;
use std::rc::Rc;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete program: a `;`-separated sequence of statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Expr>,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ══════════════════════════════════════════════════════════════════════════════

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Geometry Kinds
// ══════════════════════════════════════════════════════════════════════════════

/// The seven geometry kinds of the language (WKT tags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 7] = [
        GeometryKind::Point,
        GeometryKind::MultiPoint,
        GeometryKind::LineString,
        GeometryKind::MultiLineString,
        GeometryKind::Polygon,
        GeometryKind::MultiPolygon,
        GeometryKind::GeometryCollection,
    ];

    /// Canonical kind name, as returned by the `:type` accessor.
    pub fn name(self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::LineString => "LineString",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPolygon => "MultiPolygon",
            GeometryKind::GeometryCollection => "GeometryCollection",
        }
    }

    /// Upper-case WKT tag.
    pub fn wkt_tag(self) -> &'static str {
        match self {
            GeometryKind::Point => "POINT",
            GeometryKind::MultiPoint => "MULTIPOINT",
            GeometryKind::LineString => "LINESTRING",
            GeometryKind::MultiLineString => "MULTILINESTRING",
            GeometryKind::Polygon => "POLYGON",
            GeometryKind::MultiPolygon => "MULTIPOLYGON",
            GeometryKind::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }

    /// Case-insensitive lookup by kind name.
    pub fn from_name(name: &str) -> Option<GeometryKind> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node. Uses `Box` for recursive variants.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    /// `42`, `3.14`
    NumberLit(f64),
    /// `"hello"`, `'hello'`
    StringLit(String),
    /// `true` / `false`
    BoolLit(bool),
    /// bare `EMPTY`
    EmptyLit,

    // ── Geometry ──
    /// `Point(1 2)`, `LineString(a, b)`, `POLYGON EMPTY` (`members == None`)
    Geometry {
        kind: GeometryKind,
        members: Option<Vec<Expr>>,
    },
    /// A geometry keyword used as a value: `GeometryCollection`
    KindName(GeometryKind),
    /// Two juxtaposed coordinates: `(x y)`
    PointPair {
        x: Box<Expr>,
        y: Box<Expr>,
    },
    /// `(a, b, c)` — a geometry collection literal
    Collection(Vec<Expr>),

    // ── Bindings ──
    /// `my_var`, `$?`
    Identifier(String),
    /// `[export] [let] name = value`
    Assign {
        target: Ident,
        value: Box<Expr>,
        export: bool,
        local: bool,
    },
    /// `a; b; c`
    Sequence(Vec<Expr>),

    // ── Calls & Accessors ──
    /// `callee(args...)`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `object:name` or `object:name(args...)`
    Accessor {
        object: Box<Expr>,
        name: Ident,
        args: Option<Vec<Expr>>,
    },

    // ── Operators ──
    /// `a + b`, `a == b`, `a and b`, `a ++ b`, etc.
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `-x`, `!x`
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `value | fn`, `value |* fn`, ...
    Pipe {
        value: Box<Expr>,
        op: PipeOp,
        function: Box<Expr>,
    },
    /// `Generate count producer` / `count >> producer`
    Generate {
        count: Box<Expr>,
        producer: Box<Expr>,
    },

    // ── Control Flow ──
    /// `if (cond) then (a) else (b)`
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },

    // ── Functions & Modules ──
    /// `(a, b) => body`, `x => body`, `(...xs) => body`
    Lambda(Rc<LambdaExpr>),
    /// `Import(expr)` / `Import(expr) Using (a, b)` / `Using (*)`
    Import {
        source: Box<Expr>,
        names: Option<ImportNames>,
    },

    // ── Grouping ──
    /// `(expr)`
    Paren(Box<Expr>),
}

/// The `Using (...)` clause of an import.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportNames {
    /// `Using (*)`
    All,
    /// `Using (a, b)`
    Named(Vec<Ident>),
}

// ── Binary Operators ──────────────────────────────────────────────────────────

/// Binary operators (in precedence order, lowest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Logical
    Or,
    And,
    // Equality
    Eq,
    NotEq,
    // Comparison
    Less,
    Greater,
    LessEq,
    GreaterEq,
    // Concatenation
    Concat,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinOp {
    /// Returns the operator symbol for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Or => "or",
            BinOp::And => "and",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Less => "<",
            BinOp::Greater => ">",
            BinOp::LessEq => "<=",
            BinOp::GreaterEq => ">=",
            BinOp::Concat => "++",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "^",
        }
    }

    /// Returns `true` for `+ - * / % ^`.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::Pow
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
}

/// The pipe family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeOp {
    /// `|` — apply to the whole value
    Apply,
    /// `|*` — map every coordinate
    Coordinates,
    /// `||` — map elements
    Map,
    /// `|~` — filter elements
    Filter,
    /// `|>` — reduce elements
    Reduce,
}

impl PipeOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipeOp::Apply => "|",
            PipeOp::Coordinates => "|*",
            PipeOp::Map => "||",
            PipeOp::Filter => "|~",
            PipeOp::Reduce => "|>",
        }
    }
}

// ── Lambda ────────────────────────────────────────────────────────────────────

/// A function literal.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    pub params: Params,
    pub body: Expr,
    pub span: Span,
}

/// A lambda's parameter list.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// `(a, b, c)`
    Positional(Vec<Ident>),
    /// `(...items)` — all arguments collected into one collection
    Spread(Ident),
}

impl Params {
    /// Number of declared names.
    pub fn len(&self) -> usize {
        match self {
            Params::Positional(names) => names.len(),
            Params::Spread(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_kind_lookup_is_case_insensitive() {
        assert_eq!(GeometryKind::from_name("point"), Some(GeometryKind::Point));
        assert_eq!(
            GeometryKind::from_name("GEOMETRYCOLLECTION"),
            Some(GeometryKind::GeometryCollection)
        );
        assert_eq!(
            GeometryKind::from_name("lineString"),
            Some(GeometryKind::LineString)
        );
        assert_eq!(GeometryKind::from_name("circle"), None);
    }

    #[test]
    fn test_geometry_kind_names() {
        for kind in GeometryKind::ALL {
            assert_eq!(kind.wkt_tag(), kind.name().to_ascii_uppercase());
            assert_eq!(kind.to_string(), kind.name());
        }
    }

    #[test]
    fn test_binop_symbols() {
        assert_eq!(BinOp::Concat.as_str(), "++");
        assert_eq!(BinOp::Pow.as_str(), "^");
        assert!(BinOp::Mod.is_arithmetic());
        assert!(!BinOp::Concat.is_arithmetic());
        assert_eq!(PipeOp::Reduce.as_str(), "|>");
    }

    #[test]
    fn test_params_len() {
        let span = Span::point(1, 1);
        let positional = Params::Positional(vec![Ident::new("a", span), Ident::new("b", span)]);
        assert_eq!(positional.len(), 2);
        assert!(Params::Positional(vec![]).is_empty());
        assert_eq!(Params::Spread(Ident::new("g", span)).len(), 1);
    }
}
