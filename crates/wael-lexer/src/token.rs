//! Token types for the WAEL lexer.
//!
//! Defines [`TokenKind`] covering every lexeme of the language and
//! [`Token`], which pairs a kind with a source [`Span`].

use std::fmt;
use wael_types::ast::GeometryKind;
use wael_types::Span;

/// All reserved words, in their canonical lower-case spelling.
///
/// Keywords are matched case-insensitively: `Point`, `POINT` and `point`
/// are the same token.
pub const ALL_KEYWORDS: &[&str] = &[
    // Geometry tags (8)
    "point", "multipoint", "linestring", "multilinestring", "polygon",
    "multipolygon", "geometrycollection", "empty",
    // Literals (2)
    "true", "false",
    // Control flow (3)
    "if", "then", "else",
    // Bindings & modules (7)
    "let", "export", "import", "use", "using", "with", "function",
    // Generation (1)
    "generate",
    // Logical (2)
    "and", "or",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Source location.
    pub span: Span,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns `true` if this token is a reserved keyword.
    pub fn is_keyword(&self) -> bool {
        self.kind.is_keyword()
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind in the language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// Numeric literal: `42`, `3.14`, `.5`, `1e-3`
    NumberLit(f64),
    /// String literal: `"hello"` or `'hello'`
    StringLiteral(String),
    /// `true`
    True,
    /// `false`
    False,

    // ── Identifiers ──────────────────────────────────────────

    /// User-defined identifier: `radius`, `$?`, `$0`, `x'`
    Identifier(String),

    // ── Geometry Keywords ────────────────────────────────────

    /// `POINT`
    Point,
    /// `MULTIPOINT`
    MultiPoint,
    /// `LINESTRING`
    LineString,
    /// `MULTILINESTRING`
    MultiLineString,
    /// `POLYGON`
    Polygon,
    /// `MULTIPOLYGON`
    MultiPolygon,
    /// `GEOMETRYCOLLECTION`
    GeometryCollection,
    /// `EMPTY`
    Empty,

    // ── Other Keywords ───────────────────────────────────────

    /// `if`
    If,
    /// `then`
    Then,
    /// `else`
    Else,
    /// `let`
    Let,
    /// `export`
    Export,
    /// `import`
    Import,
    /// `use` (alias of `import`)
    Use,
    /// `using`
    Using,
    /// `with` (alias of `using`)
    With,
    /// `function`
    Function,
    /// `generate`
    Generate,
    /// `and`
    And,
    /// `or`
    Or,

    // ── Operators ────────────────────────────────────────────

    /// `+`
    Plus,
    /// `++`
    PlusPlus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `^`
    Caret,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `!`
    Bang,
    /// `!=`
    BangEq,
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,
    /// `>>`
    GreaterGreater,
    /// `=>`
    FatArrow,
    /// `|`
    Pipe,
    /// `|*`
    PipeStar,
    /// `||`
    PipePipe,
    /// `|~`
    PipeTilde,
    /// `|>`
    PipeGreater,

    // ── Punctuation ──────────────────────────────────────────

    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `...`
    DotDotDot,

    // ── Special ──────────────────────────────────────────────

    /// End of input.
    Eof,
}

impl TokenKind {
    /// Look up a reserved word, ignoring case.
    /// Returns `None` for ordinary identifiers.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "point" => TokenKind::Point,
            "multipoint" => TokenKind::MultiPoint,
            "linestring" => TokenKind::LineString,
            "multilinestring" => TokenKind::MultiLineString,
            "polygon" => TokenKind::Polygon,
            "multipolygon" => TokenKind::MultiPolygon,
            "geometrycollection" => TokenKind::GeometryCollection,
            "empty" => TokenKind::Empty,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "else" => TokenKind::Else,
            "let" => TokenKind::Let,
            "export" => TokenKind::Export,
            "import" => TokenKind::Import,
            "use" => TokenKind::Use,
            "using" => TokenKind::Using,
            "with" => TokenKind::With,
            "function" => TokenKind::Function,
            "generate" => TokenKind::Generate,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns `true` if this kind is a reserved word.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Point
                | TokenKind::MultiPoint
                | TokenKind::LineString
                | TokenKind::MultiLineString
                | TokenKind::Polygon
                | TokenKind::MultiPolygon
                | TokenKind::GeometryCollection
                | TokenKind::Empty
                | TokenKind::True
                | TokenKind::False
                | TokenKind::If
                | TokenKind::Then
                | TokenKind::Else
                | TokenKind::Let
                | TokenKind::Export
                | TokenKind::Import
                | TokenKind::Use
                | TokenKind::Using
                | TokenKind::With
                | TokenKind::Function
                | TokenKind::Generate
                | TokenKind::And
                | TokenKind::Or
        )
    }

    /// The geometry kind named by a geometry keyword.
    pub fn geometry_kind(&self) -> Option<GeometryKind> {
        match self {
            TokenKind::Point => Some(GeometryKind::Point),
            TokenKind::MultiPoint => Some(GeometryKind::MultiPoint),
            TokenKind::LineString => Some(GeometryKind::LineString),
            TokenKind::MultiLineString => Some(GeometryKind::MultiLineString),
            TokenKind::Polygon => Some(GeometryKind::Polygon),
            TokenKind::MultiPolygon => Some(GeometryKind::MultiPolygon),
            TokenKind::GeometryCollection => Some(GeometryKind::GeometryCollection),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::NumberLit(n) => return write!(f, "{n}"),
            TokenKind::StringLiteral(s) => return write!(f, "\"{s}\""),
            TokenKind::Identifier(name) => return write!(f, "{name}"),
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Point => "point",
            TokenKind::MultiPoint => "multipoint",
            TokenKind::LineString => "linestring",
            TokenKind::MultiLineString => "multilinestring",
            TokenKind::Polygon => "polygon",
            TokenKind::MultiPolygon => "multipolygon",
            TokenKind::GeometryCollection => "geometrycollection",
            TokenKind::Empty => "empty",
            TokenKind::If => "if",
            TokenKind::Then => "then",
            TokenKind::Else => "else",
            TokenKind::Let => "let",
            TokenKind::Export => "export",
            TokenKind::Import => "import",
            TokenKind::Use => "use",
            TokenKind::Using => "using",
            TokenKind::With => "with",
            TokenKind::Function => "function",
            TokenKind::Generate => "generate",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Plus => "+",
            TokenKind::PlusPlus => "++",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Caret => "^",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::Bang => "!",
            TokenKind::BangEq => "!=",
            TokenKind::Less => "<",
            TokenKind::LessEq => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEq => ">=",
            TokenKind::GreaterGreater => ">>",
            TokenKind::FatArrow => "=>",
            TokenKind::Pipe => "|",
            TokenKind::PipeStar => "|*",
            TokenKind::PipePipe => "||",
            TokenKind::PipeTilde => "|~",
            TokenKind::PipeGreater => "|>",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::DotDotDot => "...",
            TokenKind::Eof => "end of file",
        };
        f.write_str(s)
    }
}
