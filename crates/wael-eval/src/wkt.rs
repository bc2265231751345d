//! Well-known text: writer (`Display` for [`Geometry`]) and reader.
//!
//! The reader reuses the language lexer, so tags are case-insensitive and
//! `#` comments are allowed between tokens.

use std::fmt;

use wael_lexer::{Lexer, Token, TokenKind};
use wael_types::ast::GeometryKind;
use wael_types::SourceFile;

use crate::error::{EvalError, EvalResult};
use crate::geometry::{Coord, CoordList, Geometry};
use crate::value::format_number;

// ══════════════════════════════════════════════════════════════════════════════
// Writer
// ══════════════════════════════════════════════════════════════════════════════

struct CoordText<'a>(&'a Coord);

impl fmt::Display for CoordText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_number(self.0.x), format_number(self.0.y))
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, coords: &[Coord]) -> fmt::Result {
    f.write_str("(")?;
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", CoordText(c))?;
    }
    f.write_str(")")
}

fn write_lists(f: &mut fmt::Formatter<'_>, lists: &[CoordList]) -> fmt::Result {
    f.write_str("(")?;
    for (i, list) in lists.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_list(f, list)?;
    }
    f.write_str(")")
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.kind().wkt_tag();
        if self.is_empty() {
            return write!(f, "{tag} EMPTY");
        }
        write!(f, "{tag} ")?;
        match self {
            Geometry::Point(c) => write!(f, "({})", CoordText(c)),
            Geometry::MultiPoint(cs) | Geometry::LineString(cs) => write_list(f, cs),
            Geometry::MultiLineString(ls) | Geometry::Polygon(ls) => write_lists(f, ls),
            Geometry::MultiPolygon(ps) => {
                f.write_str("(")?;
                for (i, rings) in ps.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_lists(f, rings)?;
                }
                f.write_str(")")
            }
            Geometry::GeometryCollection(gs) => {
                f.write_str("(")?;
                for (i, g) in gs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{g}")?;
                }
                f.write_str(")")
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Reader
// ══════════════════════════════════════════════════════════════════════════════

impl Geometry {
    /// Parse well-known text such as `POINT (1 2)` or `LINESTRING EMPTY`.
    pub fn from_wkt(text: &str) -> EvalResult<Geometry> {
        let source = SourceFile::new("<wkt>", text);
        let lexed = Lexer::new(&source).lex();
        if let Some(error) = lexed.errors.first() {
            return Err(malformed(&error.message));
        }
        let mut reader = WktReader {
            tokens: lexed.tokens,
            pos: 0,
        };
        let geometry = reader.geometry()?;
        match reader.peek() {
            TokenKind::Eof => Ok(geometry),
            other => Err(malformed(&format!("unexpected '{other}' after geometry"))),
        }
    }
}

fn malformed(detail: &str) -> EvalError {
    EvalError::type_mismatch(format!("malformed WKT: {detail}"))
}

struct WktReader {
    tokens: Vec<Token>,
    pos: usize,
}

impl WktReader {
    fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        self.pos += 1;
        kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> EvalResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(malformed(&format!("expected '{kind}', got '{}'", self.peek())))
        }
    }

    /// Parse `item { "," item }` inside parentheses.
    fn list<T>(&mut self, mut item: impl FnMut(&mut Self) -> EvalResult<T>) -> EvalResult<Vec<T>> {
        self.expect(&TokenKind::LParen)?;
        let mut items = vec![item(self)?];
        while self.eat(&TokenKind::Comma) {
            items.push(item(self)?);
        }
        self.expect(&TokenKind::RParen)?;
        Ok(items)
    }

    fn geometry(&mut self) -> EvalResult<Geometry> {
        let tag = self.advance();
        let Some(kind) = tag.geometry_kind() else {
            return Err(malformed(&format!("expected a geometry tag, got '{tag}'")));
        };
        if self.eat(&TokenKind::Empty) {
            return Ok(Geometry::empty(kind));
        }
        Ok(match kind {
            GeometryKind::Point => {
                self.expect(&TokenKind::LParen)?;
                let c = self.coord()?;
                self.expect(&TokenKind::RParen)?;
                Geometry::Point(c)
            }
            GeometryKind::MultiPoint => Geometry::MultiPoint(self.list(Self::multi_point_member)?),
            GeometryKind::LineString => Geometry::LineString(self.coord_list()?),
            GeometryKind::MultiLineString => {
                Geometry::MultiLineString(self.list(Self::coord_list)?)
            }
            GeometryKind::Polygon => Geometry::Polygon(self.list(Self::coord_list)?),
            GeometryKind::MultiPolygon => {
                Geometry::MultiPolygon(self.list(|r| r.list(Self::coord_list))?)
            }
            GeometryKind::GeometryCollection => {
                Geometry::GeometryCollection(self.list(Self::geometry)?)
            }
        })
    }

    fn coord_list(&mut self) -> EvalResult<CoordList> {
        self.list(Self::coord)
    }

    /// `MULTIPOINT` accepts both `(1 2, 3 4)` and `((1 2), (3 4))`.
    fn multi_point_member(&mut self) -> EvalResult<Coord> {
        if self.eat(&TokenKind::LParen) {
            let c = self.coord()?;
            self.expect(&TokenKind::RParen)?;
            Ok(c)
        } else {
            self.coord()
        }
    }

    fn coord(&mut self) -> EvalResult<Coord> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(Coord::new(x, y))
    }

    fn number(&mut self) -> EvalResult<f64> {
        let sign = match self.peek() {
            TokenKind::Minus => {
                self.pos += 1;
                -1.0
            }
            TokenKind::Plus => {
                self.pos += 1;
                1.0
            }
            _ => 1.0,
        };
        match self.advance() {
            TokenKind::NumberLit(n) => Ok(sign * n),
            other => Err(malformed(&format!("expected a number, got '{other}'"))),
        }
    }
}
