//! Parenthesised item lists, groups and point pairs.
//!
//! An item list is what appears between the parentheses of a call, a
//! geometry constructor or a group. Each item is either a point pair
//! (`1 2`, `x -1`, `(a + 1) f(b)`) or a full statement.

use wael_lexer::TokenKind;
use wael_types::ast::*;
use wael_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// Parse `Item { "," Item }` up to (not including) the closing `)`.
    pub(crate) fn parse_items(&mut self) -> Option<Vec<Expr>> {
        let mut items = Vec::new();
        if self.check_exact(&TokenKind::RParen) {
            return Some(items);
        }
        loop {
            items.push(self.parse_item()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Some(items)
    }

    /// Parse one list item: a point pair when one is ahead, else a statement.
    pub(crate) fn parse_item(&mut self) -> Option<Expr> {
        if self.point_pair_ahead() {
            let x = self.parse_atom()?;
            let y = self.parse_atom()?;
            let span = x.span.merge(y.span);
            return Some(Expr::new(
                ExprKind::PointPair {
                    x: Box::new(x),
                    y: Box::new(y),
                },
                span,
            ));
        }
        self.parse_statement()
    }

    /// Parse one coordinate atom of a point pair.
    fn parse_atom(&mut self) -> Option<Expr> {
        let start = self.current_span();
        match self.peek_kind().clone() {
            TokenKind::NumberLit(n) => {
                self.advance();
                Some(Expr::new(ExprKind::NumberLit(n), start))
            }
            TokenKind::Minus | TokenKind::Plus => {
                let negative = self.check_exact(&TokenKind::Minus);
                self.advance();
                let token = self.advance();
                let TokenKind::NumberLit(n) = token.kind else {
                    self.error_at(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("expected number, got '{}'", token.kind),
                        token.span,
                    );
                    return None;
                };
                let value = if negative { -n } else { n };
                Some(Expr::new(ExprKind::NumberLit(value), start.merge(token.span)))
            }
            TokenKind::LParen => self.parse_group(),
            TokenKind::Identifier(name) => {
                self.advance();
                let ident = Expr::new(ExprKind::Identifier(name), start);
                self.parse_postfix_ops(ident, true)
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected coordinate, got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    /// Parse a parenthesised group starting at `(`.
    ///
    /// - `(a)` is `a`
    /// - `(x y)` is a point
    /// - `(a, b, ...)` is a collection literal
    /// - `(a; b; ...)` is a sequence
    pub(crate) fn parse_group(&mut self) -> Option<Expr> {
        let open = self.advance().span; // eat `(`
        if self.check_exact(&TokenKind::RParen) {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                "empty parentheses; use GeometryCollection() for an empty collection",
            );
            return None;
        }

        let first = self.parse_item()?;
        let kind = match self.peek_kind() {
            TokenKind::Comma => {
                let mut members = vec![first];
                while self.eat(&TokenKind::Comma) {
                    members.push(self.parse_item()?);
                }
                ExprKind::Collection(members)
            }
            TokenKind::Semicolon => {
                let sequence = self.parse_sequence_rest(first)?;
                ExprKind::Paren(Box::new(sequence))
            }
            _ if matches!(first.kind, ExprKind::PointPair { .. }) => {
                self.expect_close(open)?;
                return Some(Expr::new(first.kind, open.merge(self.previous_span())));
            }
            _ => ExprKind::Paren(Box::new(first)),
        };
        self.expect_close(open)?;
        Some(Expr::new(kind, open.merge(self.previous_span())))
    }
}
