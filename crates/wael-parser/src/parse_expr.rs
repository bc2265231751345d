//! Expression parsing with full operator precedence.
//!
//! Precedence (lowest → highest):
//! 10. `|`, `|*`, `||`, `|~`, `|>`, `>>` (pipes and infix generate)
//! 9. `or`
//! 8. `and`
//! 7. `==`, `!=`
//! 6. `<`, `<=`, `>`, `>=`
//! 5. `++`
//! 4. `+`, `-`
//! 3. `*`, `/`, `%`
//! 2. unary `-`, `!`
//! 1. `^` (right-associative)
//! 0. `:` (accessor), `()` (call)

use std::rc::Rc;

use wael_lexer::TokenKind;
use wael_types::ast::*;
use wael_types::{ErrorCode, Span};

use crate::parser::Parser;

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// `Expression = OrExpr { PipeOp OrExpr }`
    ///
    /// `a >> b` builds the same node as `Generate a b`.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        let mut left = self.parse_or()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Pipe => Some(PipeOp::Apply),
                TokenKind::PipeStar => Some(PipeOp::Coordinates),
                TokenKind::PipePipe => Some(PipeOp::Map),
                TokenKind::PipeTilde => Some(PipeOp::Filter),
                TokenKind::PipeGreater => Some(PipeOp::Reduce),
                TokenKind::GreaterGreater => None,
                _ => break,
            };
            self.advance();
            let right = self.parse_or()?;
            let span = left.span.merge(right.span);
            let kind = match op {
                Some(op) => ExprKind::Pipe {
                    value: Box::new(left),
                    op,
                    function: Box::new(right),
                },
                None => ExprKind::Generate {
                    count: Box::new(left),
                    producer: Box::new(right),
                },
            };
            left = Expr::new(kind, span);
        }
        Some(left)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `OrExpr = AndExpr { "or" AndExpr }`
    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = binary(left, BinOp::Or, right);
        }
        Some(left)
    }

    /// `AndExpr = EqExpr { "and" EqExpr }`
    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::And) {
            let right = self.parse_equality()?;
            left = binary(left, BinOp::And, right);
        }
        Some(left)
    }

    /// `EqExpr = CmpExpr { ("==" | "!=") CmpExpr }`
    fn parse_equality(&mut self) -> Option<Expr> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::BangEq => BinOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `CmpExpr = ConcatExpr { ("<" | "<=" | ">" | ">=") ConcatExpr }`
    fn parse_comparison(&mut self) -> Option<Expr> {
        let mut left = self.parse_concat()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Less => BinOp::Less,
                TokenKind::LessEq => BinOp::LessEq,
                TokenKind::Greater => BinOp::Greater,
                TokenKind::GreaterEq => BinOp::GreaterEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_concat()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `ConcatExpr = AddExpr { "++" AddExpr }`
    fn parse_concat(&mut self) -> Option<Expr> {
        let mut left = self.parse_add()?;
        while self.eat(&TokenKind::PlusPlus) {
            let right = self.parse_add()?;
            left = binary(left, BinOp::Concat, right);
        }
        Some(left)
    }

    /// `AddExpr = MulExpr { ("+" | "-") MulExpr }`
    fn parse_add(&mut self) -> Option<Expr> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_mul()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `MulExpr = Unary { ("*" | "/" | "%") Unary }`
    fn parse_mul(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `Unary = ("!" | "-") Unary | Power`
    pub(crate) fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.parse_power(),
        };
        let start = self.advance().span;
        if !self.descend() {
            return None;
        }
        let operand = self.parse_unary();
        self.ascend();
        let operand = operand?;
        let span = start.merge(operand.span);
        Some(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `Power = Postfix [ "^" Unary ]`
    fn parse_power(&mut self) -> Option<Expr> {
        let base = self.parse_postfix()?;
        if self.eat(&TokenKind::Caret) {
            let exponent = self.parse_unary()?;
            return Some(binary(base, BinOp::Pow, exponent));
        }
        Some(base)
    }

    /// `Postfix = Primary { "(" Items ")" | ":" Name [ "(" Items ")" ] }`
    fn parse_postfix(&mut self) -> Option<Expr> {
        let primary = self.parse_primary()?;
        self.parse_postfix_ops(primary, false)
    }

    /// Apply call and accessor suffixes to `expr`.
    ///
    /// With `strict`, a `(` only starts an argument list when it touches the
    /// token before it, so `f (x)` stays two operands.
    pub(crate) fn parse_postfix_ops(&mut self, mut expr: Expr, strict: bool) -> Option<Expr> {
        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    if strict && !self.current_touches_previous() {
                        break;
                    }
                    let open = self.advance().span;
                    let args = self.parse_items()?;
                    self.expect_close(open)?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                TokenKind::Colon => {
                    self.advance(); // eat `:`
                    let name = self.expect_member_name()?;
                    let has_args = self.check_exact(&TokenKind::LParen)
                        && (!strict || self.current_touches_previous());
                    let args = if has_args {
                        let open = self.advance().span;
                        let args = self.parse_items()?;
                        self.expect_close(open)?;
                        Some(args)
                    } else {
                        None
                    };
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Accessor {
                            object: Box::new(expr),
                            name,
                            args,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        Some(expr)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a primary expression.
    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let kind = self.peek_kind().clone();
        match kind {
            // ── Literals ────────────────────────────────────────────────
            TokenKind::NumberLit(n) => {
                self.advance();
                Some(Expr::new(ExprKind::NumberLit(n), start))
            }
            TokenKind::StringLiteral(s) => {
                self.advance();
                Some(Expr::new(ExprKind::StringLit(s), start))
            }
            TokenKind::True => {
                self.advance();
                Some(Expr::new(ExprKind::BoolLit(true), start))
            }
            TokenKind::False => {
                self.advance();
                Some(Expr::new(ExprKind::BoolLit(false), start))
            }
            TokenKind::Empty => {
                self.advance();
                Some(Expr::new(ExprKind::EmptyLit, start))
            }

            // ── Identifiers & lambdas ───────────────────────────────────
            TokenKind::Identifier(name) => {
                if matches!(self.look_ahead(1), TokenKind::FatArrow) {
                    return self.parse_lambda();
                }
                self.advance();
                Some(Expr::new(ExprKind::Identifier(name), start))
            }
            TokenKind::LParen => {
                if self.is_lambda_at(self.pos) {
                    self.parse_lambda()
                } else {
                    self.parse_group()
                }
            }
            TokenKind::Function => self.parse_function_keyword(),

            // ── Control flow & generation ───────────────────────────────
            TokenKind::If => self.parse_if(),
            TokenKind::Generate => self.parse_generate(),

            // ── Modules ─────────────────────────────────────────────────
            TokenKind::Import | TokenKind::Use => self.parse_import(),

            _ => {
                if let Some(geometry) = kind.geometry_kind() {
                    return self.parse_geometry(geometry, start);
                }
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected expression, got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    /// `GeomKw ( "EMPTY" | "(" Items ")" )?`
    fn parse_geometry(&mut self, kind: GeometryKind, start: Span) -> Option<Expr> {
        self.advance(); // eat the keyword
        if self.eat(&TokenKind::Empty) {
            let span = start.merge(self.previous_span());
            return Some(Expr::new(
                ExprKind::Geometry {
                    kind,
                    members: None,
                },
                span,
            ));
        }
        if !self.check_exact(&TokenKind::LParen) {
            return Some(Expr::new(ExprKind::KindName(kind), start));
        }
        let open = self.advance().span;
        let members = self.parse_items()?;
        self.expect_close(open)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::Geometry {
                kind,
                members: Some(members),
            },
            span,
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Lambda
    // ══════════════════════════════════════════════════════════════════════════

    /// `Lambda = ( Ident | "(" [ Ident {"," Ident} | "..." Ident ] ")" ) "=>" Body`
    ///
    /// A parenthesised body ends the lambda; any other body runs through
    /// `;` up to the enclosing `)`, `,` or end of input.
    pub(crate) fn parse_lambda(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let params = if matches!(self.peek_kind(), TokenKind::Identifier(_)) {
            Params::Positional(vec![self.expect_identifier()?])
        } else {
            let open = self.expect(&TokenKind::LParen)?.span;
            let params = if self.eat(&TokenKind::DotDotDot) {
                Params::Spread(self.expect_identifier()?)
            } else {
                let mut names = Vec::new();
                if !self.check_exact(&TokenKind::RParen) {
                    names.push(self.expect_identifier()?);
                    while self.eat(&TokenKind::Comma) {
                        names.push(self.expect_identifier()?);
                    }
                }
                Params::Positional(names)
            };
            self.expect_close(open)?;
            params
        };
        self.expect(&TokenKind::FatArrow)?;

        let body = if self.check_exact(&TokenKind::LParen) && !self.is_lambda_at(self.pos) {
            self.parse_group()?
        } else {
            self.parse_sequence()?
        };

        let span = start.merge(body.span);
        Some(Expr::new(
            ExprKind::Lambda(Rc::new(LambdaExpr { params, body, span })),
            span,
        ))
    }

    /// `"Function" "(" Lambda ")"`
    fn parse_function_keyword(&mut self) -> Option<Expr> {
        let start = self.advance().span; // eat `Function`
        let open = self.expect(&TokenKind::LParen)?.span;
        if !self.is_lambda_at(self.pos) {
            self.error_at_current(
                ErrorCode::INVALID_PARAMETER_LIST,
                "Function(...) expects a lambda such as Function((a, b) => a + b)",
            );
            return None;
        }
        let lambda = self.parse_lambda()?;
        self.expect_close(open)?;
        Some(Expr::new(lambda.kind, start.merge(self.previous_span())))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Control Flow & Generation
    // ══════════════════════════════════════════════════════════════════════════

    /// `"if" Unary "then" Unary [ "else" Unary ]`
    fn parse_if(&mut self) -> Option<Expr> {
        let start = self.advance().span; // eat `if`
        let condition = self.parse_unary()?;
        self.expect(&TokenKind::Then)?;
        let then_branch = self.parse_unary()?;
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_unary()?))
        } else {
            None
        };
        let span = start.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch,
            },
            span,
        ))
    }

    /// `"Generate" Operand Operand`
    fn parse_generate(&mut self) -> Option<Expr> {
        let start = self.advance().span; // eat `Generate`
        let count = self.parse_generate_operand()?;
        let producer = self.parse_generate_operand()?;
        let span = start.merge(producer.span);
        Some(Expr::new(
            ExprKind::Generate {
                count: Box::new(count),
                producer: Box::new(producer),
            },
            span,
        ))
    }

    /// A lambda, or a primary with tightly attached calls and accessors.
    fn parse_generate_operand(&mut self) -> Option<Expr> {
        if self.is_lambda_at(self.pos) {
            return self.parse_lambda();
        }
        let primary = self.parse_primary()?;
        self.parse_postfix_ops(primary, true)
    }
}
