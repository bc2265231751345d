//! Program, sequence and statement parsing.

use wael_lexer::TokenKind;
use wael_types::ast::*;
use wael_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// `Program = [ Sequence ] EOF`
    ///
    /// Top-level statements are parsed one at a time so that an error in
    /// one statement does not hide errors in the next.
    pub(crate) fn parse_program(&mut self) -> Option<Program> {
        let start = self.current_span();
        let mut body = Vec::new();
        loop {
            while self.eat(&TokenKind::Semicolon) {}
            if self.at_end() || self.too_many_errors() {
                break;
            }
            match self.parse_statement() {
                Some(stmt) => {
                    body.push(stmt);
                    if !self.at_end() && !self.check_exact(&TokenKind::Semicolon) {
                        self.error_at_current(
                            ErrorCode::UNEXPECTED_TOKEN,
                            format!("expected ';' or end of input, got '{}'", self.peek_kind()),
                        );
                        self.synchronize();
                    }
                }
                None => self.synchronize(),
            }
        }
        let span = start.merge(self.previous_span());
        Some(Program { body, span })
    }

    /// `Sequence = Statement { ";" [ Statement ] }`
    ///
    /// Stops before `)`, `,` or end of input.
    pub(crate) fn parse_sequence(&mut self) -> Option<Expr> {
        let first = self.parse_statement()?;
        if self.check_exact(&TokenKind::Semicolon) {
            self.parse_sequence_rest(first)
        } else {
            Some(first)
        }
    }

    /// Continue a sequence whose first statement is already parsed.
    pub(crate) fn parse_sequence_rest(&mut self, first: Expr) -> Option<Expr> {
        let start = first.span;
        let mut stmts = vec![first];
        while self.eat(&TokenKind::Semicolon) {
            if matches!(
                self.peek_kind(),
                TokenKind::RParen | TokenKind::Comma | TokenKind::Semicolon | TokenKind::Eof
            ) {
                continue;
            }
            stmts.push(self.parse_statement()?);
        }
        if stmts.len() == 1 {
            return stmts.pop();
        }
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::Sequence(stmts), span))
    }

    /// `Statement = [ "export" ] [ "let" ] Ident "=" Statement | Expression`
    pub(crate) fn parse_statement(&mut self) -> Option<Expr> {
        if !self.descend() {
            return None;
        }
        let result = self.parse_statement_inner();
        self.ascend();
        result
    }

    fn parse_statement_inner(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let export = self.eat(&TokenKind::Export);
        let local = self.eat(&TokenKind::Let);
        let is_assignment = matches!(self.peek_kind(), TokenKind::Identifier(_))
            && matches!(self.look_ahead(1), TokenKind::Eq);

        if export || local || is_assignment {
            if !matches!(self.peek_kind(), TokenKind::Identifier(_)) {
                self.error_at_current(
                    ErrorCode::INVALID_ASSIGNMENT_TARGET,
                    format!("expected a name to bind, got '{}'", self.peek_kind()),
                );
                return None;
            }
            let target = self.expect_identifier()?;
            self.expect(&TokenKind::Eq)?;
            let value = self.parse_statement()?;
            let span = start.merge(value.span);
            return Some(Expr::new(
                ExprKind::Assign {
                    target,
                    value: Box::new(value),
                    export,
                    local,
                },
                span,
            ));
        }

        let expr = self.parse_expression()?;
        if self.check_exact(&TokenKind::Eq) {
            self.error_at_current(
                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                "only a plain name can be assigned to",
            );
            return None;
        }
        Some(expr)
    }

    /// `("import" | "use") "(" Statement ")" [ ("using" | "with") "(" ("*" | Name {"," Name}) ")" ]`
    pub(crate) fn parse_import(&mut self) -> Option<Expr> {
        let start = self.advance().span; // eat `import` / `use`
        let open = self.expect(&TokenKind::LParen)?.span;
        let source = self.parse_statement()?;
        self.expect_close(open)?;

        let names = if self.eat(&TokenKind::Using) || self.eat(&TokenKind::With) {
            let open = self.expect(&TokenKind::LParen)?.span;
            let names = if self.eat(&TokenKind::Star) {
                ImportNames::All
            } else {
                let mut names = vec![self.expect_identifier()?];
                while self.eat(&TokenKind::Comma) {
                    names.push(self.expect_identifier()?);
                }
                ImportNames::Named(names)
            };
            self.expect_close(open)?;
            Some(names)
        } else {
            None
        };

        let span = start.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::Import {
                source: Box::new(source),
                names,
            },
            span,
        ))
    }
}
