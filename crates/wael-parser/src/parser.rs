//! Core parser infrastructure: token cursor, error reporting, helpers.

use wael_lexer::{Lexer, Token, TokenKind};
use wael_types::ast::{Ident, Program};
use wael_types::{ErrorCode, ErrorList, SourceFile, Span, WaelError};

/// Maximum nesting depth of expressions before the parser gives up.
pub const MAX_NESTING_DEPTH: u32 = 64;

/// The WAEL parser.
///
/// Consumes a token stream produced by the lexer and builds an AST.
/// Collects errors and resumes at the next top-level `;` after each one.
pub struct Parser<'src> {
    /// The token stream.
    pub(crate) tokens: Vec<Token>,
    /// Current index into `tokens`.
    pub(crate) pos: usize,
    /// Source file for error context.
    source_file: &'src SourceFile,
    /// File name for error messages.
    file_name: String,
    /// Collected errors.
    errors: ErrorList,
    /// Current expression nesting depth.
    depth: u32,
}

/// Result of parsing.
pub struct ParseResult {
    pub program: Option<Program>,
    pub errors: ErrorList,
}

impl ParseResult {
    /// Returns the program only when no diagnostics were produced.
    pub fn into_program(self) -> Result<Program, ErrorList> {
        match self.program {
            Some(program) if !self.errors.has_errors() => Ok(program),
            _ => Err(self.errors),
        }
    }
}

/// Lex and parse a source file, merging lexer and parser diagnostics.
pub fn parse_source(source_file: &SourceFile) -> ParseResult {
    let lexed = Lexer::new(source_file).lex();
    let mut result = Parser::new(lexed.tokens, source_file).parse();
    if lexed.errors.has_errors() {
        let mut errors = lexed.errors;
        errors.extend(result.errors);
        result.errors = errors;
    }
    result
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source file.
    pub fn new(mut tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let span = tokens.last().map_or(Span::point(1, 1), |t| t.span);
            tokens.push(Token::new(TokenKind::Eof, span));
        }
        Self {
            tokens,
            pos: 0,
            file_name: source_file.name.clone(),
            source_file,
            errors: ErrorList::empty(),
            depth: 0,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Returns the previously consumed token's span.
    pub(crate) fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::point(1, 1)
        }
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// Check if the current token matches the given kind exactly.
    pub(crate) fn check_exact(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check_exact(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.kind_at(self.pos + n)
    }

    /// Kind of the token at an absolute index (`Eof` past the end).
    pub(crate) fn kind_at(&self, idx: usize) -> &TokenKind {
        self.tokens
            .get(idx)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// `true` when the current token starts right where the previous one ended.
    pub(crate) fn current_touches_previous(&self) -> bool {
        self.pos > 0 && self.previous_span().touches(self.current_span())
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind. Returns the token if matched, or emits an error.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Token> {
        if self.check_exact(expected) {
            Some(self.advance())
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected '{}', got '{}'", expected, self.peek_kind()),
            );
            None
        }
    }

    /// Expect the `)` matching an `(` opened at `open`.
    pub(crate) fn expect_close(&mut self, open: Span) -> Option<Token> {
        if self.check_exact(&TokenKind::RParen) {
            return Some(self.advance());
        }
        if self.at_end() {
            self.error_at(
                ErrorCode::UNCLOSED_DELIMITER,
                format!("unclosed '(' opened at {open}"),
                open,
            );
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected ')', got '{}'", self.peek_kind()),
            );
        }
        None
    }

    /// Expect an identifier token.
    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected identifier, got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    /// Expect an identifier OR a keyword used as an accessor name (`g:type`).
    pub(crate) fn expect_member_name(&mut self) -> Option<Ident> {
        let kind = self.peek_kind().clone();
        match &kind {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Some(Ident::new(name.clone(), span))
            }
            _ if kind.is_keyword() => {
                let span = self.advance().span;
                Some(Ident::new(kind.to_string(), span))
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected accessor name, got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    // ── Nesting Guard ─────────────────────────────────────────────────────────

    /// Enter one nesting level. Returns `false` (with an error) past the limit.
    pub(crate) fn descend(&mut self) -> bool {
        if self.depth >= MAX_NESTING_DEPTH {
            self.error_at_current(
                ErrorCode::NESTING_LIMIT_EXCEEDED,
                format!("maximum expression nesting depth is {MAX_NESTING_DEPTH}"),
            );
            return false;
        }
        self.depth += 1;
        true
    }

    /// Leave one nesting level.
    pub(crate) fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report an error at the current token position.
    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    /// Report an error at a specific span.
    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self
            .source_file
            .line(span.start_line)
            .unwrap_or("")
            .to_string();
        let error = WaelError::new(&self.file_name, code, message, span, source_line);
        self.errors.push_error(error);
    }

    /// Returns `true` if we've hit the error limit and should stop.
    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.is_full()
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip tokens until just past the next `;` outside any parentheses.
    pub(crate) fn synchronize(&mut self) {
        let mut depth = self.tokens[..self.pos]
            .iter()
            .fold(0usize, |depth, t| match t.kind {
                TokenKind::LParen => depth + 1,
                TokenKind::RParen => depth.saturating_sub(1),
                _ => depth,
            });
        while !self.at_end() {
            match self.peek_kind() {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth = depth.saturating_sub(1),
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a `Program` AST.
    pub fn parse(mut self) -> ParseResult {
        let program = self.parse_program();
        ParseResult {
            program,
            errors: self.errors,
        }
    }
}
