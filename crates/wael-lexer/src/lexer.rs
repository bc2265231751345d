//! Core lexer: converts source text to a token stream.
//!
//! - Keywords are case-insensitive (`Point`, `POINT`, `point`)
//! - `#` starts a comment that runs to end of line
//! - Whitespace, including newlines, only separates tokens
//! - Error recovery: collects up to 20 errors instead of stopping at the first

use wael_types::{ErrorCode, ErrorList, SourceFile, Span, WaelError};

use crate::token::{Token, TokenKind};

/// The lexer.
///
/// Converts source text into a vector of [`Token`]s, collecting up to
/// [`wael_types::MAX_ERRORS`] errors along the way.
pub struct Lexer<'src> {
    /// The full source text as bytes.
    source: &'src [u8],
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    col: u32,
    /// Collected errors.
    errors: ErrorList,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    /// Errors encountered during lexing.
    pub errors: ErrorList,
}

/// Position where the token being scanned started.
#[derive(Clone, Copy)]
struct Mark {
    pos: usize,
    line: u32,
    col: u32,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            errors: ErrorList::empty(),
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            if self.errors.is_full() {
                break;
            }
            let token = self.scan_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else if !is_utf8_continuation(ch) {
            self.col += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            col: self.col,
        }
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start: Mark) -> Span {
        Span::new(
            start.line,
            start.col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn token_from(&self, kind: TokenKind, start: Mark) -> Token {
        Token::new(kind, self.span_from(start))
    }

    fn lexeme(&self, start: Mark) -> &'src str {
        std::str::from_utf8(&self.source[start.pos..self.pos]).unwrap_or("")
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self
            .source_file
            .line(span.start_line)
            .unwrap_or("")
            .to_string();
        let err = WaelError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace and `#` comments.
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.advance();
                }
                b'#' => {
                    while let Some(ch) = self.peek() {
                        if ch == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Token scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token.
    fn scan_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.mark();
        let Some(ch) = self.advance() else {
            return Token::new(TokenKind::Eof, self.current_span());
        };

        let kind = match ch {
            // ── Literals ──
            b'"' | b'\'' => return self.scan_string(ch, start),
            b'0'..=b'9' => return self.scan_number(start),
            b'.' if matches!(self.peek(), Some(b'0'..=b'9')) => return self.scan_number(start),

            // ── Identifiers & keywords ──
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' => return self.scan_identifier(start),

            // ── Operators ──
            b'+' => {
                if self.eat(b'+') {
                    TokenKind::PlusPlus
                } else {
                    TokenKind::Plus
                }
            }
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'^' => TokenKind::Caret,
            b'=' => {
                if self.eat(b'=') {
                    TokenKind::EqEq
                } else if self.eat(b'>') {
                    TokenKind::FatArrow
                } else {
                    TokenKind::Eq
                }
            }
            b'!' => {
                if self.eat(b'=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }
            b'<' => {
                if self.eat(b'=') {
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                }
            }
            b'>' => {
                if self.eat(b'=') {
                    TokenKind::GreaterEq
                } else if self.eat(b'>') {
                    TokenKind::GreaterGreater
                } else {
                    TokenKind::Greater
                }
            }
            b'|' => match self.peek() {
                Some(b'*') => {
                    self.advance();
                    TokenKind::PipeStar
                }
                Some(b'|') => {
                    self.advance();
                    TokenKind::PipePipe
                }
                Some(b'~') => {
                    self.advance();
                    TokenKind::PipeTilde
                }
                Some(b'>') => {
                    self.advance();
                    TokenKind::PipeGreater
                }
                _ => TokenKind::Pipe,
            },

            // ── Punctuation ──
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b':' => TokenKind::Colon,
            b'.' if self.peek() == Some(b'.') && self.peek_at(1) == Some(b'.') => {
                self.advance();
                self.advance();
                TokenKind::DotDotDot
            }

            _ => {
                // Consume the rest of a multi-byte character so the error
                // names the whole character.
                while self.peek().is_some_and(is_utf8_continuation) {
                    self.advance();
                }
                let span = self.span_from(start);
                let text = String::from_utf8_lossy(&self.source[start.pos..self.pos]).into_owned();
                self.emit_error(
                    ErrorCode::UNEXPECTED_CHARACTER,
                    format!("Unexpected character '{text}'"),
                    span,
                );
                if self.errors.is_full() {
                    return Token::new(TokenKind::Eof, self.current_span());
                }
                // Error recovery: skip the character and try again
                return self.scan_token();
            }
        };

        self.token_from(kind, start)
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start: Mark) -> Token {
        // The first digit (or leading `.`) was already consumed.
        while let Some(b'0'..=b'9') = self.peek() {
            self.advance();
        }

        let leading_dot = self.source[start.pos] == b'.';
        if !leading_dot && self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9'))
        {
            self.advance(); // consume '.'
            while let Some(b'0'..=b'9') = self.peek() {
                self.advance();
            }
        }

        // Exponent: only when digits follow, so `2e` stays `2` then `e`.
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let digits_at = if matches!(self.peek_at(1), Some(b'+' | b'-')) {
                2
            } else {
                1
            };
            if matches!(self.peek_at(digits_at), Some(b'0'..=b'9')) {
                for _ in 0..digits_at {
                    self.advance();
                }
                while let Some(b'0'..=b'9') = self.peek() {
                    self.advance();
                }
            }
        }

        let span = self.span_from(start);
        let text = self.lexeme(start);
        match text.parse::<f64>() {
            Ok(value) => Token::new(TokenKind::NumberLit(value), span),
            Err(_) => {
                self.emit_error(
                    ErrorCode::MALFORMED_NUMBER,
                    format!("Malformed number literal '{text}'"),
                    span,
                );
                Token::new(TokenKind::NumberLit(0.0), span)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, start: Mark) -> Token {
        // First character was already consumed (letter, `_` or `$`)
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || matches!(ch, b'_' | b'?' | b'\'') {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.lexeme(start);
        let kind =
            TokenKind::from_keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()));

        self.token_from(kind, start)
    }

    // ─────────────────────────────────────────────────────────────
    // String literals
    // ─────────────────────────────────────────────────────────────

    /// Scan a string literal starting after the opening quote.
    fn scan_string(&mut self, quote: u8, start: Mark) -> Token {
        let mut buf = Vec::new();

        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_STRING,
                        "Unterminated string literal",
                        span,
                    );
                    break;
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }

        let text = String::from_utf8_lossy(&buf).into_owned();
        self.token_from(TokenKind::StringLiteral(text), start)
    }

    /// Scan an escape sequence at the `\`.
    /// Returns the unescaped byte, or `None` at end of input (error emitted).
    fn scan_escape_sequence(&mut self) -> Option<u8> {
        let start = self.mark();
        self.advance(); // consume the '\'

        match self.advance() {
            Some(b'"') => Some(b'"'),
            Some(b'\'') => Some(b'\''),
            Some(b'\\') => Some(b'\\'),
            Some(b'n') => Some(b'\n'),
            Some(b't') => Some(b'\t'),
            Some(b'r') => Some(b'\r'),
            Some(ch) => {
                let span = self.span_from(start);
                self.emit_error(
                    ErrorCode::INVALID_ESCAPE,
                    format!("Invalid escape sequence '\\{}'", ch as char),
                    span,
                );
                Some(ch) // error recovery: keep the char as-is
            }
            None => {
                let span = self.span_from(start);
                self.emit_error(
                    ErrorCode::UNTERMINATED_STRING,
                    "Unexpected end of input in escape sequence",
                    span,
                );
                None
            }
        }
    }
}

fn is_utf8_continuation(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}
