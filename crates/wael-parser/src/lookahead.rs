//! Token lookahead used to decide between ambiguous forms without
//! backtracking: lambda heads and juxtaposed point pairs.
//!
//! All helpers work on absolute token indices and never move the cursor.

use wael_lexer::TokenKind;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// `true` if the token at `idx` starts a lambda:
    /// `x =>`, `() =>`, `(a, b) =>` or `(...xs) =>`.
    pub(crate) fn is_lambda_at(&self, idx: usize) -> bool {
        match self.kind_at(idx) {
            TokenKind::Identifier(_) => matches!(self.kind_at(idx + 1), TokenKind::FatArrow),
            TokenKind::LParen => {
                let mut i = idx + 1;
                match self.kind_at(i) {
                    TokenKind::RParen => {}
                    TokenKind::DotDotDot => {
                        if !matches!(self.kind_at(i + 1), TokenKind::Identifier(_)) {
                            return false;
                        }
                        i += 2;
                    }
                    TokenKind::Identifier(_) => {
                        i += 1;
                        while matches!(self.kind_at(i), TokenKind::Comma) {
                            if !matches!(self.kind_at(i + 1), TokenKind::Identifier(_)) {
                                return false;
                            }
                            i += 2;
                        }
                    }
                    _ => return false,
                }
                matches!(self.kind_at(i), TokenKind::RParen)
                    && matches!(self.kind_at(i + 1), TokenKind::FatArrow)
            }
            _ => false,
        }
    }

    /// `true` when the current position holds two coordinate atoms
    /// followed by `,` or `)`: the point-pair form `x y`.
    pub(crate) fn point_pair_ahead(&self) -> bool {
        let first = self.pos;
        let Some(second) = self.atom_end(first) else {
            return false;
        };
        let Some(end) = self.atom_end(second) else {
            return false;
        };
        matches!(self.kind_at(end), TokenKind::RParen | TokenKind::Comma)
    }

    /// `true` if a sign at `idx` belongs to the number after it: the sign
    /// touches the number and is separated from whatever came before
    /// (`1 -1`), or opens the item (`(-1 2)`).
    pub(crate) fn is_signed_number_at(&self, idx: usize) -> bool {
        if !matches!(self.kind_at(idx), TokenKind::Minus | TokenKind::Plus)
            || !matches!(self.kind_at(idx + 1), TokenKind::NumberLit(_))
        {
            return false;
        }
        let sign = self.tokens[idx].span;
        if !sign.touches(self.tokens[idx + 1].span) {
            return false;
        }
        match idx.checked_sub(1).map(|prev| &self.tokens[prev]) {
            None => true,
            Some(prev) => {
                matches!(prev.kind, TokenKind::LParen | TokenKind::Comma)
                    || !prev.span.touches(sign)
            }
        }
    }

    /// If a coordinate atom starts at `idx`, return the index just past it.
    ///
    /// Atoms are numbers (optionally signed), parenthesised groups, and
    /// identifier chains whose calls touch their callee.
    pub(crate) fn atom_end(&self, idx: usize) -> Option<usize> {
        match self.kind_at(idx) {
            TokenKind::NumberLit(_) => Some(idx + 1),
            TokenKind::Minus | TokenKind::Plus if self.is_signed_number_at(idx) => Some(idx + 2),
            TokenKind::LParen if !self.is_lambda_at(idx) => self.matching_paren(idx).map(|i| i + 1),
            TokenKind::Identifier(_)
                if !matches!(self.kind_at(idx + 1), TokenKind::FatArrow | TokenKind::Eq) =>
            {
                Some(self.chain_end(idx + 1))
            }
            _ => None,
        }
    }

    /// Skip `:name`, `:name(...)` and touching `(...)` suffixes from `idx`.
    fn chain_end(&self, mut idx: usize) -> usize {
        loop {
            match self.kind_at(idx) {
                TokenKind::Colon
                    if matches!(self.kind_at(idx + 1), TokenKind::Identifier(_))
                        || self.kind_at(idx + 1).is_keyword() =>
                {
                    idx += 2;
                }
                TokenKind::LParen if self.tokens[idx - 1].span.touches(self.tokens[idx].span) => {
                    match self.matching_paren(idx) {
                        Some(close) => idx = close + 1,
                        None => return idx,
                    }
                }
                _ => return idx,
            }
        }
    }

    /// Index of the `)` that closes the `(` at `open`.
    pub(crate) fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(open) {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
        }
        None
    }
}
