//! WAEL parser: converts a token stream into an AST.

mod lookahead;
mod parse_expr;
mod parse_items;
mod parse_stmt;
mod parser;

pub use parser::{parse_source, ParseResult, Parser, MAX_NESTING_DEPTH};
