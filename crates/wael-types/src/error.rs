use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of errors reported before fail-fast.
pub const MAX_ERRORS: usize = 20;

/// Error severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Lexical,
    Syntax,
}

/// Numeric error code (E100–E199).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Lexical errors (E100–E149) ──
    pub const UNEXPECTED_CHARACTER: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const INVALID_ESCAPE: Self = Self(102);
    pub const MALFORMED_NUMBER: Self = Self(103);

    // ── Syntax errors (E150–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(150);
    pub const UNCLOSED_DELIMITER: Self = Self(151);
    pub const INVALID_ASSIGNMENT_TARGET: Self = Self(152);
    pub const INVALID_PARAMETER_LIST: Self = Self(153);
    pub const NESTING_LIMIT_EXCEEDED: Self = Self(154);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=149 => ErrorCategory::Lexical,
            _ => ErrorCategory::Syntax,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A structured front-end diagnostic.
///
/// Serializes to a flat JSON object so hosts can render it without parsing
/// free-form strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaelError {
    /// Source file name.
    pub file: String,
    /// Error code (e.g., E150).
    pub code: ErrorCode,
    /// Error severity.
    pub severity: Severity,
    /// Error category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable error message.
    pub message: String,
    /// Source location.
    #[serde(flatten)]
    pub span: Span,
    /// The exact source line for context.
    pub source_line: String,
    /// Optional fix suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl WaelError {
    /// Create a new error.
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for WaelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for WaelError {}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical => write!(f, "lexical"),
            Self::Syntax => write!(f, "syntax"),
        }
    }
}

/// Diagnostics collected by one lexer or parser run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorList {
    pub errors: Vec<WaelError>,
    pub total_errors: usize,
}

impl ErrorList {
    /// Create an empty list.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Returns `true` once the reporting cap is reached.
    pub fn is_full(&self) -> bool {
        self.total_errors >= MAX_ERRORS
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push_error(&mut self, error: WaelError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Append every diagnostic from `other`.
    pub fn extend(&mut self, other: ErrorList) {
        let dropped = other.total_errors - other.errors.len();
        for error in other.errors {
            self.push_error(error);
        }
        self.total_errors += dropped;
    }

    /// The first recorded diagnostic, if any.
    pub fn first(&self) -> Option<&WaelError> {
        self.errors.first()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first() {
            Some(first) if self.total_errors > 1 => {
                write!(f, "{first} (and {} more)", self.total_errors - 1)
            }
            Some(first) => write!(f, "{first}"),
            None => write!(f, "no errors"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WaelError {
        WaelError::new(
            "test.wael",
            ErrorCode::UNEXPECTED_TOKEN,
            "expected ')', got ';'",
            Span::new(2, 9, 2, 9),
            "Point(1 2;",
        )
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(
            ErrorCode::UNTERMINATED_STRING.category(),
            ErrorCategory::Lexical
        );
        assert_eq!(
            ErrorCode::UNEXPECTED_TOKEN.category(),
            ErrorCategory::Syntax
        );
        assert_eq!(
            ErrorCode::NESTING_LIMIT_EXCEEDED.category(),
            ErrorCategory::Syntax
        );
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(format!("{}", ErrorCode::UNEXPECTED_CHARACTER), "E100");
        assert_eq!(format!("{}", ErrorCode::UNEXPECTED_TOKEN), "E150");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            sample().to_string(),
            "2:9: E150 [syntax] expected ')', got ';'"
        );
    }

    #[test]
    fn test_error_with_suggestion() {
        let err = sample().with_suggestion("close the point with ')'");
        assert_eq!(err.suggestion.as_deref(), Some("close the point with ')'"));
    }

    #[test]
    fn test_error_json_serialization() {
        let err = sample();
        let json = serde_json::to_string_pretty(&err).unwrap();
        assert!(json.contains("\"code\""));
        assert!(json.contains("\"source_line\""));
        assert!(json.contains("\"line\""));
        assert!(json.contains("\"column\""));
        assert!(json.contains("\"end_column\""));
        assert!(!json.contains("\"suggestion\""));

        let back: WaelError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_error_list_max_limit() {
        let mut errs = ErrorList::empty();
        for i in 0..25 {
            errs.push_error(WaelError::new(
                "test.wael",
                ErrorCode::UNEXPECTED_TOKEN,
                format!("Error {i}"),
                Span::point(i as u32 + 1, 1),
                "",
            ));
        }
        assert_eq!(errs.errors.len(), 20);
        assert_eq!(errs.total_errors, 25);
        assert!(errs.is_full());
    }

    #[test]
    fn test_error_list_extend_keeps_totals() {
        let mut a = ErrorList::empty();
        a.push_error(sample());
        let mut b = ErrorList::empty();
        b.push_error(sample());
        b.push_error(sample());
        a.extend(b);
        assert_eq!(a.total_errors, 3);
        assert_eq!(a.errors.len(), 3);
        assert_eq!(a.to_string(), format!("{} (and 2 more)", sample()));
    }

    #[test]
    fn test_error_list_empty() {
        let errs = ErrorList::empty();
        assert!(!errs.has_errors());
        assert_eq!(errs.first(), None);
    }
}
