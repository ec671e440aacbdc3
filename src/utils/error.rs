//! Error handling for Formulax operations
//!
//! This module provides the typed failure returned by the calculator and
//! the non-fatal warnings collected by the parser.

use std::fmt;

/// Evaluation failure type.
///
/// Every arithmetic dead end is reported as one of these variants; the
/// evaluator never panics and leaves the original tokens untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalFailure {
    /// Operands of incompatible kinds (e.g. matrix plus scalar)
    TypeMismatch { message: String },
    /// Matrix dimensions do not fit the operation
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    /// Factorial of anything but an exact nonnegative integer
    FactorialDomain,
    /// An operator or symbol with no interpretation
    UnknownOperator { symbol: String },
    /// Division by an exactly-zero value
    DivisionByZero,
    /// Intermediate result exceeded the 64-bit rational range
    Overflow,
    /// Result outside the representable domain (e.g. sqrt of a negative)
    Domain { message: String },
    /// The token span could not be reduced to a value
    NoValue,
}

impl fmt::Display for EvalFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalFailure::TypeMismatch { message } => {
                write!(f, "Type mismatch: {}", message)
            }
            EvalFailure::DimensionMismatch { left, right } => {
                write!(
                    f,
                    "Dimension mismatch: {}x{} against {}x{}",
                    left.0, left.1, right.0, right.1
                )
            }
            EvalFailure::FactorialDomain => {
                write!(f, "Factorial is only defined for exact nonnegative integers")
            }
            EvalFailure::UnknownOperator { symbol } => {
                write!(f, "Unknown operator '{}'", symbol)
            }
            EvalFailure::DivisionByZero => write!(f, "Division by zero"),
            EvalFailure::Overflow => write!(f, "Arithmetic overflow"),
            EvalFailure::Domain { message } => write!(f, "Domain error: {}", message),
            EvalFailure::NoValue => write!(f, "Expression does not reduce to a value"),
        }
    }
}

impl std::error::Error for EvalFailure {}

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalFailure>;

// Convenience constructors
impl EvalFailure {
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        EvalFailure::TypeMismatch {
            message: message.into(),
        }
    }

    pub fn dimension(left: (usize, usize), right: (usize, usize)) -> Self {
        EvalFailure::DimensionMismatch { left, right }
    }

    pub fn unknown(symbol: impl Into<String>) -> Self {
        EvalFailure::UnknownOperator {
            symbol: symbol.into(),
        }
    }

    pub fn domain(message: impl Into<String>) -> Self {
        EvalFailure::Domain {
            message: message.into(),
        }
    }
}

/// Kind of warning generated while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseWarningKind {
    /// A closing brace with no matching opener
    UnmatchedBrace,
    /// A mandatory argument was absent at end of input
    MissingArgument,
    /// Nesting exceeded the recursion ceiling
    DepthCeiling,
    /// An `\end` with no matching `\begin`
    StrayEnd,
}

impl fmt::Display for ParseWarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarningKind::UnmatchedBrace => write!(f, "unmatched brace"),
            ParseWarningKind::MissingArgument => write!(f, "missing argument"),
            ParseWarningKind::DepthCeiling => write!(f, "depth ceiling"),
            ParseWarningKind::StrayEnd => write!(f, "stray end"),
        }
    }
}

/// A non-fatal issue noticed by the parser.
///
/// Warnings never change the returned AST; the parser always produces
/// its best effort.
#[derive(Debug, Clone)]
pub struct ParseWarning {
    /// The kind of warning
    pub kind: ParseWarningKind,
    /// Human-readable message
    pub message: String,
    /// Byte offset into the source, when known
    pub offset: Option<usize>,
}

impl ParseWarning {
    /// Create a new warning
    pub fn new(kind: ParseWarningKind, message: impl Into<String>) -> Self {
        ParseWarning {
            kind,
            message: message.into(),
            offset: None,
        }
    }

    /// Add a source offset to the warning
    pub fn at(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(off) = self.offset {
            write!(f, "[{}] at {}: {}", self.kind, off, self.message)
        } else {
            write!(f, "[{}] {}", self.kind, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display() {
        let err = EvalFailure::type_mismatch("cannot add matrix and number");
        assert!(err.to_string().contains("Type mismatch"));
        assert!(err.to_string().contains("matrix"));
    }

    #[test]
    fn test_dimension_display() {
        let err = EvalFailure::dimension((2, 3), (4, 2));
        assert_eq!(err.to_string(), "Dimension mismatch: 2x3 against 4x2");
    }

    #[test]
    fn test_warning_display() {
        let warn = ParseWarning::new(ParseWarningKind::UnmatchedBrace, "sequence terminated").at(12);
        let msg = warn.to_string();
        assert!(msg.contains("unmatched brace"));
        assert!(msg.contains("12"));
    }
}
