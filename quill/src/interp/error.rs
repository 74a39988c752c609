//! Runtime errors for the interpreter

use crate::ast::Span;
use std::fmt;

/// Runtime error during evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// Innermost node that failed, when known
    pub span: Option<Span>,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// First address segment not bound in any searchable scope
    UnknownIdentifier,
    /// Member read/write on a value kind that has no members
    UnsupportedMemberAccess,
    /// Object key absent
    KeyNotFound,
    /// List index absent, negative, or not an int
    IndexOutOfRange,
    /// Wrong value kind for the operation
    TypeMismatch,
    /// Division or modulo by zero
    DivisionByZero,
    /// AST node the runtime does not evaluate
    UnsupportedNodeKind,
    /// Binary operator the runtime does not evaluate
    UnsupportedOperator,
    /// Scope stack misuse
    InvalidState,
    /// Evaluation nested deeper than the configured limit
    StackOverflow,
}

impl RuntimeError {
    fn new(kind: ErrorKind, message: String) -> Self {
        RuntimeError {
            kind,
            message,
            span: None,
        }
    }

    pub fn unknown_identifier(name: &str) -> Self {
        Self::new(ErrorKind::UnknownIdentifier, format!("unknown identifier: {name}"))
    }

    pub fn unsupported_member_access(type_name: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedMemberAccess,
            format!("member access is not supported on {type_name}"),
        )
    }

    pub fn key_not_found(key: &str) -> Self {
        Self::new(ErrorKind::KeyNotFound, format!("key {key} not found"))
    }

    pub fn index_out_of_range(index: &str, len: usize) -> Self {
        Self::new(
            ErrorKind::IndexOutOfRange,
            format!("index {index} out of range for list of length {len}"),
        )
    }

    pub fn type_mismatch(expected: &str, got: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("type mismatch: expected {expected}, got {got}"),
        )
    }

    pub fn division_by_zero() -> Self {
        Self::new(ErrorKind::DivisionByZero, "division by zero".to_string())
    }

    pub fn unsupported_node_kind(kind: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedNodeKind,
            format!("{kind} is not supported at runtime"),
        )
    }

    pub fn unsupported_operator(op: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedOperator,
            format!("operator {op} is not supported at runtime"),
        )
    }

    pub fn invalid_state(msg: &str) -> Self {
        Self::new(ErrorKind::InvalidState, format!("invalid state: {msg}"))
    }

    pub fn stack_overflow(limit: usize) -> Self {
        Self::new(
            ErrorKind::StackOverflow,
            format!("stack overflow: expression nested deeper than {limit} levels"),
        )
    }

    /// Attach a span unless a more precise one is already recorded
    pub fn at(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error: {}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_identifier() {
        let err = RuntimeError::unknown_identifier("foo");
        assert_eq!(err.kind, ErrorKind::UnknownIdentifier);
        assert!(err.message.contains("foo"));
        assert!(err.span.is_none());
    }

    #[test]
    fn test_type_mismatch() {
        let err = RuntimeError::type_mismatch("primitive", "list");
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert!(err.message.contains("primitive"));
        assert!(err.message.contains("list"));
    }

    #[test]
    fn test_index_out_of_range() {
        let err = RuntimeError::index_out_of_range("3", 3);
        assert_eq!(err.kind, ErrorKind::IndexOutOfRange);
        assert_eq!(err.message, "index 3 out of range for list of length 3");
    }

    #[test]
    fn test_division_by_zero() {
        let err = RuntimeError::division_by_zero();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
        assert_eq!(err.to_string(), "Runtime error: division by zero");
    }

    #[test]
    fn test_invalid_state() {
        let err = RuntimeError::invalid_state("cannot ascend past the global scope");
        assert_eq!(err.kind, ErrorKind::InvalidState);
        assert!(err.message.contains("global scope"));
    }

    #[test]
    fn test_at_keeps_innermost_span() {
        let err = RuntimeError::key_not_found("3")
            .at(Span::new(4, 5))
            .at(Span::new(0, 10));
        assert_eq!(err.span, Some(Span::new(4, 5)));
    }

    #[test]
    fn test_unsupported_operator_and_node_kind() {
        assert_eq!(
            RuntimeError::unsupported_operator("<").kind,
            ErrorKind::UnsupportedOperator
        );
        assert_eq!(
            RuntimeError::unsupported_node_kind("function call").kind,
            ErrorKind::UnsupportedNodeKind
        );
    }
}
