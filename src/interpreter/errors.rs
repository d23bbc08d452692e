//! Runtime error types and diagnostics
//!
//! This module defines [`RuntimeError`], the single error type that travels
//! through the tokenizer, the validator and every keyword. Language-level
//! errors carry a classification ([`ErrorKind`]); anything else is an
//! [`RuntimeError::Internal`] host-level failure.
//!
//! All errors are fatal to the current run. At the tick boundary the engine
//! turns them into an [`ErrorReport`] (message, line, file, call stack) and
//! hands it to the error callback. Non-fatal diagnostics travel as
//! [`Warning`]s instead.

use std::fmt;
use thiserror::Error;

/// Classification of a runtime error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Reference,
    Type,
    Syntax,
    Environment,
    Escalated,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Reference => "reference",
            ErrorKind::Type => "type",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Environment => "environment",
            ErrorKind::Escalated => "escalated-warning",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Errors raised while loading or executing a script
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Unknown variable, function, property or extension
    #[error("ReferenceError: {0}")]
    Reference(String),

    /// Tag mismatch on assignment, argument or operator
    #[error("TypeError: {0}")]
    Type(String),

    /// Malformed statement, unterminated literal, unknown keyword
    #[error("SyntaxError: {0}")]
    Syntax(String),

    /// Missing extension, environment mismatch, disallowed operation
    #[error("EnvironmentError: {0}")]
    Environment(String),

    /// A warning promoted to an error by strict mode
    #[error("Warning (strict mode): {0}")]
    Escalated(String),

    /// Unexpected failure outside the language rules
    #[error("{0}")]
    Internal(String),
}

impl RuntimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::Reference(_) => ErrorKind::Reference,
            RuntimeError::Type(_) => ErrorKind::Type,
            RuntimeError::Syntax(_) => ErrorKind::Syntax,
            RuntimeError::Environment(_) => ErrorKind::Environment,
            RuntimeError::Escalated(_) => ErrorKind::Escalated,
            RuntimeError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RuntimeError::Reference(m)
            | RuntimeError::Type(m)
            | RuntimeError::Syntax(m)
            | RuntimeError::Environment(m)
            | RuntimeError::Escalated(m)
            | RuntimeError::Internal(m) => m,
        }
    }

    /// Whether this error was raised by the language rules rather than the host
    pub fn is_language_error(&self) -> bool {
        !matches!(self, RuntimeError::Internal(_))
    }
}

/// Fatal error as delivered to the error callback
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    /// 1-based line that was executing, `None` outside of a run
    pub line: Option<usize>,
    pub file: String,
    /// Innermost frame first
    pub stack: Vec<String>,
    /// Installed extension ids; only filled for internal errors
    pub extensions: Vec<String>,
}

impl ErrorReport {
    pub fn is_internal(&self) -> bool {
        self.kind == ErrorKind::Internal
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_internal() {
            writeln!(f, "!! internal error (not caused by the script itself) !!")?;
        }
        write!(f, "{} error: {}", self.kind, self.message)?;
        match self.line {
            Some(line) => write!(f, "\n  in {}, line {}", self.file, line)?,
            None => write!(f, "\n  in {}", self.file)?,
        }
        for frame in &self.stack {
            write!(f, "\n    at {}", frame)?;
        }
        if self.is_internal() {
            if self.extensions.is_empty() {
                write!(f, "\n  extensions: (none)")?;
            } else {
                write!(f, "\n  extensions: {}", self.extensions.join(", "))?;
            }
        }
        Ok(())
    }
}

/// Non-fatal diagnostic
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub message: String,
    pub line: Option<usize>,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "warning (line {}): {}", line, self.message),
            None => write!(f, "warning: {}", self.message),
        }
    }
}

pub type ErrorCallback = Box<dyn FnMut(&ErrorReport)>;
pub type WarningCallback = Box<dyn FnMut(&Warning)>;
pub type LogCallback = Box<dyn FnMut(&str)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_message() {
        let err = RuntimeError::Type("expected number".to_string());
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(err.message(), "expected number");
        assert!(err.is_language_error());
        assert!(!RuntimeError::Internal("boom".to_string()).is_language_error());
    }

    #[test]
    fn test_report_format() {
        let report = ErrorReport {
            kind: ErrorKind::Reference,
            message: "unknown variable 'x'".to_string(),
            line: Some(4),
            file: "demo".to_string(),
            stack: vec!["inner (called from line 2)".to_string()],
            extensions: Vec::new(),
        };
        let text = report.to_string();
        assert!(text.starts_with("reference error: unknown variable 'x'"));
        assert!(text.contains("in demo, line 4"));
        assert!(text.contains("at inner (called from line 2)"));
        assert!(!text.contains("internal"));
    }

    #[test]
    fn test_internal_report_lists_extensions() {
        let report = ErrorReport {
            kind: ErrorKind::Internal,
            message: "boom".to_string(),
            line: None,
            file: "demo".to_string(),
            stack: Vec::new(),
            extensions: vec!["canvas".to_string()],
        };
        let text = report.to_string();
        assert!(text.contains("internal error"));
        assert!(text.contains("extensions: canvas"));
    }
}
