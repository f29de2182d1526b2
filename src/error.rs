//! Error types for xsd2proto
//!
//! This module defines all error types used throughout the library, together
//! with the diagnostic channel the schema parser reports through.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Result type alias using xsd2proto Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xsd2proto operations
#[derive(Error, Debug)]
pub enum Error {
    /// XSD parsing error (not well-formed, or a fatal schema problem)
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The lowered schema cannot be emitted
    #[error("invalid schema: {0}")]
    InvalidSchema(#[from] InvalidSchemaError),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// Invalid type or name mapping
    #[error("mapping error: {0}")]
    Mapping(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Regular expression error
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    /// TOML configuration parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Severity of a parser diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Reported and ignored
    Warning,
    /// Reported; the offending construct is skipped
    Error,
    /// Reported; translation stops
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Fatal => write!(f, "fatal"),
        }
    }
}

/// XSD parsing error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the schema file (`line:column`)
    pub location: Option<String>,
    /// Schema document the error was found in
    pub system_id: Option<String>,
    /// Diagnostic severity
    pub severity: Severity,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            system_id: None,
            severity: Severity::Error,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the system id of the schema document
    pub fn with_system_id(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = Some(system_id.into());
        self
    }

    /// Set the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref system_id) = self.system_id {
            write!(f, "{}", system_id)?;
            if let Some(ref loc) = self.location {
                write!(f, ":{}", loc)?;
            }
            write!(f, ": ")?;
        } else if let Some(ref loc) = self.location {
            write!(f, "{}: ", loc)?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Dependency graph of the culprits: message name to the names it depends on
pub type CulpritMap = BTreeMap<String, BTreeSet<String>>;

/// Schema errors detected while emitting the lowered registry
#[derive(Error, Debug, Clone)]
pub enum InvalidSchemaError {
    /// Messages reference types that are never defined
    #[error("source schema contains references to missing types: {}", format_culprits(.0))]
    MissingTypes(CulpritMap),

    /// Messages form a cycle the target marshaller cannot express
    #[error(
        "source schema contains circular dependencies and the target marshaller does not support them: {}",
        format_culprits(.0)
    )]
    Cycle(CulpritMap),
}

impl InvalidSchemaError {
    /// The culprit messages with their offending references
    pub fn culprits(&self) -> &CulpritMap {
        match self {
            InvalidSchemaError::MissingTypes(map) | InvalidSchemaError::Cycle(map) => map,
        }
    }
}

fn format_culprits(culprits: &CulpritMap) -> String {
    culprits
        .iter()
        .map(|(name, deps)| {
            let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
            format!("{} -> [{}]", name, deps.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Receiver of parser diagnostics on three severity channels
pub trait ErrorHandler {
    /// A recoverable oddity in the schema
    fn warning(&mut self, error: &ParseError);

    /// A schema error; the offending construct is skipped
    fn error(&mut self, error: &ParseError);

    /// An unrecoverable error; parsing stops after this call
    fn fatal_error(&mut self, error: &ParseError);

    /// Dispatch a diagnostic to the channel matching its severity
    fn report(&mut self, error: &ParseError) {
        match error.severity {
            Severity::Warning => self.warning(error),
            Severity::Error => self.error(error),
            Severity::Fatal => self.fatal_error(error),
        }
    }
}

/// Error handler that logs every diagnostic through `tracing`
#[derive(Debug, Default, Clone)]
pub struct LoggingErrorHandler {
    warnings: usize,
    errors: usize,
}

impl LoggingErrorHandler {
    /// Create a new handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of warnings seen
    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    /// Number of errors (including fatal ones) seen
    pub fn error_count(&self) -> usize {
        self.errors
    }
}

impl ErrorHandler for LoggingErrorHandler {
    fn warning(&mut self, error: &ParseError) {
        self.warnings += 1;
        tracing::warn!("{}", error);
    }

    fn error(&mut self, error: &ParseError) {
        self.errors += 1;
        tracing::error!("{}", error);
    }

    fn fatal_error(&mut self, error: &ParseError) {
        self.errors += 1;
        tracing::error!("fatal: {}", error);
    }
}
