//! Synthesis errors

use thiserror::Error;
use typesynth_ir::IrError;

/// Errors that abort a synthesis or a materialization
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SynthesisError {
    /// The host cannot place a type in the requested scope
    #[error("Scope violation: cannot place {ty} under the scope of {anchor}: {reason}")]
    ScopeViolation {
        /// Type being materialized
        ty: String,
        /// Type whose scope was requested
        anchor: String,
        /// Why the host refused
        reason: String,
    },

    /// A type with the same name is already defined
    #[error("Type {name} is already defined")]
    NameCollision {
        /// Colliding name
        name: String,
    },

    /// Introspection has no record of a type
    #[error("Unknown type: {name}")]
    UnknownType {
        /// Requested name
        name: String,
    },

    /// Building or validating a body failed
    #[error(transparent)]
    Ir(#[from] IrError),

    /// The host failed for a reason of its own
    #[error("Host error: {0}")]
    Host(String),
}

impl SynthesisError {
    pub(crate) fn scope_violation(
        ty: impl ToString,
        anchor: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        SynthesisError::ScopeViolation {
            ty: ty.to_string(),
            anchor: anchor.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this is a malformed body reported by validation
    pub fn is_malformed_body(&self) -> bool {
        matches!(self, SynthesisError::Ir(IrError::MalformedBody { .. }))
    }
}

/// Errors raised by typed slot access
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SlotError {
    /// The slot holds a cell of another kind
    #[error("Type mismatch: slot {slot} holds a {found}, not a {expected}")]
    TypeMismatch {
        /// Slot name
        slot: String,
        /// Kind requested by the caller
        expected: &'static str,
        /// Kind of the stored cell
        found: &'static str,
    },
}

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors raised while running code in the reference machine
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecError {
    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("No such method: {0}")]
    NoSuchMethod(String),

    #[error("No such field: {0}")]
    NoSuchField(String),

    #[error("Abstract method called: {0}")]
    AbstractMethod(String),

    #[error("Cannot instantiate abstract type {0}")]
    AbstractType(String),

    #[error("Wrong argument count for {method}: expected {expected}, found {found}")]
    ArgumentCount {
        method: String,
        expected: usize,
        found: usize,
    },

    #[error("Null dereference")]
    NullPointer,

    #[error("Cannot cast {value} to {target}")]
    ClassCast { value: String, target: String },

    #[error("Array index {index} out of bounds for length {len}")]
    ArrayIndex { index: i64, len: usize },

    #[error("Negative array size: {0}")]
    NegativeArraySize(i64),

    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    #[error("Operand error: {0}")]
    Operand(String),

    #[error("Uncaught throw of {0}")]
    Uncaught(String),

    #[error("Call depth exceeded {0}")]
    StackOverflow(usize),
}
