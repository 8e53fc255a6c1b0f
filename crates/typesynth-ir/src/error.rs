//! IR construction and validation errors

use thiserror::Error;

/// Errors raised while building or validating type descriptions
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IrError {
    /// A member with the same signature was already declared on the type
    #[error("Duplicate member {signature} in {owner}")]
    DuplicateMember {
        /// Type being built
        owner: String,
        /// Signature of the rejected member
        signature: String,
    },

    /// A body whose control flow or operands are not well formed
    #[error("Malformed body of {method}: {reason}")]
    MalformedBody {
        /// Member whose body failed validation
        method: String,
        /// What is wrong with it
        reason: String,
    },
}

impl IrError {
    pub(crate) fn malformed(method: impl Into<String>, reason: impl Into<String>) -> Self {
        IrError::MalformedBody {
            method: method.into(),
            reason: reason.into(),
        }
    }
}
