//! Error types that are not validation issues.
//!
//! Data problems travel as [`ValidationError`]. Misuse of the API (an
//! asynchronous effect reached from a synchronous parse, an ill-formed schema
//! definition) is reported through [`UsageError`] and [`SchemaError`] and is
//! never folded into an issue list.
use std::fmt;

use thiserror::Error;

use crate::issue::ValidationError;
use crate::value::Literal;

/// Failure of a `parse*` call.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Usage(#[from] UsageError),
    /// A host function or promise failed on its own terms.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl Error {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Error::Rejected(reason.into())
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

/// Which asynchronous effect a synchronous parse ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncFeature {
    Preprocess,
    Refinement,
    Transform,
}

impl fmt::Display for AsyncFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AsyncFeature::Preprocess => "preprocess",
            AsyncFeature::Refinement => "refinement",
            AsyncFeature::Transform => "transform",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("asynchronous {0} encountered during synchronous parse; use the async entry points instead")]
    AsyncInSync(AsyncFeature),
}

/// Construction-time schema errors. Raised when the schema is built, never
/// during a parse.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("discriminated union: option {index} has no literal value for discriminator `{discriminator}`")]
    MissingDiscriminator { discriminator: String, index: usize },
    #[error("discriminated union: discriminator `{discriminator}` value {value} is used by more than one option")]
    DuplicateDiscriminator { discriminator: String, value: Literal },
    #[error("discriminated union: option {index} is not an object schema")]
    NotAnObject { index: usize },
    #[error("invalid regular expression `{pattern}`: {reason}")]
    Regex { pattern: String, reason: String },
    #[error("unsupported schema document at {path}: {reason}")]
    Document { path: String, reason: String },
    #[error("cannot read schema document {path}: {reason}")]
    Read { path: String, reason: String },
}
