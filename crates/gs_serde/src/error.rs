use std::io;

use gs_reflect::adapters::InsertError;
use gs_reflect::overrides::ResolveError;
use gs_reflect::registry::ConstructError;
use thiserror::Error;

use crate::Encoding;

// -----------------------------------------------------------------------------
// CodecError

/// An error reading or writing the wire format.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CodecError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("unexpected end of stream")]
    UnexpectedEof,
    /// A leaf value could not be decoded. The value has been consumed and
    /// the stream is still aligned.
    #[error("malformed {kind} value: {detail}")]
    Malformed { kind: &'static str, detail: String },
    /// The stream structure is broken and cannot be followed any further.
    #[error("corrupt stream at byte {position}: {detail}")]
    Corrupt { position: u64, detail: String },
    #[error("unknown object tag `{0}`")]
    UnknownTag(String),
    #[error("unknown mode `{0}`")]
    UnknownMode(String),
    #[error("{what} of {len} exceeds the limit of {max}")]
    LimitExceeded { what: &'static str, len: u64, max: u64 },
}

impl CodecError {
    /// Returns `true` for errors that leave the stream aligned.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

// -----------------------------------------------------------------------------
// SerializeError

/// An error serializing a graph.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SerializeError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("no serializable type in the base chain of `{0}`")]
    NotSerializable(String),
    #[error("type `{0}` is not registered")]
    UnknownType(String),
    #[error("expected a `{expected}` value, found `{found}`")]
    TypeMismatch { expected: String, found: String },
    #[error("condition `{condition}` of member `{member}` is not a boolean member")]
    InvalidCondition { member: String, condition: String },
    #[error("nesting deeper than {0} levels")]
    DepthExceeded(usize),
}

impl From<io::Error> for SerializeError {
    #[inline]
    fn from(err: io::Error) -> Self {
        Self::Codec(CodecError::Io(err))
    }
}

// -----------------------------------------------------------------------------
// DeserializeError

/// An error deserializing a graph.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DeserializeError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("stream is {found}, expected {expected}")]
    FormatMismatch { expected: Encoding, found: Encoding },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("no serializable type in the base chain of `{0}`")]
    NotSerializable(String),
    #[error("type `{0}` was written as a list but has no collection adapter")]
    NotACollection(String),
    #[error("type `{0}` was written as constructed but has no annotated constructor")]
    MissingConstructor(String),
    #[error("type `{ty}` has no serializable member `{member}`")]
    UnknownMember { ty: String, member: String },
    #[error(transparent)]
    Construct(#[from] ConstructError),
    #[error(transparent)]
    Insert(#[from] InsertError),
    #[error("root is `{found}`, expected `{expected}`")]
    RootTypeMismatch { expected: String, found: String },
    #[error("nesting deeper than {0} levels")]
    DepthExceeded(usize),
}

impl From<io::Error> for DeserializeError {
    #[inline]
    fn from(err: io::Error) -> Self {
        Self::Codec(CodecError::Io(err))
    }
}
