use thiserror::Error;

/// An error when allocating or constructing an instance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConstructError {
    #[error("type `{0}` is abstract")]
    Abstract(String),
    #[error("type `{0}` is a leaf type and has no instances")]
    NotAggregate(String),
    #[error("constructor of `{ty}` failed: {message}")]
    Failed { ty: String, message: String },
}
