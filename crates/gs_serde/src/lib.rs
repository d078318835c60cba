#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Modules

mod error;
mod options;
mod progress;
mod tag;
mod task;
mod walker;

pub mod codec;
pub mod tracker;

// -----------------------------------------------------------------------------
// Top-level exports

pub use error::{CodecError, DeserializeError, SerializeError};
pub use options::{Encoding, Format, Mode, SerializerOptions};
pub use progress::Progress;
pub use tag::ObjectTag;
pub use task::Task;
pub use walker::GraphSerializer;
