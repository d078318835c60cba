#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Modules

mod ptr_map;

pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use ptr_map::PtrMap;
