#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use gs_reflect as reflect;
pub use gs_serde as serde;
pub use gs_utils as utils;
