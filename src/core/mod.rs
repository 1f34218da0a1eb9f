//! Core domain types: errors, access keys, CFOP tables, document records.
//!
//! The access-key machinery in [`key`] is the algorithmic heart of the crate;
//! everything else in this module is plain data shared between the extract,
//! classify, and mutate stages.

mod cfop;
mod error;
mod key;
mod record;

pub use cfop::*;
pub use error::*;
pub use key::*;
pub use record::*;
