//! # notafix
//!
//! Batch renamer and field rewriter for Brazilian fiscal XML documents:
//! NF-e invoices, CT-e waybills, cancellation events, and inutilização
//! ("number voided") notices.
//!
//! Per-company configuration drives two passes over a folder of documents:
//! renaming files after their business meaning (sale, return, shipment,
//! devolution, cancellation) and rewriting selected fields (issuer identity,
//! product data, tax codes, emission dates, access keys) while keeping
//! cross-document references, protocol echoes, and monetary totals
//! consistent.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating point.
//! Digital signature blocks are passed through untouched, never recomputed.
//!
//! ## Quick Start
//!
//! ```rust
//! use notafix::core::{AccessKey, KeyRewrite};
//!
//! let key: AccessKey = "35240611222333000181550010000123451000012344"
//!     .parse()
//!     .unwrap();
//! assert_eq!(key.number, "000012345");
//!
//! let rewrite = KeyRewrite {
//!     new_tax_id: Some("12345678000195".into()),
//!     new_year_month: None,
//! };
//! let new_key = key.rewrite(&rewrite).unwrap();
//! assert_eq!(new_key.tax_id, "12345678000195");
//! assert_eq!(new_key.number, key.number);
//! ```
//!
//! ## Processing model
//!
//! The batch is strictly two-phase: every document is scanned and all derived
//! key mappings are computed *before* any file is mutated or renamed, so a
//! return document processed early can already resolve the replacement key of
//! the sale it references, even when the sale sits later in the folder.

pub mod batch;
pub mod classify;
pub mod config;
pub mod core;
pub mod extract;
pub mod mapping;
pub mod mutate;
pub mod xml;

// Re-export core types at crate root for convenience
pub use crate::core::*;
