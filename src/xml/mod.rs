//! Minimal mutable element tree over quick-xml.
//!
//! The fiscal documents this crate edits come from several generations of
//! emitter software: some qualify every element with the NF-e namespace, CT-e
//! files use the transport namespace, and a few strip namespaces entirely.
//! All lookups therefore probe three variants in a fixed order — NF-e
//! namespace, then CT-e namespace, then unqualified — and return the first
//! non-empty match.
//!
//! Serialization re-renders the tree as a single-line document with no
//! inter-tag whitespace. The digital-signature prefix (`ds:`) is stripped and
//! replaced by a default-namespace declaration on the `Signature` element
//! itself, which is what the receiving tax-authority systems expect.
//! Signature *content* passes through untouched.

mod tree;

pub use tree::*;

/// NF-e (invoice) namespace.
pub const NFE_NS: &str = "http://www.portalfiscal.inf.br/nfe";

/// CT-e (waybill) namespace.
pub const CTE_NS: &str = "http://www.portalfiscal.inf.br/cte";

/// XML digital signature namespace.
pub const DSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";
