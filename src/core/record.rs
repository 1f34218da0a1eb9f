use std::path::PathBuf;

/// Kind discriminant for everything the extractor recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// NF-e invoice (`nfeProc` / `NFe` root with an `infNFe` element).
    Invoice,
    /// CT-e waybill. Recognized so it can be skipped, never mutated.
    Waybill,
    /// Cancellation event, `procEventoNFe` with event type 110111.
    CancellationEvent,
    /// Inutilização notice, `procInutNFe` root.
    VoidingNotice,
}

/// Flat record of the invoice fields the classify and mapping stages need.
///
/// Produced once per document in phase 1; everything downstream reads from
/// these records instead of re-walking the XML tree.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub path: PathBuf,
    pub kind: DocumentKind,
    /// `nNF`, the human document number.
    pub number: String,
    /// CFOP of the first line item.
    pub cfop: String,
    /// `natOp`, free-text nature of the operation.
    pub operation_nature: String,
    /// `refNFe`, the 44-digit access key of the referenced document, if any.
    pub reference_key: Option<String>,
    /// `infAdic/obsCont/xTexto` marketplace annotation.
    pub free_text: String,
    /// This document's own 44-digit access key.
    pub access_key: String,
    /// Issuer CNPJ as it appears in the document.
    pub issuer_tax_id: String,
}

/// Record of a cancellation event: which key it cancels, and where it lives.
#[derive(Debug, Clone)]
pub struct CancellationEvent {
    pub path: PathBuf,
    /// `chNFe` of the cancelled document.
    pub cancelled_key: String,
}

/// Everything the extractor can produce from one parsed file.
#[derive(Debug, Clone)]
pub enum Extracted {
    Invoice(DocumentRecord),
    Cancellation(CancellationEvent),
    VoidingNotice { path: PathBuf },
    Waybill { path: PathBuf },
    /// Shape not recognized; the file is skipped for renaming and mutation.
    Unrecognized,
}
