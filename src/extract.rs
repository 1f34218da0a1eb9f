//! Document Model Extractor.
//!
//! Walks a parsed tree once and produces the flat [`Extracted`] record the
//! later stages work from. Extraction never fails: anything with an
//! unexpected shape comes back as [`Extracted::Unrecognized`] and is simply
//! skipped by both the rename and the edit pass.

use std::path::Path;

use crate::core::{CancellationEvent, DocumentKind, DocumentRecord, Extracted};
use crate::xml::{Document, Element};

/// Event type code for an NF-e cancellation.
const CANCELLATION_EVENT_TYPE: &str = "110111";

/// Classify a parsed document and extract its record.
pub fn extract(path: &Path, doc: &Document) -> Extracted {
    let root = &doc.root;
    let local = root.local();

    if local == "procInutNFe" {
        return Extracted::VoidingNotice {
            path: path.to_path_buf(),
        };
    }

    if local == "procEventoNFe" {
        return extract_event(path, root);
    }

    if local == "cteProc" || local.contains("CTe") {
        return Extracted::Waybill {
            path: path.to_path_buf(),
        };
    }

    extract_invoice(path, root)
}

fn extract_event(path: &Path, root: &Element) -> Extracted {
    let event_type = root
        .find_deep("evento/infEvento/tpEvento")
        .map(Element::text_str);
    if event_type != Some(CANCELLATION_EVENT_TYPE) {
        return Extracted::Unrecognized;
    }
    match root.find_deep("evento/infEvento/chNFe") {
        Some(ch) if !ch.text_str().is_empty() => Extracted::Cancellation(CancellationEvent {
            path: path.to_path_buf(),
            cancelled_key: ch.text_str().to_string(),
        }),
        _ => Extracted::Unrecognized,
    }
}

fn extract_invoice(path: &Path, root: &Element) -> Extracted {
    let Some(inf_nfe) = root.find_deep("infNFe") else {
        return Extracted::Unrecognized;
    };
    let (Some(ide), Some(emit)) = (inf_nfe.find("ide"), inf_nfe.find("emit")) else {
        return Extracted::Unrecognized;
    };

    let access_key = inf_nfe
        .attr("Id")
        .and_then(|id| id.strip_prefix("NFe"))
        .unwrap_or("")
        .to_string();
    if access_key.is_empty() {
        return Extracted::Unrecognized;
    }

    // A usable record needs at least a document number and an issuer tax id.
    let number = ide.find("nNF").map(Element::text_str).unwrap_or("");
    let issuer_tax_id = emit.find("CNPJ").map(Element::text_str).unwrap_or("");
    if number.is_empty() || issuer_tax_id.is_empty() {
        return Extracted::Unrecognized;
    }

    let reference_key = ide
        .find_deep("NFref/refNFe")
        .map(Element::text_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Extracted::Invoice(DocumentRecord {
        path: path.to_path_buf(),
        kind: DocumentKind::Invoice,
        number: number.to_string(),
        cfop: inf_nfe
            .find_deep("det/prod/CFOP")
            .map(Element::text_str)
            .unwrap_or("")
            .to_string(),
        operation_nature: ide.find("natOp").map(Element::text_str).unwrap_or("").to_string(),
        reference_key,
        free_text: inf_nfe
            .find_deep("infAdic/obsCont/xTexto")
            .map(Element::text_str)
            .unwrap_or("")
            .to_string(),
        access_key,
        issuer_tax_id: issuer_tax_id.to_string(),
    })
}
