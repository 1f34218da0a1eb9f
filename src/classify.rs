//! Classification Engine.
//!
//! Pure mapping from (CFOP, natOp, reference key, free text, number) to a
//! target file name. Absence of a name is a valid outcome and means "leave
//! the file as is" — classification never fails.
//!
//! Priority is fixed: devolution CFOPs are checked before sale, return, and
//! shipment, first match wins. Variants built around a referenced document
//! produce no name when the reference key is missing.

use crate::core::{DocumentRecord, OperationClass};

/// Nature-of-operation strings that select sub-variants.
const NAT_DELIVERY_FAILURE: &str = "Retorno de mercadoria nao entregue";
const NAT_DEVOLUTION: &str = "Devolucao de mercadorias";
const NAT_SYMBOLIC_RETURN: &str = "Outras Entradas - Retorno Simbolico de Deposito Temporario";
const NAT_EFFECTIVE_RETURN: &str = "Outras Entradas - Retorno de Deposito Temporario";

/// Extract the referenced document number from a reference key: characters
/// 25–33 with leading zeros stripped. `None` when the key is too short.
pub fn referenced_number(reference_key: &str) -> Option<&str> {
    reference_key
        .get(25..34)
        .map(|n| n.trim_start_matches('0'))
}

/// Compute the target file name for an invoice record, or `None` when no
/// rename applies.
pub fn target_file_name(record: &DocumentRecord) -> Option<String> {
    let number = &record.number;
    let nat = record.operation_nature.as_str();
    let text = record.free_text.as_str();
    let ref_number = record
        .reference_key
        .as_deref()
        .and_then(referenced_number);

    match OperationClass::of(&record.cfop)? {
        OperationClass::Devolution => {
            let r = ref_number?;
            if nat == NAT_DELIVERY_FAILURE {
                Some(format!("{number} - Insucesso de entrega da venda {r}.xml"))
            } else if nat == NAT_DEVOLUTION {
                if text.contains("DEVOLUTION_PLACES") || text.contains("SALE_DEVOLUTION") {
                    Some(format!(
                        "{number} - Devoluçao pro Mercado Livre da venda - {r}.xml"
                    ))
                } else if text.contains("DEVOLUTION_devolution") {
                    Some(format!("{number} - Devolucao da venda {r}.xml"))
                } else {
                    None
                }
            } else {
                None
            }
        }
        OperationClass::Sale => Some(format!("{number} - Venda.xml")),
        OperationClass::Return => {
            let r = ref_number?;
            if nat == NAT_SYMBOLIC_RETURN {
                Some(format!("{number} - Retorno da remessa {r}.xml"))
            } else if nat == NAT_EFFECTIVE_RETURN {
                Some(format!("{number} - Retorno Efetivo da remessa {r}.xml"))
            } else {
                None
            }
        }
        OperationClass::Shipment => match ref_number {
            Some(r) => Some(format!("{number} - Remessa simbólica da venda {r}.xml")),
            None => Some(format!("{number} - Remessa.xml")),
        },
    }
}

/// File name for a cancellation event, given the number of the cancelled
/// document.
pub fn cancellation_file_name(cancelled_number: &str) -> String {
    format!("CAN-{cancelled_number}.xml")
}
