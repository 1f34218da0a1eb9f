//! CFOP operation-code tables.
//!
//! CFOP (Código Fiscal de Operações e Prestações) is the four-digit operation
//! code carried by every NF-e line item. The batch only cares about four
//! fixed families, used both for file naming and for the excise-zeroing rule.

/// CFOPs that identify a sale.
pub const SALE_CFOPS: &[&str] = &[
    "5404", "6404", "5108", "6108", "5405", "6405", "5102", "6102", "5105", "6105", "5106",
    "6106", "5551",
];

/// CFOPs that identify a devolution (buyer returning goods).
pub const DEVOLUTION_CFOPS: &[&str] = &[
    "1201", "2201", "1202", "1410", "2410", "2102", "2202", "2411",
];

/// CFOPs that identify a return of a previous shipment.
pub const RETURN_CFOPS: &[&str] = &["1949", "2949", "5902", "6902"];

/// CFOPs that identify a shipment (remessa).
pub const SHIPMENT_CFOPS: &[&str] = &["5949", "5156", "6152", "6949", "6905", "5901", "6901"];

/// Semantic family of a CFOP, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationClass {
    Devolution,
    Sale,
    Return,
    Shipment,
}

impl OperationClass {
    /// Classify a CFOP. Devolution is checked before sale, return, and
    /// shipment, in that fixed order; first match wins.
    pub fn of(cfop: &str) -> Option<OperationClass> {
        if DEVOLUTION_CFOPS.contains(&cfop) {
            Some(OperationClass::Devolution)
        } else if SALE_CFOPS.contains(&cfop) {
            Some(OperationClass::Sale)
        } else if RETURN_CFOPS.contains(&cfop) {
            Some(OperationClass::Return)
        } else if SHIPMENT_CFOPS.contains(&cfop) {
            Some(OperationClass::Shipment)
        } else {
            None
        }
    }
}

/// True for CFOPs whose line items get their excise tax zeroed when the
/// `zero_excise_on_shipment_return` toggle is on.
pub fn is_shipment_or_return(cfop: &str) -> bool {
    SHIPMENT_CFOPS.contains(&cfop) || RETURN_CFOPS.contains(&cfop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_each_family() {
        assert_eq!(OperationClass::of("5102"), Some(OperationClass::Sale));
        assert_eq!(OperationClass::of("1201"), Some(OperationClass::Devolution));
        assert_eq!(OperationClass::of("1949"), Some(OperationClass::Return));
        assert_eq!(OperationClass::of("5949"), Some(OperationClass::Shipment));
        assert_eq!(OperationClass::of("9999"), None);
    }

    #[test]
    fn shipment_or_return_covers_both_tables() {
        assert!(is_shipment_or_return("6902"));
        assert!(is_shipment_or_return("5901"));
        assert!(!is_shipment_or_return("5102"));
    }
}
