//! Per-company configuration.
//!
//! A single JSON file maps company names to a [`CompanyConfig`]. A missing
//! file or company entry is the one fatal error class in the crate; every
//! other failure is recovered per file.
//!
//! Field names inside `issuer`, `product`, and `taxes` are the literal XML
//! element names (`CNPJ`, `xNome`, `xLgr`, …) so the configuration can target
//! any element without code changes.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::core::NotaError;

/// Which processing passes run for this company.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub rename: bool,
    pub edit: bool,
}

/// Source folders for the two passes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub source_dir: Option<String>,
    pub edit_dir: Option<String>,
}

/// Feature toggles for the mutation steps. Every step is independently gated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AlterFlags {
    pub issuer: bool,
    pub products: bool,
    pub taxes: bool,
    pub date: bool,
    pub reference_key: bool,
    pub tax_code: bool,
    pub zero_excise_on_shipment_return: bool,
}

/// Replacement CST codes for one CFOP, per tax type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaxCodeRules {
    #[serde(rename = "ICMS")]
    pub icms: Option<String>,
    #[serde(rename = "IPI")]
    pub ipi: Option<String>,
    #[serde(rename = "PIS")]
    pub pis: Option<String>,
    #[serde(rename = "COFINS")]
    pub cofins: Option<String>,
}

/// New emission date, `DD/MM/YYYY`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    pub new_date: Option<String>,
}

/// Everything configurable for one company.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompanyConfig {
    pub run: RunConfig,
    pub paths: PathsConfig,
    pub alter: AlterFlags,
    /// Issuer element overwrites, XML element name → new text.
    pub issuer: BTreeMap<String, String>,
    /// Per-line-item product element overwrites.
    pub product: BTreeMap<String, String>,
    /// Tax element overwrites by slash-separated path, searched deep.
    pub taxes: BTreeMap<String, String>,
    pub date: DateConfig,
    /// CFOP → replacement CST codes.
    pub tax_code_map: BTreeMap<String, TaxCodeRules>,
}

impl CompanyConfig {
    /// Parse the configured replacement date, if the date toggle is on.
    pub fn new_date(&self) -> Result<Option<NaiveDate>, NotaError> {
        if !self.alter.date {
            return Ok(None);
        }
        match &self.date.new_date {
            None => Ok(None),
            Some(raw) => NaiveDate::parse_from_str(raw, "%d/%m/%Y")
                .map(Some)
                .map_err(|e| NotaError::InvalidDate {
                    value: raw.clone(),
                    source: e,
                }),
        }
    }

    /// Replacement issuer CNPJ, digits only, if the issuer toggle is on.
    pub fn new_tax_id(&self) -> Option<String> {
        if !self.alter.issuer {
            return None;
        }
        self.issuer
            .get("CNPJ")
            .map(|raw| raw.chars().filter(char::is_ascii_digit).collect())
    }
}

/// Load the company map from a JSON file.
pub fn load_companies(path: &Path) -> Result<BTreeMap<String, CompanyConfig>, NotaError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        NotaError::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| NotaError::Config(format!("cannot parse {}: {e}", path.display())))
}

/// Look up one company entry by name.
pub fn select_company<'a>(
    companies: &'a BTreeMap<String, CompanyConfig>,
    name: &str,
) -> Result<&'a CompanyConfig, NotaError> {
    companies.get(name).ok_or_else(|| {
        let known: Vec<&str> = companies.keys().map(String::as_str).collect();
        NotaError::Config(format!(
            "company {name:?} not found (available: {})",
            known.join(", ")
        ))
    })
}
