//! Batch-wide key and reference maps.
//!
//! Phase 1 of every run: all extracted records are folded into three
//! read-only maps *before* any file is touched. Replacement keys are derived
//! once per distinct original key and memoized, so every reference to the
//! same document resolves to the same replacement — same input set and
//! configuration always yield identical maps.

use std::collections::BTreeMap;

use log::warn;

use crate::classify::referenced_number;
use crate::config::CompanyConfig;
use crate::core::{AccessKey, DocumentRecord, KeyRewrite, NotaError};

/// Immutable snapshot of everything phase 2 needs to look up.
#[derive(Debug, Default)]
pub struct BatchMaps {
    /// Original access key → replacement key with recomputed check digit.
    pub key_mapping: BTreeMap<String, String>,
    /// A document's own original key → the original key of the document it
    /// references.
    pub reference_map: BTreeMap<String, String>,
    /// Document number → that document's original access key. The only map
    /// deduplicated by number; on duplicates the last record wins. Every
    /// record still gets its own `key_mapping` entry.
    pub number_to_key: BTreeMap<String, String>,
}

impl BatchMaps {
    /// Replacement for an original key, if one was derived.
    pub fn replacement(&self, original_key: &str) -> Option<&str> {
        self.key_mapping.get(original_key).map(String::as_str)
    }

    /// Replacement key for the document referenced by `own_key`, when both
    /// the reference and its replacement are known.
    pub fn referenced_replacement(&self, own_key: &str) -> Option<&str> {
        let referenced = self.reference_map.get(own_key)?;
        self.replacement(referenced)
    }

    /// Fallback resolution for cancellation events: match the embedded
    /// document-number substring of `key` against the mapped originals.
    pub fn replacement_by_number(&self, key: &str) -> Option<&str> {
        let number = referenced_number(key)?;
        self.key_mapping
            .iter()
            .find(|(original, _)| referenced_number(original) == Some(number))
            .map(|(_, replacement)| replacement.as_str())
    }
}

/// Build the batch maps from all extracted invoice records.
///
/// Key derivation only happens when the issuer or date toggle is on; records
/// whose access key cannot be parsed are skipped with a warning and simply
/// have no entry, which downstream code treats as "leave the key alone".
pub fn build(records: &[DocumentRecord], config: &CompanyConfig) -> Result<BatchMaps, NotaError> {
    let mut maps = BatchMaps::default();

    for record in records {
        maps.number_to_key
            .insert(record.number.clone(), record.access_key.clone());
    }

    for record in records {
        let referenced_key = record
            .reference_key
            .as_deref()
            .and_then(referenced_number)
            .and_then(|number| maps.number_to_key.get(number).cloned());
        if let Some(referenced_key) = referenced_key {
            maps.reference_map
                .insert(record.access_key.clone(), referenced_key);
        }
    }

    let rewrite_base = KeyRewrite {
        new_tax_id: config.new_tax_id(),
        new_year_month: config.new_date()?.map(|d| d.format("%y%m").to_string()),
    };
    if rewrite_base.is_noop() {
        return Ok(maps);
    }

    for record in records {
        if maps.key_mapping.contains_key(&record.access_key) {
            continue;
        }
        let original: AccessKey = match record.access_key.parse() {
            Ok(key) => key,
            Err(e) => {
                warn!(
                    "skipping key derivation for {}: {e}",
                    record.path.display()
                );
                continue;
            }
        };
        let replacement = original.rewrite(&rewrite_base)?;
        maps.key_mapping
            .insert(record.access_key.clone(), replacement.to_string());
    }

    Ok(maps)
}
