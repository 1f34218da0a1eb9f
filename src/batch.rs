//! Batch driver: scan a folder, build the maps, then rename and edit.
//!
//! Strictly two-phase. Phase 1 parses every document and computes the
//! [`BatchMaps`] snapshot; phase 2 renames and/or mutates files. No error
//! past configuration loading ever aborts the batch — failures are logged,
//! counted in the [`RunSummary`], and the run moves on to the next file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::classify::{cancellation_file_name, target_file_name};
use crate::config::CompanyConfig;
use crate::core::{CancellationEvent, DocumentRecord, Extracted, NotaError};
use crate::extract::extract;
use crate::mapping::{self, BatchMaps};
use crate::mutate::{self, MutationContext};
use crate::xml::Document;

/// Counters reported at the end of each pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub renamed: usize,
    pub skipped: usize,
    pub edited: usize,
    pub errors: usize,
}

/// Everything extracted from one folder in phase 1.
struct Scan {
    /// All invoice records in sorted file order. Document numbers may repeat
    /// (same number, different series); only number lookups deduplicate.
    invoices: Vec<DocumentRecord>,
    cancellations: Vec<CancellationEvent>,
    /// Every XML file found, for the edit pass.
    files: Vec<PathBuf>,
}

fn scan_folder(folder: &Path) -> Result<Scan, NotaError> {
    let mut files: Vec<PathBuf> = fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        })
        .collect();
    files.sort();

    let mut scan = Scan {
        invoices: Vec::new(),
        cancellations: Vec::new(),
        files,
    };
    for path in &scan.files {
        let Ok(raw) = fs::read_to_string(path) else {
            warn!("cannot read {}, skipping", path.display());
            continue;
        };
        let Ok(doc) = Document::parse(&raw) else {
            warn!("cannot parse {}, skipping", path.display());
            continue;
        };
        match extract(path, &doc) {
            Extracted::Invoice(rec) => scan.invoices.push(rec),
            Extracted::Cancellation(ev) => scan.cancellations.push(ev),
            Extracted::VoidingNotice { .. } | Extracted::Waybill { .. } => {}
            Extracted::Unrecognized => {}
        }
    }
    Ok(scan)
}

/// Rename pass: classify every invoice and cancellation event and move the
/// file to its business-meaningful name.
pub fn rename_documents(folder: &Path) -> Result<RunSummary, NotaError> {
    let scan = scan_folder(folder)?;
    let mut summary = RunSummary::default();

    if scan.files.is_empty() {
        info!("no XML files found in {}", folder.display());
        return Ok(summary);
    }

    for record in &scan.invoices {
        let Some(name) = target_file_name(record) else {
            continue;
        };
        rename_one(&record.path, &folder.join(&name), &mut summary);
    }

    // Cancellation events take the number of the document they cancel.
    let key_to_number: BTreeMap<&str, &str> = scan
        .invoices
        .iter()
        .map(|rec| (rec.access_key.as_str(), rec.number.as_str()))
        .collect();
    for event in &scan.cancellations {
        let Some(number) = key_to_number.get(event.cancelled_key.as_str()) else {
            continue;
        };
        let name = cancellation_file_name(number);
        rename_one(&event.path, &folder.join(&name), &mut summary);
    }

    info!(
        "rename pass: {} renamed, {} skipped, {} errors",
        summary.renamed, summary.skipped, summary.errors
    );
    Ok(summary)
}

fn rename_one(source: &Path, destination: &Path, summary: &mut RunSummary) {
    if source == destination {
        return;
    }
    // Checked immediately before the rename; a small race window is
    // acceptable for a single-actor offline batch.
    if destination.exists() {
        let collision = NotaError::RenameCollision {
            destination: destination.to_path_buf(),
        };
        warn!("skipping {}: {collision}", source.display());
        summary.skipped += 1;
        return;
    }
    match fs::rename(source, destination) {
        Ok(()) => {
            info!(
                "renamed {} -> {}",
                source.display(),
                destination.display()
            );
            summary.renamed += 1;
        }
        Err(e) => {
            error!("failed to rename {}: {e}", source.display());
            summary.errors += 1;
        }
    }
}

/// Edit pass: build the batch maps, then mutate each file in place.
///
/// A file is rewritten only when at least one mutation applied. Any per-file
/// failure is counted and the pass continues.
pub fn edit_documents(folder: &Path, config: &CompanyConfig) -> Result<RunSummary, NotaError> {
    let scan = scan_folder(folder)?;
    let mut summary = RunSummary::default();

    if scan.files.is_empty() {
        info!("no XML files found in {}", folder.display());
        return Ok(summary);
    }

    // Phase 1: read-only snapshot of all derived keys and references.
    let maps: BatchMaps = mapping::build(&scan.invoices, config)?;
    let ctx = MutationContext::new(config, &maps)?;

    // Phase 2: mutate file by file.
    for path in &scan.files {
        match edit_one(path, &ctx) {
            Ok(changes) if changes.is_empty() => {}
            Ok(changes) => {
                info!("edited {}", path.display());
                for change in &changes {
                    info!("   - {change}");
                }
                summary.edited += 1;
            }
            Err(e) => {
                error!("failed to edit {}: {e}", path.display());
                summary.errors += 1;
            }
        }
    }

    info!(
        "edit pass: {} edited, {} errors",
        summary.edited, summary.errors
    );
    Ok(summary)
}

fn edit_one(path: &Path, ctx: &MutationContext<'_>) -> Result<Vec<String>, NotaError> {
    let raw = fs::read_to_string(path)?;
    let mut doc = Document::parse(&raw)?;
    let changes = mutate::apply(&mut doc.root, ctx);
    if changes.is_empty() {
        return Ok(changes);
    }
    fs::write(path, doc.to_xml_string()?)?;
    Ok(changes)
}

/// Run the passes a company's configuration asks for.
pub fn run(config: &CompanyConfig) -> Result<RunSummary, NotaError> {
    let mut totals = RunSummary::default();

    if config.run.rename {
        let dir = config.paths.source_dir.as_deref().ok_or_else(|| {
            NotaError::Config("rename pass enabled but paths.source_dir is not set".into())
        })?;
        let dir = Path::new(dir);
        if !dir.is_dir() {
            return Err(NotaError::Config(format!(
                "paths.source_dir {} is not a directory",
                dir.display()
            )));
        }
        let s = rename_documents(dir)?;
        totals.renamed += s.renamed;
        totals.skipped += s.skipped;
        totals.errors += s.errors;
    }

    if config.run.edit {
        let dir = config.paths.edit_dir.as_deref().ok_or_else(|| {
            NotaError::Config("edit pass enabled but paths.edit_dir is not set".into())
        })?;
        let dir = Path::new(dir);
        if !dir.is_dir() {
            return Err(NotaError::Config(format!(
                "paths.edit_dir {} is not a directory",
                dir.display()
            )));
        }
        let s = edit_documents(dir, config)?;
        totals.edited += s.edited;
        totals.errors += s.errors;
    }

    Ok(totals)
}
