//! Field Mutation Engine.
//!
//! Applies the configured overwrites to one parsed document. Every step is
//! independently toggle-gated and is a no-op when its target elements are
//! absent; the returned change list is what decides whether the file gets
//! rewritten at all (empty list ⇒ file untouched).
//!
//! Step order for invoices is fixed: issuer identity/address, product
//! fields, tax fields by path, CST remapping by CFOP, excise zeroing with
//! totals recomputation, emission/receipt dates, the document's own access
//! key, and finally the reference key. Voiding notices and cancellation
//! events take their own, much shorter paths.

use std::str::FromStr;

use chrono::{Local, NaiveDate, NaiveTime};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::CompanyConfig;
use crate::core::{NotaError, is_shipment_or_return};
use crate::mapping::BatchMaps;
use crate::xml::Element;

/// Issuer fields that live on the `enderEmit` address sub-element rather
/// than on `emit` itself.
const ADDRESS_FIELDS: &[&str] = &["xLgr", "nro", "xCpl", "xBairro", "xMun", "UF", "fone"];

/// Everything one mutation pass needs, assembled once per run.
pub struct MutationContext<'a> {
    config: &'a CompanyConfig,
    maps: &'a BatchMaps,
    new_date: Option<NaiveDate>,
    time_of_day: NaiveTime,
}

impl<'a> MutationContext<'a> {
    /// Build a context, parsing the configured date and capturing the
    /// current wall-clock time of day once for the whole batch.
    pub fn new(config: &'a CompanyConfig, maps: &'a BatchMaps) -> Result<Self, NotaError> {
        Ok(MutationContext {
            config,
            maps,
            new_date: config.new_date()?,
            time_of_day: Local::now().time(),
        })
    }

    /// Pin the time of day (tests).
    pub fn with_time_of_day(mut self, time: NaiveTime) -> Self {
        self.time_of_day = time;
        self
    }

    /// Formatted replacement timestamp, when the date overwrite is active.
    /// The `-03:00` offset is a fixed literal, not a timezone lookup.
    fn timestamp(&self) -> Option<String> {
        self.new_date.map(|date| {
            format!(
                "{}T{}-03:00",
                date.format("%Y-%m-%d"),
                self.time_of_day.format("%H:%M:%S")
            )
        })
    }
}

/// Apply all configured mutations to a parsed document.
///
/// Returns the sorted, deduplicated list of change descriptions; an empty
/// list means nothing applied. CT-e waybills always come back empty.
pub fn apply(root: &mut Element, ctx: &MutationContext<'_>) -> Vec<String> {
    let local = root.local().to_string();
    let mut changes = match local.as_str() {
        "procInutNFe" => mutate_voiding_notice(root, ctx),
        "procEventoNFe" => mutate_cancellation_event(root, ctx),
        l if l == "cteProc" || l.contains("CTe") => Vec::new(),
        _ => mutate_invoice(root, ctx),
    };
    changes.sort();
    changes.dedup();
    changes
}

fn mutate_invoice(root: &mut Element, ctx: &MutationContext<'_>) -> Vec<String> {
    let mut changes = Vec::new();
    let Some(original_key) = root
        .find_deep("infNFe")
        .and_then(|inf| inf.attr("Id"))
        .and_then(|id| id.strip_prefix("NFe"))
        .map(str::to_string)
    else {
        return changes;
    };

    rewrite_issuer(root, ctx, &mut changes);
    rewrite_line_items(root, ctx, &mut changes);
    recompute_totals(root, ctx, &mut changes);
    rewrite_dates(root, ctx, &mut changes);
    rewrite_access_key(root, ctx, &original_key, &mut changes);
    rewrite_reference_key(root, ctx, &original_key, &mut changes);
    changes
}

/// Step 1: issuer identity and address overwrites.
fn rewrite_issuer(root: &mut Element, ctx: &MutationContext<'_>, changes: &mut Vec<String>) {
    if !ctx.config.alter.issuer || ctx.config.issuer.is_empty() {
        return;
    }
    let Some(emit) = root.find_deep_mut("infNFe/emit") else {
        return;
    };
    for (field, value) in &ctx.config.issuer {
        let path = if ADDRESS_FIELDS.contains(&field.as_str()) {
            format!("enderEmit/{field}")
        } else {
            field.clone()
        };
        if let Some(tag) = emit.find_mut(&path) {
            tag.set_text(value);
            changes.push(format!("Emitente: <{field}> alterado"));
        }
    }
}

/// Steps 2–5 (per line item): product fields, tax fields, CST remapping,
/// and excise zeroing for shipment/return CFOPs.
fn rewrite_line_items(root: &mut Element, ctx: &MutationContext<'_>, changes: &mut Vec<String>) {
    let cfg = ctx.config;
    let Some(inf_nfe) = root.find_deep_mut("infNFe") else {
        return;
    };

    for det in inf_nfe.children_named_mut("det") {
        let cfop = det
            .find("prod/CFOP")
            .map(|e| e.text_str().to_string())
            .unwrap_or_default();

        if cfg.alter.products && !cfg.product.is_empty() {
            if let Some(prod) = det.find_mut("prod") {
                for (field, value) in &cfg.product {
                    if let Some(tag) = prod.find_mut(field) {
                        tag.set_text(value);
                        changes.push(format!("Produto: <{field}> alterado"));
                    }
                }
            }
        }

        let Some(imposto) = det.find_mut("imposto") else {
            continue;
        };

        if cfg.alter.taxes {
            for (path, value) in &cfg.taxes {
                if let Some(tag) = imposto.find_deep_mut(path) {
                    tag.set_text(value);
                    changes.push(format!("Imposto: <{path}> alterado"));
                }
            }
        }

        if cfg.alter.tax_code {
            if let Some(rules) = cfg.tax_code_map.get(&cfop) {
                if let Some(code) = &rules.icms {
                    if let Some(cst) = imposto
                        .find_mut("ICMS")
                        .and_then(|t| t.find_deep_mut("CST"))
                    {
                        cst.set_text(code);
                        changes.push("CST do ICMS alterado".into());
                    }
                }
                if let Some(code) = &rules.ipi {
                    if let Some(ipi) = imposto.find_mut("IPI") {
                        // Remapping the IPI code also zeroes its base.
                        if let Some(v_bc) = ipi.find_deep_mut("vBC") {
                            v_bc.set_text("0.00");
                            changes
                                .push("IPI do item: Base de cálculo (vBC) zerada".into());
                        }
                        if let Some(cst) = ipi.find_deep_mut("CST") {
                            cst.set_text(code);
                            changes.push("CST do IPI alterado".into());
                        }
                    }
                }
                if let Some(code) = &rules.pis {
                    if let Some(cst) = imposto
                        .find_mut("PIS")
                        .and_then(|t| t.find_deep_mut("CST"))
                    {
                        cst.set_text(code);
                        changes.push("CST do PIS alterado".into());
                    }
                }
                if let Some(code) = &rules.cofins {
                    if let Some(cst) = imposto
                        .find_mut("COFINS")
                        .and_then(|t| t.find_deep_mut("CST"))
                    {
                        cst.set_text(code);
                        changes.push("CST do COFINS alterado".into());
                    }
                }
            }
        }

        if cfg.alter.zero_excise_on_shipment_return && is_shipment_or_return(&cfop) {
            if let Some(ipi) = imposto.find_mut("IPI") {
                if let Some(v_ipi) = ipi.find_deep_mut("vIPI") {
                    v_ipi.set_text("0.00");
                    changes.push("IPI do item: Valor (vIPI) zerado".into());
                }
                if let Some(p_ipi) = ipi.find_deep_mut("pIPI") {
                    p_ipi.set_text("0.0000");
                    changes.push("IPI do item: Alíquota (pIPI) zerada".into());
                }
            }
        }
    }
}

fn decimal_at(el: &Element, path: &str) -> Decimal {
    el.find(path)
        .and_then(|tag| Decimal::from_str(tag.text_str()).ok())
        .unwrap_or_default()
}

fn money(d: Decimal) -> String {
    format!("{:.2}", d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Step 5b: re-derive document totals from the mutated per-item values.
///
/// `vNF = Σ vProd − Σ vDesc + Σ vFrete + Σ vSeg + Σ vOutro + Σ vIPI`,
/// rounded half-up to 2 decimals. Runs only under the excise-zeroing toggle,
/// and always from the tree as it stands now, never from cached sums.
fn recompute_totals(root: &mut Element, ctx: &MutationContext<'_>, changes: &mut Vec<String>) {
    if !ctx.config.alter.zero_excise_on_shipment_return {
        return;
    }
    let Some(inf_nfe) = root.find_deep_mut("infNFe") else {
        return;
    };
    if inf_nfe.find_deep("total/ICMSTot").is_none() {
        return;
    }

    let mut sum_prod = Decimal::ZERO;
    let mut sum_desc = Decimal::ZERO;
    let mut sum_frete = Decimal::ZERO;
    let mut sum_seg = Decimal::ZERO;
    let mut sum_outro = Decimal::ZERO;
    let mut sum_ipi = Decimal::ZERO;
    for det in inf_nfe.find_all("det") {
        if let Some(prod) = det.find("prod") {
            sum_prod += decimal_at(prod, "vProd");
            sum_desc += decimal_at(prod, "vDesc");
            sum_frete += decimal_at(prod, "vFrete");
            sum_seg += decimal_at(prod, "vSeg");
            sum_outro += decimal_at(prod, "vOutro");
        }
        if let Some(ipi) = det.find("imposto").and_then(|i| i.find("IPI")) {
            if let Some(v_ipi) = ipi.find_deep("vIPI") {
                sum_ipi += Decimal::from_str(v_ipi.text_str()).unwrap_or_default();
            }
        }
    }
    let total = sum_prod - sum_desc + sum_frete + sum_seg + sum_outro + sum_ipi;

    let Some(icms_tot) = inf_nfe.find_deep_mut("total/ICMSTot") else {
        return;
    };
    if let Some(tag) = icms_tot.find_mut("vIPI") {
        tag.set_text(&money(sum_ipi));
        changes.push("Total vIPI recalculado".into());
    }
    if let Some(tag) = icms_tot.find_mut("vNF") {
        tag.set_text(&money(total));
        changes.push("Total vNF recalculado".into());
    }
}

/// Step 6: emission and receipt dates.
fn rewrite_dates(root: &mut Element, ctx: &MutationContext<'_>, changes: &mut Vec<String>) {
    let Some(ts) = ctx.timestamp() else {
        return;
    };
    if let Some(ide) = root.find_deep_mut("infNFe/ide") {
        for field in ["dhEmi", "dhSaiEnt"] {
            if let Some(tag) = ide.find_mut(field) {
                tag.set_text(&ts);
                changes.push(format!("Data: <{field}> alterada"));
            }
        }
    }
    if let Some(tag) = root.find_deep_mut("protNFe/infProt/dhRecbto") {
        tag.set_text(&ts);
        changes.push("Protocolo: <dhRecbto> alterado".into());
    }
}

/// Step 7: the document's own access key and its protocol echo.
fn rewrite_access_key(
    root: &mut Element,
    ctx: &MutationContext<'_>,
    original_key: &str,
    changes: &mut Vec<String>,
) {
    let Some(new_key) = ctx.maps.replacement(original_key).map(str::to_string) else {
        return;
    };
    if let Some(inf_nfe) = root.find_deep_mut("infNFe") {
        inf_nfe.set_attr("Id", &format!("NFe{new_key}"));
        changes.push(format!("Chave de Acesso ID alterada para: {new_key}"));
    }
    if let Some(ch_nfe) = root.find_deep_mut("protNFe/infProt/chNFe") {
        ch_nfe.set_text(&new_key);
        changes.push("Chave de Acesso do Protocolo alterada".into());
    }
}

/// Step 8: rewrite the reference to a predecessor document, when that
/// document's own key was replaced.
fn rewrite_reference_key(
    root: &mut Element,
    ctx: &MutationContext<'_>,
    original_key: &str,
    changes: &mut Vec<String>,
) {
    if !ctx.config.alter.reference_key {
        return;
    }
    let Some(new_ref) = ctx
        .maps
        .referenced_replacement(original_key)
        .map(str::to_string)
    else {
        return;
    };
    if let Some(inf_nfe) = root.find_deep_mut("infNFe") {
        if let Some(tag) = inf_nfe.find_deep_mut("ide/NFref/refNFe") {
            tag.set_text(&new_ref);
            changes.push(format!("Chave de Referência alterada para: {new_ref}"));
        }
    }
}

/// Voiding notices: CNPJ, the two-digit year, and the receipt timestamp.
fn mutate_voiding_notice(root: &mut Element, ctx: &MutationContext<'_>) -> Vec<String> {
    let mut changes = Vec::new();

    if ctx.config.alter.issuer {
        if let Some(cnpj) = ctx.config.issuer.get("CNPJ") {
            if let Some(tag) = root.find_deep_mut("inutNFe/infInut/CNPJ") {
                tag.set_text(cnpj);
                changes.push("Inutilização: <CNPJ> alterado".into());
            }
        }
    }

    if let Some(date) = ctx.new_date {
        if let Some(tag) = root.find_deep_mut("inutNFe/infInut/ano") {
            tag.set_text(&date.format("%y").to_string());
            changes.push("Inutilização: <ano> alterado".into());
        }
        if let Some(ts) = ctx.timestamp() {
            if let Some(tag) = root.find_deep_mut("retInutNFe/infInut/dhRecbto") {
                tag.set_text(&ts);
                changes.push("Inutilização: <dhRecbto> alterado".into());
            }
        }
    }
    changes
}

/// Cancellation events: dates plus the cancelled document's key, looked up
/// directly and then by the embedded document number as a fallback. A key
/// absent from the mapping is left untouched.
fn mutate_cancellation_event(root: &mut Element, ctx: &MutationContext<'_>) -> Vec<String> {
    let mut changes = Vec::new();

    if let Some(ts) = ctx.timestamp() {
        if let Some(tag) = root.find_deep_mut("evento/infEvento/dhEvento") {
            tag.set_text(&ts);
            changes.push("Evento: <dhEvento> alterado".into());
        }
        if let Some(tag) = root.find_deep_mut("retEvento/infRetEvento/dhRegEvento") {
            tag.set_text(&ts);
            changes.push("Evento: <dhRegEvento> alterado".into());
        }
    }

    let cancelled = root
        .find_deep("evento/infEvento/chNFe")
        .map(|e| e.text_str().to_string())
        .unwrap_or_default();
    if cancelled.is_empty() {
        return changes;
    }
    let replacement = ctx
        .maps
        .replacement(&cancelled)
        .or_else(|| ctx.maps.replacement_by_number(&cancelled))
        .map(str::to_string);
    if let Some(new_key) = replacement {
        if let Some(tag) = root.find_deep_mut("evento/infEvento/chNFe") {
            tag.set_text(&new_key);
            changes.push(format!("Evento: Chave cancelada alterada para: {new_key}"));
        }
        if let Some(tag) = root.find_deep_mut("retEvento/infRetEvento/chNFe") {
            tag.set_text(&new_key);
            changes.push("Evento: Chave do retorno alterada".into());
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::Document;

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 30, 45).unwrap()
    }

    #[test]
    fn money_rounds_half_up_to_two_decimals() {
        use rust_decimal_macros::dec;
        assert_eq!(money(dec!(170.555)), "170.56");
        assert_eq!(money(dec!(10.004)), "10.00");
        assert_eq!(money(dec!(0)), "0.00");
    }

    fn empty_maps() -> BatchMaps {
        BatchMaps::default()
    }

    const SHIPMENT_XML: &str = r#"<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe">
      <NFe><infNFe Id="NFe35240611222333000181550010000222221000022226">
        <ide><nNF>22222</nNF><natOp>Remessa</natOp>
          <dhEmi>2024-06-01T08:00:00-03:00</dhEmi>
        </ide>
        <emit><CNPJ>11222333000181</CNPJ><xNome>Old Name</xNome>
          <enderEmit><xLgr>Rua Velha</xLgr><xMun>Sao Paulo</xMun></enderEmit>
        </emit>
        <det nItem="1">
          <prod><CFOP>5949</CFOP><vProd>100.00</vProd><vDesc>10.00</vDesc></prod>
          <imposto><IPI><IPITrib><CST>50</CST><vBC>100.00</vBC><pIPI>5.0000</pIPI><vIPI>10.00</vIPI></IPITrib></IPI></imposto>
        </det>
        <det nItem="2">
          <prod><CFOP>5949</CFOP><vProd>50.00</vProd><vFrete>5.00</vFrete></prod>
          <imposto><IPI><IPITrib><CST>50</CST><vIPI>5.00</vIPI></IPITrib></IPI></imposto>
        </det>
        <det nItem="3">
          <prod><CFOP>5949</CFOP><vProd>25.555</vProd></prod>
          <imposto><IPI><IPITrib><CST>50</CST><vIPI>0.00</vIPI></IPITrib></IPI></imposto>
        </det>
        <total><ICMSTot><vIPI>15.00</vIPI><vNF>185.00</vNF></ICMSTot></total>
      </infNFe></NFe>
      <protNFe><infProt>
        <chNFe>35240611222333000181550010000222221000022226</chNFe>
        <dhRecbto>2024-06-01T08:01:00-03:00</dhRecbto>
      </infProt></protNFe>
    </nfeProc>"#;

    #[test]
    fn excise_zeroing_recomputes_totals() {
        let mut doc = Document::parse(SHIPMENT_XML).unwrap();
        let mut cfg = CompanyConfig::default();
        cfg.alter.zero_excise_on_shipment_return = true;
        let maps = empty_maps();
        let ctx = MutationContext::new(&cfg, &maps)
            .unwrap()
            .with_time_of_day(noon());
        let changes = apply(&mut doc.root, &ctx);

        assert!(changes.contains(&"IPI do item: Valor (vIPI) zerado".to_string()));
        assert!(changes.contains(&"IPI do item: Alíquota (pIPI) zerada".to_string()));
        assert!(changes.contains(&"Total vIPI recalculado".to_string()));
        assert!(changes.contains(&"Total vNF recalculado".to_string()));

        let out = doc.to_xml_string().unwrap();
        // All line excise values zeroed, so the total excise is zero and the
        // grand total is 100 - 10 + 50 + 5 + 25.555 = 170.56 (half-up).
        assert!(out.contains("<vIPI>0.00</vIPI>"));
        assert!(out.contains("<vNF>170.56</vNF>"));
        assert!(out.contains("<pIPI>0.0000</pIPI>"));
    }

    #[test]
    fn issuer_fields_route_to_address() {
        let mut doc = Document::parse(SHIPMENT_XML).unwrap();
        let mut cfg = CompanyConfig::default();
        cfg.alter.issuer = true;
        cfg.issuer.insert("xNome".into(), "New Name".into());
        cfg.issuer.insert("xLgr".into(), "Rua Nova".into());
        cfg.issuer.insert("IE".into(), "999".into()); // absent: no-op
        let maps = empty_maps();
        let ctx = MutationContext::new(&cfg, &maps)
            .unwrap()
            .with_time_of_day(noon());
        let changes = apply(&mut doc.root, &ctx);

        assert!(changes.contains(&"Emitente: <xNome> alterado".to_string()));
        assert!(changes.contains(&"Emitente: <xLgr> alterado".to_string()));
        assert!(!changes.iter().any(|c| c.contains("<IE>")));
        let out = doc.to_xml_string().unwrap();
        assert!(out.contains("<xNome>New Name</xNome>"));
        assert!(out.contains("<xLgr>Rua Nova</xLgr>"));
    }

    #[test]
    fn date_rewrite_uses_fixed_offset() {
        let mut doc = Document::parse(SHIPMENT_XML).unwrap();
        let mut cfg = CompanyConfig::default();
        cfg.alter.date = true;
        cfg.date.new_date = Some("15/01/2025".into());
        let maps = empty_maps();
        let ctx = MutationContext::new(&cfg, &maps)
            .unwrap()
            .with_time_of_day(noon());
        let changes = apply(&mut doc.root, &ctx);

        assert!(changes.contains(&"Data: <dhEmi> alterada".to_string()));
        assert!(changes.contains(&"Protocolo: <dhRecbto> alterado".to_string()));
        // dhSaiEnt is absent in the fixture, so no change is reported for it.
        assert!(!changes.iter().any(|c| c.contains("dhSaiEnt")));
        let out = doc.to_xml_string().unwrap();
        assert!(out.contains("<dhEmi>2025-01-15T12:30:45-03:00</dhEmi>"));
    }

    #[test]
    fn access_key_substitution_updates_protocol_echo() {
        let mut doc = Document::parse(SHIPMENT_XML).unwrap();
        let cfg = CompanyConfig::default();
        let mut maps = empty_maps();
        let original = "35240611222333000181550010000222221000022226";
        let replacement = "35240612345678000195550010000222221000022221";
        maps.key_mapping
            .insert(original.to_string(), replacement.to_string());
        let ctx = MutationContext::new(&cfg, &maps)
            .unwrap()
            .with_time_of_day(noon());
        let changes = apply(&mut doc.root, &ctx);

        assert!(!changes.is_empty());
        let out = doc.to_xml_string().unwrap();
        assert!(out.contains(&format!("Id=\"NFe{replacement}\"")));
        assert!(out.contains(&format!("<chNFe>{replacement}</chNFe>")));
        assert!(!out.contains(original));
    }

    #[test]
    fn untouched_document_reports_no_changes() {
        let mut doc = Document::parse(SHIPMENT_XML).unwrap();
        let cfg = CompanyConfig::default();
        let maps = empty_maps();
        let ctx = MutationContext::new(&cfg, &maps)
            .unwrap()
            .with_time_of_day(noon());
        assert!(apply(&mut doc.root, &ctx).is_empty());
    }

    #[test]
    fn tax_code_remap_zeroes_excise_base() {
        let mut doc = Document::parse(SHIPMENT_XML).unwrap();
        let mut cfg = CompanyConfig::default();
        cfg.alter.tax_code = true;
        cfg.tax_code_map.insert(
            "5949".into(),
            crate::config::TaxCodeRules {
                icms: None,
                ipi: Some("53".into()),
                pis: None,
                cofins: None,
            },
        );
        let maps = empty_maps();
        let ctx = MutationContext::new(&cfg, &maps)
            .unwrap()
            .with_time_of_day(noon());
        let changes = apply(&mut doc.root, &ctx);

        assert!(changes.contains(&"CST do IPI alterado".to_string()));
        assert!(changes.contains(&"IPI do item: Base de cálculo (vBC) zerada".to_string()));
        let out = doc.to_xml_string().unwrap();
        assert!(out.contains("<CST>53</CST>"));
        assert!(out.contains("<vBC>0.00</vBC>"));
    }

    const CANCEL_XML: &str = r#"<procEventoNFe xmlns="http://www.portalfiscal.inf.br/nfe">
      <evento><infEvento>
        <tpEvento>110111</tpEvento>
        <chNFe>35240611222333000181550010000222221000022226</chNFe>
        <dhEvento>2024-06-02T09:00:00-03:00</dhEvento>
      </infEvento></evento>
      <retEvento><infRetEvento>
        <chNFe>35240611222333000181550010000222221000022226</chNFe>
        <dhRegEvento>2024-06-02T09:00:05-03:00</dhRegEvento>
      </infRetEvento></retEvento>
    </procEventoNFe>"#;

    #[test]
    fn cancellation_event_rewrites_mapped_key() {
        let mut doc = Document::parse(CANCEL_XML).unwrap();
        let cfg = CompanyConfig::default();
        let mut maps = empty_maps();
        let replacement = "35240612345678000195550010000222221000022221";
        maps.key_mapping.insert(
            "35240611222333000181550010000222221000022226".to_string(),
            replacement.to_string(),
        );
        let ctx = MutationContext::new(&cfg, &maps)
            .unwrap()
            .with_time_of_day(noon());
        let changes = apply(&mut doc.root, &ctx);

        assert!(!changes.is_empty());
        let out = doc.to_xml_string().unwrap();
        assert_eq!(out.matches(replacement).count(), 2);
    }

    #[test]
    fn cancellation_event_with_unknown_key_is_untouched() {
        let mut doc = Document::parse(CANCEL_XML).unwrap();
        let cfg = CompanyConfig::default();
        let maps = empty_maps();
        let ctx = MutationContext::new(&cfg, &maps)
            .unwrap()
            .with_time_of_day(noon());
        assert!(apply(&mut doc.root, &ctx).is_empty());
    }

    const VOID_XML: &str = r#"<procInutNFe xmlns="http://www.portalfiscal.inf.br/nfe">
      <inutNFe><infInut><CNPJ>11222333000181</CNPJ><ano>24</ano></infInut></inutNFe>
      <retInutNFe><infInut><dhRecbto>2024-06-01T10:00:00-03:00</dhRecbto></infInut></retInutNFe>
    </procInutNFe>"#;

    #[test]
    fn voiding_notice_rewrites_cnpj_year_and_receipt() {
        let mut doc = Document::parse(VOID_XML).unwrap();
        let mut cfg = CompanyConfig::default();
        cfg.alter.issuer = true;
        cfg.issuer.insert("CNPJ".into(), "12345678000195".into());
        cfg.alter.date = true;
        cfg.date.new_date = Some("15/01/2025".into());
        let maps = empty_maps();
        let ctx = MutationContext::new(&cfg, &maps)
            .unwrap()
            .with_time_of_day(noon());
        let changes = apply(&mut doc.root, &ctx);

        assert_eq!(changes.len(), 3);
        let out = doc.to_xml_string().unwrap();
        assert!(out.contains("<CNPJ>12345678000195</CNPJ>"));
        assert!(out.contains("<ano>25</ano>"));
        assert!(out.contains("<dhRecbto>2025-01-15T12:30:45-03:00</dhRecbto>"));
    }
}
