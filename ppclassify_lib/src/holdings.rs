//! Per-security composition loading.
//!
//! Exchanges the bearer token once per security, walks every taxonomy kind
//! through the JSON pipeline, and retrieves the kinds that signaled fallback
//! from the consolidated x-ray report. Non-Asset-Type weights are finalized
//! by scaling with the long-equity exposure factor.

use morningstar_api::{Client, ComponentOutcome};

use crate::error::ClassifyError;
use crate::normalize::{escape_xml, normalize_component, WeightTable};
use crate::secid_cache::SecidEntry;
use crate::taxonomy::TaxonomyKind;
use crate::xray::XrayReport;

/// The normalized composition of one security across all taxonomy kinds.
pub struct HoldingReport {
    secid: String,
    long_equity: Option<f64>,
    weights: Vec<(TaxonomyKind, WeightTable)>,
}

impl HoldingReport {
    /// Fetches and normalizes all taxonomy kinds for one resolved security.
    pub async fn load(
        client: &Client,
        isin: &str,
        entry: &SecidEntry,
    ) -> Result<Self, ClassifyError> {
        let token = client.bearer_token(&entry.secid, &entry.domain).await?;
        tracing::info!(
            "retrieving data for {} {} ({}) using domain '{}'",
            entry.kind,
            isin,
            token.secid,
            entry.domain
        );

        let mut long_equity = None;
        let mut weights: Vec<(TaxonomyKind, WeightTable)> =
            Vec::with_capacity(TaxonomyKind::ALL.len());
        let mut fallback_kinds = Vec::new();

        for kind in TaxonomyKind::ALL {
            let config = kind.config();
            let outcome = client
                .component_data(
                    &token.secid,
                    &entry.kind,
                    config.endpoint,
                    config.component,
                    &token.token,
                )
                .await;
            match outcome {
                Ok(ComponentOutcome::Data(value)) => {
                    match normalize_component(kind, config, &value, &token.secid) {
                        Ok(normalized) => {
                            if kind == TaxonomyKind::AssetType {
                                long_equity = normalized.long_equity;
                            }
                            weights.push((kind, normalized.weights));
                            continue;
                        }
                        Err(e) => {
                            tracing::warn!(
                                "problem with {} for secid {}: {}",
                                kind,
                                token.secid,
                                e
                            );
                        }
                    }
                }
                Ok(ComponentOutcome::Fallback) => {
                    tracing::info!(
                        "{} for secid {} will be retrieved from x-ray",
                        kind,
                        token.secid
                    );
                }
                Err(e) => {
                    tracing::warn!("problem with {} for secid {}: {}", kind, token.secid, e);
                }
            }
            fallback_kinds.push(kind);
            weights.push((kind, WeightTable::default()));
        }

        if !fallback_kinds.is_empty() {
            let page = client.xray_page(&token.secid).await?;
            let report = XrayReport::parse(&page);
            for kind in fallback_kinds {
                match report.kind_rows(kind) {
                    Ok(extracted) => {
                        if kind == TaxonomyKind::AssetType {
                            if let Some(exposure) = extracted.long_equity {
                                long_equity = Some(exposure);
                            }
                        }
                        if let Some((_, table)) =
                            weights.iter_mut().find(|(k, _)| *k == kind)
                        {
                            for (name, percent) in extracted.rows {
                                table.add(escape_xml(&name), percent / 100.0);
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            "x-ray data for {} on {} unavailable: {}",
                            kind,
                            token.secid,
                            e
                        );
                    }
                }
            }
        }

        // Asset-Type's exposure factor finalizes every other kind; a factor
        // that was never computed zeroes them, which long_equity() exposes.
        let factor = long_equity.unwrap_or(0.0);
        for (kind, table) in &mut weights {
            if *kind != TaxonomyKind::AssetType {
                table.scale(factor);
            }
        }

        Ok(Self {
            secid: token.secid,
            long_equity,
            weights,
        })
    }

    pub fn secid(&self) -> &str {
        &self.secid
    }

    /// The long-equity exposure factor, or `None` when Asset-Type never
    /// yielded one. In the `None` case every other kind was scaled to zero.
    pub fn long_equity(&self) -> Option<f64> {
        self.long_equity
    }

    /// The finalized category fractions for one kind.
    pub fn weights(&self, kind: TaxonomyKind) -> &WeightTable {
        self.weights
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, table)| table)
            .unwrap_or(WeightTable::empty())
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        secid: &str,
        long_equity: Option<f64>,
        weights: Vec<(TaxonomyKind, WeightTable)>,
    ) -> Self {
        Self {
            secid: secid.to_string(),
            long_equity,
            weights,
        }
    }
}
