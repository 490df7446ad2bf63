//! Parser for the consolidated legacy x-ray report page.
//!
//! Each taxonomy kind that the JSON pipeline could not serve is read from a
//! fixed table on this page: the header cell of every row names the
//! category, a configured data column holds the percentage in a
//! decimal-comma locale. Missing cells default to zero rather than failing.

use scraper::{ElementRef, Html, Selector};

use crate::error::ClassifyError;
use crate::taxonomy::{TaxonomyKind, XRAY_NON_CATEGORIES};

/// Category rows extracted from one kind's x-ray table, as percentages.
pub struct XrayKind {
    pub rows: Vec<(String, f64)>,
    /// Long-equity fraction, filled for the Asset-Type table only.
    pub long_equity: Option<f64>,
}

/// A parsed x-ray page, queried once per fallback kind.
pub struct XrayReport {
    doc: Html,
}

impl XrayReport {
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Html::parse_document(html),
        }
    }

    /// Extracts the rows of `kind`'s table.
    pub fn kind_rows(&self, kind: TaxonomyKind) -> Result<XrayKind, ClassifyError> {
        let config = kind.config();
        let table_sel = selector("table.ms_data")?;
        let tr_sel = selector("tr")?;
        let th_sel = selector("th")?;
        let td_sel = selector("td")?;

        let table = self
            .doc
            .select(&table_sel)
            .nth(config.xray_table)
            .ok_or_else(|| {
                ClassifyError::Document(format!(
                    "x-ray table {} for {} not found",
                    config.xray_table, kind
                ))
            })?;
        // skip the column-header row
        let data_rows: Vec<ElementRef> = table.select(&tr_sel).skip(1).collect();

        let long_equity = if kind == TaxonomyKind::AssetType {
            data_rows
                .first()
                .and_then(|tr| tr.select(&td_sel).next())
                .map(|td| parse_percent(&cell_text(&td)) / 100.0)
        } else {
            None
        };

        let mut rows = Vec::new();
        for tr in data_rows {
            if cell_text(&tr).is_empty() {
                continue;
            }
            let header = tr
                .select(&th_sel)
                .next()
                .or_else(|| tr.select(&td_sel).next());
            let Some(header) = header else {
                continue;
            };
            let label = cell_text(&header);
            if XRAY_NON_CATEGORIES.contains(&label.as_str()) {
                continue;
            }
            let cells: Vec<ElementRef> = tr.select(&td_sel).collect();
            let percent = cells
                .get(config.xray_column)
                .map(|cell| parse_percent(&cell_text(cell)))
                .unwrap_or(0.0);
            rows.push((remap_label(label, config.xray_map), percent));
        }

        Ok(XrayKind { rows, long_equity })
    }
}

/// Labels not present in the secondary map are kept unchanged.
fn remap_label(label: String, map: &[(&str, &str)]) -> String {
    map.iter()
        .find(|(raw, _)| *raw == label)
        .map(|(_, display)| display.to_string())
        .unwrap_or(label)
}

/// Decimal-comma percentage text; blank or dash cells count as zero.
fn parse_percent(text: &str) -> f64 {
    let cleaned = text.trim().replace(',', ".").replace('-', "");
    if cleaned.is_empty() {
        return 0.0;
    }
    cleaned.parse().unwrap_or(0.0)
}

fn cell_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn selector(css: &str) -> Result<Selector, ClassifyError> {
    Selector::parse(css)
        .map_err(|e| ClassifyError::Document(format!("invalid selector '{}': {:?}", css, e)))
}
