//! The portfolio document: security discovery, composition loading and
//! taxonomy injection.
//!
//! The document is kept as raw text; discovery runs a streaming scan over it
//! and injection replays the event stream into a writer, so everything the
//! classifier does not touch survives byte for byte.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use morningstar_api::Client;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::aggregate::aggregate;
use crate::error::ClassifyError;
use crate::holdings::HoldingReport;
use crate::inject::render_taxonomy;
use crate::resolve::resolve;
use crate::secid_cache::SecidCache;
use crate::taxonomy::TaxonomyKind;

/// One security record from the document, with its loaded composition.
pub struct Security {
    pub name: String,
    pub isin: String,
    pub uuid: String,
    /// A secid the document itself carries; resolution goes through the
    /// cache regardless, this is informational.
    pub secid: Option<String>,
    /// 1-based position among all of the document's security records.
    pub position: usize,
    holdings: Option<HoldingReport>,
}

impl Security {
    pub fn holdings(&self) -> Option<&HoldingReport> {
        self.holdings.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        name: &str,
        isin: &str,
        uuid: &str,
        position: usize,
        holdings: Option<HoldingReport>,
    ) -> Self {
        Self {
            name: name.to_string(),
            isin: isin.to_string(),
            uuid: uuid.to_string(),
            secid: None,
            position,
            holdings,
        }
    }
}

#[derive(Default)]
struct RawRecord {
    position: usize,
    uuid: String,
    name: String,
    isin: Option<String>,
    secid: Option<String>,
}

/// A loaded portfolio document plus the taxonomy subtrees queued for it.
pub struct PortfolioFile {
    raw: String,
    domain: String,
    securities: Option<Vec<Security>>,
    pending: Vec<String>,
}

impl PortfolioFile {
    pub fn parse(raw: String, domain: &str) -> Self {
        Self {
            raw,
            domain: domain.to_string(),
            securities: None,
            pending: Vec::new(),
        }
    }

    pub fn load(path: &Path, domain: &str) -> Result<Self, ClassifyError> {
        Ok(Self::parse(fs::read_to_string(path)?, domain))
    }

    /// The classifiable securities: every record referenced by at least one
    /// portfolio transaction whose composition could be loaded. The result
    /// is memoized so repeated taxonomy passes reuse one set of fetches.
    pub async fn securities(
        &mut self,
        client: &Client,
        cache: &mut SecidCache,
    ) -> Result<&[Security], ClassifyError> {
        if self.securities.is_none() {
            let (records, referenced) = scan_document(&self.raw)?;
            let mut securities = Vec::new();
            for position in referenced {
                let Some(record) = records.get(position - 1) else {
                    tracing::warn!(
                        "transaction references security [{}], which does not exist",
                        position
                    );
                    continue;
                };
                let Some(isin) = record.isin.as_deref() else {
                    tracing::info!("security '{}' does not have isin, skipping it", record.name);
                    continue;
                };
                let entry = match resolve(client, cache, isin, &self.domain).await {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!("could not resolve isin {}: {}", isin, e);
                        continue;
                    }
                };
                if entry.is_not_found() {
                    tracing::info!(
                        "isin {} not found for domain '{}', skipping it; try another domain with -d",
                        isin,
                        self.domain
                    );
                    continue;
                }
                if entry.kind == "stock" {
                    tracing::info!("isin {} is a stock, skipping it", isin);
                    continue;
                }
                match HoldingReport::load(client, isin, &entry).await {
                    Ok(report) => securities.push(Security {
                        name: record.name.clone(),
                        isin: isin.to_string(),
                        uuid: record.uuid.clone(),
                        secid: record.secid.clone(),
                        position: record.position,
                        holdings: Some(report),
                    }),
                    Err(e) => {
                        tracing::warn!("could not load composition for isin {}: {}", isin, e);
                    }
                }
            }
            self.securities = Some(securities);
        }
        Ok(self.securities.as_deref().unwrap_or(&[]))
    }

    /// Aggregates one taxonomy kind over the loaded securities and queues
    /// its subtree for injection.
    pub async fn add_taxonomy(
        &mut self,
        kind: TaxonomyKind,
        client: &Client,
        cache: &mut SecidCache,
    ) -> Result<(), ClassifyError> {
        tracing::info!("adding '{}' taxonomy", kind);
        self.securities(client, cache).await?;
        let categories = aggregate(self.securities.as_deref().unwrap_or(&[]), kind);
        self.pending.push(render_taxonomy(kind, &categories)?);
        Ok(())
    }

    /// The document with every queued taxonomy appended under the first
    /// `<taxonomies>` element. Untouched content passes through unchanged.
    pub fn to_xml(&self) -> Result<String, ClassifyError> {
        let mut reader = Reader::from_str(&self.raw);
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        let mut injected = false;

        loop {
            match reader.read_event()? {
                Event::Eof => break,
                Event::Empty(e) if !injected && e.name().as_ref() == b"taxonomies" => {
                    writer.write_event(Event::Start(e))?;
                    self.write_pending(&mut writer)?;
                    writer.write_event(Event::End(BytesEnd::new("taxonomies")))?;
                    injected = true;
                }
                Event::End(e) if !injected && e.name().as_ref() == b"taxonomies" => {
                    self.write_pending(&mut writer)?;
                    injected = true;
                    writer.write_event(Event::End(e))?;
                }
                event => writer.write_event(event)?,
            }
        }
        if !injected && !self.pending.is_empty() {
            return Err(ClassifyError::Document(
                "document has no <taxonomies> element".to_string(),
            ));
        }

        let buf = writer.into_inner().into_inner();
        String::from_utf8(buf)
            .map_err(|e| ClassifyError::Document(format!("document is not UTF-8: {}", e)))
    }

    pub fn write(&self, path: &Path) -> Result<(), ClassifyError> {
        fs::write(path, self.to_xml()?)?;
        Ok(())
    }

    fn write_pending(&self, writer: &mut Writer<Cursor<Vec<u8>>>) -> Result<(), ClassifyError> {
        for subtree in &self.pending {
            writer.get_mut().write_all(b"\n")?;
            writer.get_mut().write_all(subtree.as_bytes())?;
        }
        Ok(())
    }
}

/// Scans the document once, collecting every security record and, in
/// first-seen order, the positions the portfolio transactions reference.
fn scan_document(raw: &str) -> Result<(Vec<RawRecord>, Vec<usize>), ClassifyError> {
    let mut reader = Reader::from_str(raw);
    let mut path: Vec<String> = Vec::new();
    let mut records: Vec<RawRecord> = Vec::new();
    let mut referenced: Vec<usize> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "security" {
                    match path.last().map(String::as_str) {
                        Some("securities") => records.push(RawRecord {
                            position: records.len() + 1,
                            ..RawRecord::default()
                        }),
                        Some("portfolio-transaction") => {
                            note_reference(&e, &mut referenced)?;
                        }
                        _ => {}
                    }
                }
                path.push(name);
            }
            Event::Empty(e) => {
                if e.name().as_ref() == b"security"
                    && path.last().map(String::as_str) == Some("portfolio-transaction")
                {
                    note_reference(&e, &mut referenced)?;
                }
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(t) => {
                let n = path.len();
                if n >= 3 && path[n - 3] == "securities" && path[n - 2] == "security" {
                    if let Some(record) = records.last_mut() {
                        let text = t.unescape()?.into_owned();
                        match path[n - 1].as_str() {
                            "uuid" => record.uuid = text,
                            "name" => record.name = text,
                            "isin" => record.isin = Some(text),
                            "secid" => record.secid = Some(text),
                            _ => {}
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok((records, referenced))
}

fn note_reference(element: &BytesStart, referenced: &mut Vec<usize>) -> Result<(), ClassifyError> {
    if let Some(attr) = element
        .try_get_attribute("reference")
        .map_err(quick_xml::Error::from)?
    {
        let value = attr.unescape_value()?;
        if let Some(position) = reference_position(&value) {
            if !referenced.contains(&position) {
                referenced.push(position);
            }
        } else {
            tracing::warn!("unparseable security reference '{}'", value);
        }
    }
    Ok(())
}

/// The 1-based position addressed by a transaction's relative reference: a
/// trailing `security[n]` segment names record n, a bare `security` names
/// the first record.
fn reference_position(reference: &str) -> Option<usize> {
    let segment = reference.rsplit('/').next()?;
    if segment == "security" {
        return Some(1);
    }
    segment
        .strip_prefix("security[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}
