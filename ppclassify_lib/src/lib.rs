//! Library layer for the portfolio classifier: secid resolution with a
//! persistent cache, per-security composition loading, portfolio-wide
//! aggregation, and taxonomy injection into the portfolio document.
//!
//! Wraps the `morningstar_api` crate with the normalization pipeline that
//! turns provider payloads (and the legacy x-ray fallback) into the
//! category weight taxonomies the document format expects.

pub mod aggregate;
pub mod error;
pub mod holdings;
pub mod inject;
pub mod normalize;
pub mod portfolio;
pub mod resolve;
pub mod secid_cache;
pub mod taxonomy;
pub mod xray;

pub use morningstar_api;

pub use aggregate::{aggregate, AggregatedCategory, Assignment};
pub use error::ClassifyError;
pub use holdings::HoldingReport;
pub use portfolio::{PortfolioFile, Security};
pub use resolve::resolve;
pub use secid_cache::{SecidCache, SecidEntry, CACHE_FILE};
pub use taxonomy::TaxonomyKind;
