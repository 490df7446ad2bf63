//! Static configuration for the six taxonomy kinds.
//!
//! Each kind carries its SAL endpoint template and JSON path, the field names
//! used to pull categories and percentages out of the payload, optional name
//! remapping tables, and the coordinates of its table on the x-ray fallback
//! page.

use std::fmt;

/// One classification dimension of the portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyKind {
    AssetType,
    StockStyle,
    Sector,
    Holdings,
    Region,
    Country,
}

impl TaxonomyKind {
    /// All kinds, in processing and output order. Asset-Type comes first
    /// because its long-equity exposure scales every other kind.
    pub const ALL: [TaxonomyKind; 6] = [
        TaxonomyKind::AssetType,
        TaxonomyKind::StockStyle,
        TaxonomyKind::Sector,
        TaxonomyKind::Holdings,
        TaxonomyKind::Region,
        TaxonomyKind::Country,
    ];

    /// The taxonomy name used in the output document.
    pub fn name(self) -> &'static str {
        match self {
            TaxonomyKind::AssetType => "Asset-Type",
            TaxonomyKind::StockStyle => "Stock-Style",
            TaxonomyKind::Sector => "Sector",
            TaxonomyKind::Holdings => "Holdings",
            TaxonomyKind::Region => "Region",
            TaxonomyKind::Country => "Country",
        }
    }

    /// Static fetch/normalize configuration for this kind.
    pub fn config(self) -> &'static TaxonomyConfig {
        match self {
            TaxonomyKind::AssetType => &ASSET_TYPE,
            TaxonomyKind::StockStyle => &STOCK_STYLE,
            TaxonomyKind::Sector => &SECTOR,
            TaxonomyKind::Holdings => &HOLDINGS,
            TaxonomyKind::Region => &REGION,
            TaxonomyKind::Country => &COUNTRY,
        }
    }
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static per-kind configuration.
pub struct TaxonomyConfig {
    /// SAL endpoint path template with a `{type}` placeholder.
    pub endpoint: &'static str,
    /// SAL component id sent as a query parameter.
    pub component: &'static str,
    /// Dotted path selecting category data in the JSON payload. A trailing
    /// `[*]` segment expands an array into one match per element.
    pub json_path: &'static str,
    /// Field holding the percentage inside a category value; empty when the
    /// value itself is the percentage.
    pub percent_field: &'static str,
    /// Field holding the category name in list-shaped payloads.
    pub category_field: &'static str,
    /// Raw-key to display-name remapping for the JSON payload. When
    /// non-empty, keys missing from this table are dropped.
    pub map: &'static [(&'static str, &'static str)],
    /// Secondary remapping applied to x-ray category labels; labels missing
    /// from the table are kept as-is.
    pub xray_map: &'static [(&'static str, &'static str)],
    /// Index of this kind's table among `table.ms_data` on the x-ray page.
    pub xray_table: usize,
    /// Data column holding the percentage in that table.
    pub xray_column: usize,
}

/// Metadata keys that are never categories in key-shaped payloads.
pub const NON_CATEGORY_KEYS: &[&str] =
    &["avgMarketCap", "portfolioDate", "name", "masterPortfolioId"];

/// Section header labels on the x-ray page that are not categories.
pub const XRAY_NON_CATEGORIES: &[&str] = &[
    "Defensive",
    "Cyclical",
    "Sensitive",
    "Greater Europe",
    "Americas",
    "Greater Asia",
];

/// Display colors cycled over output categories in insertion order.
pub const COLORS: &[&str] = &[
    "#EFC758", "#91C746", "#33A1AE", "#907DC6", "#D35530", "#506BA5",
    "#A5CBC3", "#F7A617", "#6BAED6", "#FC8D62", "#B3B3B3", "#C2A5CF",
];

static ASSET_TYPE: TaxonomyConfig = TaxonomyConfig {
    endpoint: "/sal-service/v1/{type}/process/asset/v2/",
    component: "sal-components-mip-asset-allocation",
    json_path: "allocationMap",
    percent_field: "netAllocation",
    category_field: "",
    map: &[
        ("assetAllocCash", "Cash"),
        ("assetAllocBond", "Bonds"),
        ("AssetAllocUSEquity", "Stocks"),
        ("AssetAllocNonUSEquity", "Stocks"),
        ("assetAllocOther", "Other"),
        ("assetAllocNotclassified", "Other"),
    ],
    xray_map: &[],
    xray_table: 0,
    xray_column: 2,
};

static STOCK_STYLE: TaxonomyConfig = TaxonomyConfig {
    endpoint: "/sal-service/v1/{type}/process/stockStyle/v2/",
    component: "sal-components-mip-style-box",
    json_path: "styleBreakdown",
    percent_field: "",
    category_field: "",
    map: &[
        ("largeValue", "Large Value"),
        ("largeBlend", "Large Blend"),
        ("largeGrowth", "Large Growth"),
        ("midValue", "Mid Value"),
        ("midBlend", "Mid Blend"),
        ("midGrowth", "Mid Growth"),
        ("smallValue", "Small Value"),
        ("smallBlend", "Small Blend"),
        ("smallGrowth", "Small Growth"),
    ],
    xray_map: &[
        ("Large Core", "Large Blend"),
        ("Mid Core", "Mid Blend"),
        ("Small Core", "Small Blend"),
    ],
    xray_table: 1,
    xray_column: 0,
};

static SECTOR: TaxonomyConfig = TaxonomyConfig {
    endpoint: "/sal-service/v1/{type}/portfolio/v2/sector/",
    component: "sal-components-mip-sector-exposure",
    json_path: "EQUITY.fundPortfolio",
    percent_field: "",
    category_field: "",
    map: &[
        ("basicMaterials", "Basic Materials"),
        ("communicationServices", "Communication Services"),
        ("consumerCyclical", "Consumer Cyclical"),
        ("consumerDefensive", "Consumer Defensive"),
        ("energy", "Energy"),
        ("financialServices", "Financial Services"),
        ("healthcare", "Healthcare"),
        ("industrials", "Industrials"),
        ("realEstate", "Real Estate"),
        ("technology", "Technology"),
        ("utilities", "Utilities"),
    ],
    xray_map: &[],
    xray_table: 3,
    xray_column: 0,
};

static HOLDINGS: TaxonomyConfig = TaxonomyConfig {
    endpoint: "/sal-service/v1/{type}/portfolio/holding/v2/",
    component: "sal-components-mip-holdings",
    json_path: "equityHoldingPage.holdingList[*]",
    percent_field: "weighting",
    category_field: "securityName",
    map: &[],
    xray_map: &[],
    xray_table: 4,
    xray_column: 0,
};

static REGION: TaxonomyConfig = TaxonomyConfig {
    endpoint: "/sal-service/v1/{type}/portfolio/regionalSector/",
    component: "sal-components-mip-region-exposure",
    json_path: "fundPortfolio.regions",
    percent_field: "",
    category_field: "",
    map: &[
        ("northAmerica", "North America"),
        ("latinAmerica", "Latin America"),
        ("unitedKingdom", "United Kingdom"),
        ("europeDeveloped", "Europe Developed"),
        ("europeEmerging", "Europe Emerging"),
        ("africaMiddleEast", "Africa/Middle East"),
        ("japan", "Japan"),
        ("australasia", "Australasia"),
        ("asiaDeveloped", "Asia Developed"),
        ("asiaEmerging", "Asia Emerging"),
    ],
    xray_map: &[],
    xray_table: 2,
    xray_column: 0,
};

static COUNTRY: TaxonomyConfig = TaxonomyConfig {
    endpoint: "/sal-service/v1/{type}/portfolio/regionalSectorIncludeCountries/",
    component: "sal-components-mip-country-exposure",
    json_path: "fundPortfolio.countries[*]",
    percent_field: "percent",
    category_field: "name",
    map: &[],
    xray_map: &[],
    xray_table: 5,
    xray_column: 0,
};
