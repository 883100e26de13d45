//! Fixed bilingual synonym table for financial-report queries.
//!
//! One data structure instead of scattered keyword conditionals: each
//! entry maps a query term (English or Japanese) to the English terms
//! that count as synonym matches in chunk text. Expansion is a set
//! union, never a replacement of the original tokens.

/// Query term -> synonym expansions.
pub const SYNONYMS: &[(&str, &[&str])] = &[
    // Revenue family
    ("revenue", &["sales", "earnings", "income", "billion"]),
    ("sales", &["revenue", "earnings", "income"]),
    ("earnings", &["revenue", "income", "profit"]),
    ("収益", &["revenue", "sales", "earnings", "income"]),
    ("売上", &["revenue", "sales"]),
    // Financial statements
    ("financial", &["cash", "profit", "margin", "balance"]),
    ("財務", &["financial", "cash", "profit", "margin", "balance"]),
    ("balance", &["sheet", "statement"]),
    ("sheet", &["balance", "statement"]),
    ("statement", &["balance", "sheet"]),
    ("貸借対照表", &["balance", "sheet"]),
    // Balance sheet items
    ("cash", &["liquidity", "equivalents"]),
    ("現金", &["cash", "equivalents"]),
    ("assets", &["securities", "investments"]),
    ("資産", &["assets", "securities"]),
    ("liabilities", &["debt", "obligations"]),
    ("負債", &["liabilities", "debt"]),
    ("equity", &["capital", "shareholders"]),
    ("資本", &["equity", "capital"]),
    // Growth
    ("growth", &["increase", "expansion", "development"]),
    ("成長", &["growth", "increase", "expansion"]),
    // Company names
    ("apple", &["iphone", "ipad", "mac"]),
    ("google", &["alphabet"]),
    ("alphabet", &["google"]),
];

/// Query terms that signal financial-statement intent.
pub const FINANCIAL_INTENT: &[&str] = &[
    "revenue", "sales", "earnings", "income", "financial", "balance", "statement", "profit",
    "cash", "収益", "売上", "財務", "利益", "現金",
];

/// Chunk-side vocabulary that satisfies financial intent.
pub const FINANCIAL_VOCAB: &[&str] = &[
    "revenue",
    "sales",
    "earnings",
    "income",
    "financial",
    "cash",
    "profit",
    "margin",
    "balance",
    "billion",
    "million",
];

/// Generic financial keywords used by the loose fallback scorer.
pub const GENERIC_FINANCIAL: &[&str] = &[
    "revenue", "financial", "cash", "profit", "sales", "income", "billion", "million",
];

/// Look up the expansions for a query term.
///
/// ASCII keys match the token exactly; Japanese keys are matched by the
/// caller via substring containment because Japanese queries are not
/// whitespace-delimited.
pub fn expansions(term: &str) -> Option<&'static [&'static str]> {
    SYNONYMS
        .iter()
        .find(|(key, _)| *key == term)
        .map(|(_, exp)| *exp)
}
