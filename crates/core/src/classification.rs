//! Line-item product classification.
//!
//! Assigns a [`ProductCategory`] to an order line item from its title,
//! variant title and price. The rules are a best-effort heuristic used to
//! seed a default task list that a person can correct; they intentionally
//! over-match headphones (see [`classify_product`]).

use serde::{Deserialize, Serialize};

/// Title keywords that mark a line item as an accessory.
pub const ACCESSORY_KEYWORDS: &[&str] = &["pad", "cushion", "cable", "cord", "strap", "headband"];

/// Title keywords that mark a line item as electronics.
pub const ELECTRONICS_KEYWORDS: &[&str] = &["amp", "dac"];

/// Brand tokens that, combined with a price over [`BRAND_PRICE_THRESHOLD`],
/// classify a line item as a headphone.
pub const DEFAULT_BRAND_TOKENS: &[&str] = &["zmf"];

/// Price above which a brand-token title counts as a headphone.
pub const BRAND_PRICE_THRESHOLD: f64 = 100.0;

/// Headphone model names used when the `headphone_models` setting cannot be read.
pub const DEFAULT_HEADPHONE_MODELS: &[&str] = &[
    "Auteur", "Verite", "Atrium", "Aeolus", "Eikon", "Caldera", "Bokeh", "Vérité",
];

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Production category of an order line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Headphone,
    Component,
    Accessory,
    Electronics,
    Other,
}

impl ProductCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Headphone => "headphone",
            Self::Component => "component",
            Self::Accessory => "accessory",
            Self::Electronics => "electronics",
            Self::Other => "other",
        }
    }

    /// Parse a stored category string. Unknown strings become [`Self::Other`].
    pub fn from_str_lossy(value: &str) -> Self {
        match value {
            "headphone" => Self::Headphone,
            "component" => Self::Component,
            "accessory" => Self::Accessory,
            "electronics" => Self::Electronics,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Parse a storefront price string (e.g. `"499.00"`).
pub fn parse_price(price: &str) -> Option<f64> {
    price.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Classify a line item.
///
/// Rules, first match wins:
///
/// 1. price is zero => component
/// 2. title contains an accessory keyword => accessory
/// 3. headphone when any of: the title or variant mentions a configured model
///    name; the title contains "headphone"; the title contains a brand token
///    and the price is over 100
/// 4. title contains "amp" or "dac" => electronics
/// 5. otherwise => other
///
/// The model-name and brand-plus-price rules are known to over-match. An
/// unparsable price (`None`) never triggers the price rules.
pub fn classify_product(
    title: &str,
    variant_title: Option<&str>,
    price: Option<f64>,
    models: &[String],
) -> ProductCategory {
    if price == Some(0.0) {
        return ProductCategory::Component;
    }

    let title_lc = title.to_lowercase();
    if contains_any(&title_lc, ACCESSORY_KEYWORDS) {
        return ProductCategory::Accessory;
    }

    let variant_lc = variant_title.unwrap_or_default().to_lowercase();
    let mentions_model = models
        .iter()
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .any(|m| title_lc.contains(&m) || variant_lc.contains(&m));
    let mentions_headphone = title_lc.contains("headphone");
    let brand_and_price = contains_any(&title_lc, DEFAULT_BRAND_TOKENS)
        && price.is_some_and(|p| p > BRAND_PRICE_THRESHOLD);

    if mentions_model || mentions_headphone || brand_and_price {
        return ProductCategory::Headphone;
    }

    if contains_any(&title_lc, ELECTRONICS_KEYWORDS) {
        return ProductCategory::Electronics;
    }

    ProductCategory::Other
}

/// Default model list as owned strings.
pub fn default_headphone_models() -> Vec<String> {
    DEFAULT_HEADPHONE_MODELS.iter().map(|m| m.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
