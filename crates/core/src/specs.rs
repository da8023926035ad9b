//! Derived build specifications for an imported line item.
//!
//! Storefront line items carry build options in two places: free-text
//! `properties` (name/value pairs entered at checkout) and the variant title
//! (`"Cherry / Velour Pads / Balanced Cable"`). [`parse_line_item_specs`]
//! folds both into a [`LineItemSpecs`] record. Explicit properties win over
//! values inferred from the variant title.
//!
//! Specs are derived once at import and stored as JSON on the order item.

use serde::{Deserialize, Serialize};

use crate::classification::ProductCategory;

/// Wood species recognised in variant titles.
pub const KNOWN_WOODS: &[&str] = &[
    "cherry",
    "walnut",
    "cocobolo",
    "padauk",
    "bubinga",
    "ebony",
    "maple",
    "oak",
    "teak",
    "olive",
    "blackwood",
    "camphor",
    "purpleheart",
    "zebrawood",
];

/// Pad material markers recognised in variant titles.
pub const PAD_MARKERS: &[&str] = &["velour", "leather", "suede", "lambskin", "hybrid", "pads"];

/// Cable markers recognised in variant titles.
pub const CABLE_MARKERS: &[&str] = &["cable", "xlr", "4.4", "balanced", "single ended"];

/// Housing material markers recognised in variant titles.
pub const MATERIAL_MARKERS: &[&str] = &["aluminum", "aluminium", "magnesium", "titanium", "stabilized"];

/// A free-text name/value pair attached to a line item at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemProperty {
    pub name: String,
    pub value: String,
}

/// Build specifications derived from a line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItemSpecs {
    pub wood_type: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub pad_type: Option<String>,
    pub cable_type: Option<String>,
    pub custom_engraving: Option<String>,
    pub product_category: Option<ProductCategory>,
    pub requires_assembly: bool,
    pub requires_custom_work: bool,
}

fn property_value<'a>(properties: &'a [LineItemProperty], keys: &[&str]) -> Option<&'a str> {
    properties
        .iter()
        .find(|p| {
            let name = p.name.to_lowercase();
            keys.iter().any(|k| name.contains(k))
        })
        .map(|p| p.value.trim())
        .filter(|v| !v.is_empty())
}

fn segment_matching<'a>(segments: &[&'a str], markers: &[&str]) -> Option<&'a str> {
    segments.iter().copied().find(|seg| {
        let lc = seg.to_lowercase();
        markers.iter().any(|m| lc.contains(m))
    })
}

/// Derive [`LineItemSpecs`] for a line item of the given category.
///
/// Headphones and electronics require assembly. Custom work is required when
/// an engraving is requested or any property name mentions "custom".
pub fn parse_line_item_specs(
    variant_title: Option<&str>,
    properties: &[LineItemProperty],
    category: ProductCategory,
) -> LineItemSpecs {
    let segments: Vec<&str> = variant_title
        .unwrap_or_default()
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let from_props = |keys: &[&str]| property_value(properties, keys).map(str::to_string);
    let from_variant = |markers: &[&str]| segment_matching(&segments, markers).map(str::to_string);

    let wood_type = from_props(&["wood"]).or_else(|| from_variant(KNOWN_WOODS));
    let material = from_props(&["material"]).or_else(|| from_variant(MATERIAL_MARKERS));
    let color = from_props(&["color", "colour"]);
    let pad_type = from_props(&["pad"]).or_else(|| from_variant(PAD_MARKERS));
    let cable_type = from_props(&["cable"]).or_else(|| from_variant(CABLE_MARKERS));
    let custom_engraving = from_props(&["engraving", "engrave"]);

    let mentions_custom = properties
        .iter()
        .any(|p| p.name.to_lowercase().contains("custom") && !p.value.trim().is_empty());

    LineItemSpecs {
        requires_assembly: matches!(
            category,
            ProductCategory::Headphone | ProductCategory::Electronics
        ),
        requires_custom_work: custom_engraving.is_some() || mentions_custom,
        wood_type,
        material,
        color,
        pad_type,
        cable_type,
        custom_engraving,
        product_category: Some(category),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(name: &str, value: &str) -> LineItemProperty {
        LineItemProperty {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn variant_segments_fill_specs() {
        let specs = parse_line_item_specs(
            Some("Cherry / Velour Pads / Balanced XLR Cable"),
            &[],
            ProductCategory::Headphone,
        );
        assert_eq!(specs.wood_type.as_deref(), Some("Cherry"));
        assert_eq!(specs.pad_type.as_deref(), Some("Velour Pads"));
        assert_eq!(specs.cable_type.as_deref(), Some("Balanced XLR Cable"));
        assert!(specs.requires_assembly);
        assert!(!specs.requires_custom_work);
        assert_eq!(specs.product_category, Some(ProductCategory::Headphone));
    }

    #[test]
    fn properties_override_variant() {
        let specs = parse_line_item_specs(
            Some("Cherry / Leather Pads"),
            &[prop("Wood Type", "Cocobolo"), prop("Color", "Natural")],
            ProductCategory::Headphone,
        );
        assert_eq!(specs.wood_type.as_deref(), Some("Cocobolo"));
        assert_eq!(specs.color.as_deref(), Some("Natural"));
        assert_eq!(specs.pad_type.as_deref(), Some("Leather Pads"));
    }

    #[test]
    fn engraving_requires_custom_work() {
        let specs = parse_line_item_specs(
            None,
            &[prop("Engraving", "For Sam")],
            ProductCategory::Headphone,
        );
        assert_eq!(specs.custom_engraving.as_deref(), Some("For Sam"));
        assert!(specs.requires_custom_work);
    }

    #[test]
    fn blank_engraving_is_ignored() {
        let specs = parse_line_item_specs(None, &[prop("Engraving", "  ")], ProductCategory::Other);
        assert_eq!(specs.custom_engraving, None);
        assert!(!specs.requires_custom_work);
    }

    #[test]
    fn custom_property_requires_custom_work() {
        let specs = parse_line_item_specs(
            None,
            &[prop("Custom Request", "Gold grille")],
            ProductCategory::Headphone,
        );
        assert!(specs.requires_custom_work);
    }

    #[test]
    fn accessories_do_not_require_assembly() {
        let specs = parse_line_item_specs(Some("Lambskin"), &[], ProductCategory::Accessory);
        assert!(!specs.requires_assembly);
        assert_eq!(specs.pad_type.as_deref(), Some("Lambskin"));
    }

    #[test]
    fn empty_inputs_yield_empty_specs() {
        let specs = parse_line_item_specs(None, &[], ProductCategory::Other);
        assert_eq!(specs.wood_type, None);
        assert_eq!(specs.material, None);
        assert_eq!(specs.cable_type, None);
        assert!(!specs.requires_assembly);
    }
}
