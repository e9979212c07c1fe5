//! Mockup Domain Models
//!
//! Mockup styles, per-style image groups and the print-area metadata the
//! Printful v2 catalog endpoints return alongside them.

use serde::{Deserialize, Serialize};

// ============================================================================
// Mockup Styles
// ============================================================================

/// A single selectable mockup style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockupStyle {
    /// Style ID, used to request the images of this style
    pub style_id: i64,

    /// Style category (e.g., "Flat", "On Person")
    pub category_name: String,

    /// View name within the category (e.g., "Front")
    pub view_name: String,

    /// Catalog variant IDs this style is restricted to, if any
    pub restricted_to_variants: Option<Vec<i64>>,
}

impl MockupStyle {
    /// Human-readable label, with a marker for restricted styles
    pub fn label(&self) -> String {
        let restricted = if self
            .restricted_to_variants
            .as_ref()
            .is_some_and(|ids| !ids.is_empty())
        {
            " (Restricted)"
        } else {
            ""
        };
        format!(
            "{} - {} (ID: {}){}",
            self.category_name, self.view_name, self.style_id, restricted
        )
    }
}

/// A group of mockup styles sharing one print area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleGroup {
    pub print_area_width: Option<i64>,
    pub print_area_height: Option<i64>,
    pub dpi: Option<i64>,
    pub print_area_type: Option<String>,
    pub technique: Option<String>,

    /// The styles of this group
    pub styles: Vec<MockupStyle>,
}

// ============================================================================
// Print Area Metadata
// ============================================================================

/// Print-area metadata attached to a style listing
///
/// The API reports these per group; the listing-level values are taken from
/// the first group of the first page, with later groups ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintAreaInfo {
    pub print_area_width: Option<i64>,
    pub print_area_height: Option<i64>,
    pub dpi: Option<i64>,
    pub print_area_type: Option<String>,
    pub technique: Option<String>,
}

impl PrintAreaInfo {
    /// Derive listing-level metadata from fully accumulated groups
    pub fn from_groups(groups: &[StyleGroup]) -> Self {
        match groups.first() {
            Some(group) => PrintAreaInfo {
                print_area_width: group.print_area_width,
                print_area_height: group.print_area_height,
                dpi: group.dpi,
                print_area_type: group.print_area_type.clone(),
                technique: group.technique.clone(),
            },
            None => PrintAreaInfo::default(),
        }
    }
}

/// The complete style listing of one catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockupStyles {
    /// All style groups, accumulated across pages
    pub groups: Vec<StyleGroup>,

    /// Metadata derived from the first group
    pub print_area: PrintAreaInfo,
}

impl MockupStyles {
    /// All styles across groups, flattened in listing order
    pub fn all_styles(&self) -> Vec<&MockupStyle> {
        self.groups.iter().flat_map(|g| g.styles.iter()).collect()
    }
}

// ============================================================================
// Mockup Images
// ============================================================================

/// One image of a mockup style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockupImage {
    /// Placement shown by this image
    pub placement: Option<String>,

    /// Rendered image URL
    pub image_url: Option<String>,
}

/// Mockup images grouped per catalog variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockupImageGroup {
    /// Catalog variant the group renders
    pub catalog_variant_id: Option<i64>,

    /// Variant color name
    pub color: Option<String>,

    /// Images of this variant
    pub images: Vec<MockupImage>,
}
