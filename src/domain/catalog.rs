//! Catalog Domain Models
//!
//! This module defines the result models produced by the Printful client:
//! store products, resolved variants and printing templates. They are the
//! shapes the fetch flows and the export bundle consume, independent of the
//! wire format returned by the API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Store Products
// ============================================================================

/// A product in the connected store
///
/// `catalog_product_id` is resolved from the first sync variant of the
/// product detail. Products without variants keep `None` and are skipped by
/// the fetch flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreProduct {
    /// Store product ID
    pub id: i64,

    /// Product name as shown in the store
    pub name: String,

    /// Catalog product ID backing this store product
    pub catalog_product_id: Option<i64>,
}

// ============================================================================
// Variants
// ============================================================================

/// A resolved variant of a store product
///
/// Fields that could not be resolved degrade to their empty defaults rather
/// than failing the whole product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantInfo {
    /// Catalog variant ID (used for template matching and mockup tasks)
    pub catalog_variant_id: i64,

    /// Size label as returned by the catalog (e.g., "M", "10″×12″")
    pub size: String,

    /// Color hex code (e.g., "#FFFFFF")
    pub color_code: String,

    /// Is the variant currently in stock
    pub in_stock: bool,
}

/// All variants of a store product plus the category info shared by them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariants {
    /// Resolved variants, in sync-variant order
    pub variants: Vec<VariantInfo>,

    /// Main category ID, taken from the first variant that resolved
    pub main_category_id: Option<i64>,

    /// Category title (product type), taken together with the category ID
    pub category_title: String,
}

impl ProductVariants {
    /// Catalog variant IDs of all resolved variants
    pub fn catalog_variant_ids(&self) -> VariantIdSet {
        VariantIdSet::new(self.variants.iter().map(|v| v.catalog_variant_id))
    }
}

// ============================================================================
// Variant ID Sets
// ============================================================================

/// A normalized set of catalog variant IDs
///
/// Construction sorts and deduplicates, so two sets with the same members
/// always render to the same canonical string. Cache keys are derived from
/// that rendering, never from the raw caller input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantIdSet(Vec<i64>);

impl VariantIdSet {
    /// Build a set from any sequence of IDs
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        let mut ids: Vec<i64> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        VariantIdSet(ids)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Does any of the given IDs belong to this set
    pub fn intersects(&self, ids: &[i64]) -> bool {
        ids.iter().any(|id| self.contains(*id))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }
}

impl From<Vec<i64>> for VariantIdSet {
    fn from(ids: Vec<i64>) -> Self {
        VariantIdSet::new(ids)
    }
}

impl FromStr for VariantIdSet {
    type Err = std::num::ParseIntError;

    /// Parse a comma-delimited ID list (e.g., "4012, 4013,4014")
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let ids = raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(VariantIdSet::new(ids))
    }
}

impl fmt::Display for VariantIdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(|id| id.to_string()).collect();
        write!(f, "{}", rendered.join(","))
    }
}

// ============================================================================
// Printing Templates
// ============================================================================

/// A printing template for a catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Catalog variant IDs this template applies to
    pub catalog_variant_ids: Vec<i64>,

    /// Placement the template prints to (e.g., "front")
    pub placement: Option<String>,

    /// Printing technique (e.g., "dtg", "embroidery")
    pub technique: Option<String>,

    /// Template image URL; empty when the API did not provide one
    pub image_url: String,

    /// Full template dimensions in pixels
    pub template_width: i64,
    pub template_height: i64,

    /// Print area dimensions and position within the template
    pub print_area_width: i64,
    pub print_area_height: i64,
    pub print_area_top: i64,
    pub print_area_left: i64,
}

/// Normalize a catalog size label to plain ASCII
///
/// Size labels use U+2033 (double prime) for inches and U+00D7 for the
/// multiplication sign; downstream consumers expect "in" and "x".
pub fn normalize_size(size: &str) -> String {
    size.replace('\u{2033}', "in").replace('\u{00d7}', "x")
}
