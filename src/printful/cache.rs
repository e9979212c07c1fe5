//! Session caches
//!
//! Six independent categories, all scoped to one client instance: raw GET
//! responses, resolved variants, template lists, style listings, image
//! listings and generated mockups. Keys are canonical strings so that
//! logically equal requests always land on the same entry. `clear_all`
//! empties every category or none; there is no partial clear.

use moka::future::Cache;
use serde_json::Value;

use crate::domain::{
    MockupImageGroup, MockupStyles, ProductVariants, Template, VariantIdSet,
};

// ============================================================================
// Cache Keys
// ============================================================================

/// Canonical query rendering: parameters sorted by key, then by value
pub fn canonical_query(params: &[(String, String)]) -> String {
    let mut pairs: Vec<&(String, String)> = params.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Key for the raw response cache
pub fn response_key(endpoint: &str, params: &[(String, String)]) -> String {
    let query = canonical_query(params);
    if query.is_empty() {
        endpoint.to_string()
    } else {
        format!("{}?{}", endpoint, query)
    }
}

/// Key for the template cache; variant IDs are canonical by construction
pub fn template_key(catalog_product_id: i64, variant_ids: &VariantIdSet) -> String {
    format!("{}_{}", catalog_product_id, variant_ids)
}

pub fn style_key(catalog_product_id: i64) -> String {
    format!("mockup_styles_{}", catalog_product_id)
}

pub fn image_key(catalog_product_id: i64, style_id: i64) -> String {
    format!("mockup_images_{}_{}", catalog_product_id, style_id)
}

pub fn mockup_key(product_id: i64, variant_id: i64, placement: &str, file_id: i64) -> String {
    format!("mockup_{}_{}_{}_{}", product_id, variant_id, placement, file_id)
}

// ============================================================================
// Session Cache
// ============================================================================

pub struct SessionCache {
    /// Raw GET responses, keyed by endpoint plus canonical query
    pub responses: Cache<String, Value>,
    /// Resolved variants, keyed by store product ID
    pub variants: Cache<String, ProductVariants>,
    /// Filtered template lists, keyed by catalog product and variant set
    pub templates: Cache<String, Vec<Template>>,
    /// Style listings, keyed by catalog product
    pub styles: Cache<String, MockupStyles>,
    /// Image listings, keyed by catalog product and style
    pub images: Cache<String, Vec<MockupImageGroup>>,
    /// Generated mockup payloads, keyed by the full generation request
    pub mockups: Cache<String, Value>,
}

impl SessionCache {
    pub fn new() -> Self {
        SessionCache {
            responses: Cache::builder().build(),
            variants: Cache::builder().build(),
            templates: Cache::builder().build(),
            styles: Cache::builder().build(),
            images: Cache::builder().build(),
            mockups: Cache::builder().build(),
        }
    }

    /// Drop every entry in every category
    pub async fn clear_all(&self) {
        self.responses.invalidate_all();
        self.variants.invalidate_all();
        self.templates.invalidate_all();
        self.styles.invalidate_all();
        self.images.invalidate_all();
        self.mockups.invalidate_all();

        self.responses.run_pending_tasks().await;
        self.variants.run_pending_tasks().await;
        self.templates.run_pending_tasks().await;
        self.styles.run_pending_tasks().await;
        self.images.run_pending_tasks().await;
        self.mockups.run_pending_tasks().await;
    }

    #[cfg(test)]
    pub async fn total_entries(&self) -> u64 {
        self.responses.run_pending_tasks().await;
        self.variants.run_pending_tasks().await;
        self.templates.run_pending_tasks().await;
        self.styles.run_pending_tasks().await;
        self.images.run_pending_tasks().await;
        self.mockups.run_pending_tasks().await;

        self.responses.entry_count()
            + self.variants.entry_count()
            + self.templates.entry_count()
            + self.styles.entry_count()
            + self.images.entry_count()
            + self.mockups.entry_count()
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        SessionCache::new()
    }
}
