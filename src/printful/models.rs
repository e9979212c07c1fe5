//! Printful API wire models
//!
//! Deserialization targets for the v1 (`/store`, `/products`, `/files`,
//! `/mockup-generator`) and v2 (`/v2/catalog-products`) endpoints, plus the
//! conversions into the domain models. Fields the API may omit are optional
//! here and degrade to defaults during conversion instead of failing the
//! response.

use serde::Deserialize;

use crate::domain::{
    MockupImage, MockupImageGroup, MockupStyle, StyleGroup, Template,
};

// ============================================================================
// Response Envelopes
// ============================================================================

/// v1 envelope: `{"code": 200, "result": ...}`
#[derive(Debug, Deserialize)]
pub struct PrintfulResponse<T> {
    pub code: i32,
    pub result: T,
}

/// v2 envelope: `{"data": [...], "paging": {...}}`
#[derive(Debug, Deserialize)]
pub struct PagedResponse<T> {
    pub data: Vec<T>,
}

// ============================================================================
// Store Products
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StoreProductSummary {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct StoreProductDetail {
    #[serde(default)]
    pub sync_variants: Vec<SyncVariant>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncVariant {
    #[serde(default)]
    pub product: SyncVariantProduct,
}

/// Catalog references carried by a sync variant
#[derive(Debug, Default, Deserialize)]
pub struct SyncVariantProduct {
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub variant_id: Option<i64>,
}

// ============================================================================
// Catalog Variants
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CatalogVariantDetail {
    #[serde(default)]
    pub variant: CatalogVariant,
    #[serde(default)]
    pub product: CatalogProductInfo,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogVariant {
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color_code: Option<String>,
    #[serde(default)]
    pub in_stock: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogProductInfo {
    #[serde(default)]
    pub main_category_id: Option<i64>,
    #[serde(default, rename = "type")]
    pub product_type: Option<String>,
}

// ============================================================================
// Templates (v2)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TemplateItem {
    #[serde(default)]
    pub catalog_variant_ids: Vec<i64>,
    #[serde(default)]
    pub placement: Option<String>,
    #[serde(default)]
    pub technique: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub template_width: Option<i64>,
    #[serde(default)]
    pub template_height: Option<i64>,
    #[serde(default)]
    pub print_area_width: Option<i64>,
    #[serde(default)]
    pub print_area_height: Option<i64>,
    #[serde(default)]
    pub print_area_top: Option<i64>,
    #[serde(default)]
    pub print_area_left: Option<i64>,
}

impl From<TemplateItem> for Template {
    fn from(item: TemplateItem) -> Self {
        Template {
            catalog_variant_ids: item.catalog_variant_ids,
            placement: item.placement,
            technique: item.technique,
            image_url: item.image_url.unwrap_or_default(),
            template_width: item.template_width.unwrap_or_default(),
            template_height: item.template_height.unwrap_or_default(),
            print_area_width: item.print_area_width.unwrap_or_default(),
            print_area_height: item.print_area_height.unwrap_or_default(),
            print_area_top: item.print_area_top.unwrap_or_default(),
            print_area_left: item.print_area_left.unwrap_or_default(),
        }
    }
}

// ============================================================================
// Mockup Styles (v2)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StyleGroupItem {
    #[serde(default)]
    pub print_area_width: Option<i64>,
    #[serde(default)]
    pub print_area_height: Option<i64>,
    #[serde(default)]
    pub dpi: Option<i64>,
    #[serde(default)]
    pub print_area_type: Option<String>,
    #[serde(default)]
    pub technique: Option<String>,
    #[serde(default)]
    pub mockup_styles: Vec<StyleItem>,
}

#[derive(Debug, Deserialize)]
pub struct StyleItem {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub view_name: Option<String>,
    #[serde(default)]
    pub restricted_to_variants: Option<Vec<i64>>,
}

impl From<StyleGroupItem> for StyleGroup {
    fn from(item: StyleGroupItem) -> Self {
        // styles without an ID cannot be fetched further and are dropped
        let styles = item
            .mockup_styles
            .into_iter()
            .filter_map(|style| {
                Some(MockupStyle {
                    style_id: style.id?,
                    category_name: style.category_name.unwrap_or_else(|| "Unknown".to_string()),
                    view_name: style.view_name.unwrap_or_else(|| "Unknown".to_string()),
                    restricted_to_variants: style.restricted_to_variants,
                })
            })
            .collect();
        StyleGroup {
            print_area_width: item.print_area_width,
            print_area_height: item.print_area_height,
            dpi: item.dpi,
            print_area_type: item.print_area_type,
            technique: item.technique,
            styles,
        }
    }
}

// ============================================================================
// Mockup Images (v2)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ImageGroupItem {
    #[serde(default)]
    pub catalog_variant_id: Option<i64>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageItem>,
}

#[derive(Debug, Deserialize)]
pub struct ImageItem {
    #[serde(default)]
    pub placement: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<ImageGroupItem> for MockupImageGroup {
    fn from(item: ImageGroupItem) -> Self {
        MockupImageGroup {
            catalog_variant_id: item.catalog_variant_id,
            color: item.color,
            images: item
                .images
                .into_iter()
                .map(|image| MockupImage {
                    placement: image.placement,
                    image_url: image.image_url,
                })
                .collect(),
        }
    }
}

// ============================================================================
// Files & Mockup Tasks
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UploadedFile {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TaskCreated {
    #[serde(default)]
    pub task_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub mockups: Vec<TaskMockup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskMockup {
    #[serde(default)]
    pub placement: Option<String>,
    #[serde(default)]
    pub mockup_url: Option<String>,
    #[serde(default)]
    pub variant_ids: Vec<i64>,
}
