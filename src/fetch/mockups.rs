//! Mockup fetch flow
//!
//! For each store product this flow picks a mockup style, takes the first
//! rendered image the style offers and produces one export record carrying
//! the style naming, the print-area metadata and the resolved variants.
//! Products that cannot be processed are skipped with a warning.

use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::domain::{
    normalize_size, MockupImageGroup, MockupStyle, MockupStyles, ProductVariants, StoreProduct,
};
use crate::export::{ExportRecord, RecordKind};
use crate::fetch::images::ImageSource;
use crate::fetch::{FetchProgress, ProgressCallback};
use crate::printful::PrintfulClient;

/// Options of one mockup fetch run
#[derive(Debug, Clone, Default)]
pub struct MockupFetchOptions {
    /// Style to export; the first listed style is used when missing
    pub style_id: Option<i64>,

    /// Bypass session caches for every lookup of this run
    pub force_refresh: bool,
}

pub struct MockupFetcher<'a> {
    client: &'a PrintfulClient,
    images: &'a dyn ImageSource,
    options: MockupFetchOptions,
    on_progress: Option<ProgressCallback>,
}

impl<'a> MockupFetcher<'a> {
    pub fn new(client: &'a PrintfulClient, images: &'a dyn ImageSource) -> Self {
        MockupFetcher {
            client,
            images,
            options: MockupFetchOptions::default(),
            on_progress: None,
        }
    }

    pub fn with_options(mut self, options: MockupFetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    #[instrument(skip(self, products))]
    pub async fn run(&self, products: &[StoreProduct]) -> Vec<ExportRecord> {
        let mut records = Vec::new();
        let total = products.len();

        for (index, product) in products.iter().enumerate() {
            self.report(index, total, product);

            let Some(catalog_product_id) = product.catalog_product_id else {
                warn!(product = %product.name, "No catalog product ID, skipping");
                continue;
            };

            let Some(listing) = self
                .client
                .get_mockup_styles(catalog_product_id, self.options.force_refresh)
                .await
            else {
                warn!(product = %product.name, "No mockup styles, skipping");
                continue;
            };
            let styles = listing.all_styles();
            let Some(style) = select_style(&styles, self.options.style_id) else {
                warn!(product = %product.name, "Style listing carries no styles, skipping");
                continue;
            };
            if let Some(requested) = self.options.style_id {
                if requested != style.style_id {
                    warn!(
                        product = %product.name,
                        requested = requested,
                        using = style.style_id,
                        "Requested style not offered, using first"
                    );
                }
            }

            let groups = self
                .client
                .get_mockup_images(catalog_product_id, style.style_id, self.options.force_refresh)
                .await;
            let Some(rendered) = first_rendered(&groups) else {
                warn!(
                    product = %product.name,
                    style_id = style.style_id,
                    "No rendered mockup image, skipping"
                );
                continue;
            };
            debug!(
                catalog_variant_id = ?rendered.group.catalog_variant_id,
                color = rendered.group.color.as_deref().unwrap_or("Unknown"),
                "Mockup image selected"
            );
            let placement = rendered
                .placement
                .filter(|p| !p.is_empty())
                .unwrap_or("front")
                .to_string();

            let resolved = self
                .client
                .get_product_variants(product.id, self.options.force_refresh)
                .await;

            let Some(image) = self.images.fetch_image(rendered.url).await else {
                warn!(product = %product.name, "Mockup image download failed, skipping");
                continue;
            };

            records.push(ExportRecord {
                kind: RecordKind::Mockup,
                catalog_product_id,
                placement: placement.clone(),
                document: mockup_document(
                    product,
                    catalog_product_id,
                    &placement,
                    style,
                    &listing,
                    rendered.url,
                    &resolved,
                ),
                image: Some(image),
                extras: Vec::new(),
            });
        }

        info!(records = records.len(), "Mockup fetch finished");
        records
    }

    fn report(&self, index: usize, total: usize, product: &StoreProduct) {
        if let Some(on_progress) = &self.on_progress {
            on_progress(&FetchProgress {
                index,
                total,
                product_name: product.name.clone(),
            });
        }
    }
}

// ============================================================================
// Style & Image Selection
// ============================================================================

/// Pick the style to render: the requested one when listed, otherwise the
/// first listed style
fn select_style<'s>(
    styles: &[&'s MockupStyle],
    requested: Option<i64>,
) -> Option<&'s MockupStyle> {
    if let Some(requested) = requested {
        let found = styles
            .iter()
            .find(|style| style.style_id == requested)
            .copied();
        if found.is_some() {
            return found;
        }
    }
    styles.first().copied()
}

/// The first image across the groups that actually carries a URL
struct RenderedImage<'g> {
    group: &'g MockupImageGroup,
    placement: Option<&'g str>,
    url: &'g str,
}

fn first_rendered(groups: &[MockupImageGroup]) -> Option<RenderedImage<'_>> {
    for group in groups {
        for image in &group.images {
            if let Some(url) = image.image_url.as_deref() {
                if !url.is_empty() {
                    return Some(RenderedImage {
                        group,
                        placement: image.placement.as_deref(),
                        url,
                    });
                }
            }
        }
    }
    None
}

// ============================================================================
// Record Builder
// ============================================================================

fn mockup_document(
    product: &StoreProduct,
    catalog_product_id: i64,
    placement: &str,
    style: &MockupStyle,
    listing: &MockupStyles,
    mockup_url: &str,
    resolved: &ProductVariants,
) -> Value {
    let variants: Vec<Value> = resolved
        .variants
        .iter()
        .map(|variant| {
            json!({
                "catalog_variant_id": variant.catalog_variant_id,
                "size": normalize_size(&variant.size),
                "color_code": variant.color_code,
                "in_stock": variant.in_stock,
            })
        })
        .collect();

    json!({
        "product_id": product.id,
        "catalog_product_id": catalog_product_id,
        "name": product.name,
        "placement": placement,
        "main_category_id": resolved.main_category_id,
        "category_title": resolved.category_title,
        "technique": listing.print_area.technique,
        "dpi": listing.print_area.dpi,
        "print_area_width": listing.print_area.print_area_width,
        "print_area_height": listing.print_area.print_area_height,
        "print_area_type": listing.print_area.print_area_type,
        "mockup_name": style.label(),
        "mockup_url": mockup_url,
        "variants": variants,
        "variant_ids_restricted": style.restricted_to_variants.clone().unwrap_or_default(),
    })
}
