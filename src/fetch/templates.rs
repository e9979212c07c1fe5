//! Template fetch flow
//!
//! For each store product this flow resolves the variants, fetches the
//! matching printing templates, picks a placement and produces export
//! records. A product normally yields one record; when its template images
//! differ per variant, it yields one record per variant instead. Products
//! that cannot be processed are skipped with a warning, never aborting the
//! run.

use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::domain::{normalize_size, ProductVariants, StoreProduct, Template, VariantInfo};
use crate::export::{ExportRecord, NamedImage, RecordKind};
use crate::fetch::images::ImageSource;
use crate::fetch::{FetchProgress, ProgressCallback};
use crate::printful::PrintfulClient;

/// Options of one template fetch run
#[derive(Debug, Clone, Default)]
pub struct TemplateFetchOptions {
    /// Placement to export; "front" is preferred when nothing is requested
    pub placement: Option<String>,

    /// Bypass session caches for every lookup of this run
    pub force_refresh: bool,
}

pub struct TemplateFetcher<'a> {
    client: &'a PrintfulClient,
    images: &'a dyn ImageSource,
    options: TemplateFetchOptions,
    on_progress: Option<ProgressCallback>,
}

impl<'a> TemplateFetcher<'a> {
    pub fn new(client: &'a PrintfulClient, images: &'a dyn ImageSource) -> Self {
        TemplateFetcher {
            client,
            images,
            options: TemplateFetchOptions::default(),
            on_progress: None,
        }
    }

    pub fn with_options(mut self, options: TemplateFetchOptions) -> Self {
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

            let resolved = self
                .client
                .get_product_variants(product.id, self.options.force_refresh)
                .await;
            if resolved.variants.is_empty() {
                warn!(product = %product.name, "No variants resolved, skipping");
                continue;
            }

            let variant_ids = resolved.catalog_variant_ids();
            debug!(
                product = %product.name,
                variants = variant_ids.len(),
                "Resolving templates"
            );
            let templates = self
                .client
                .get_catalog_variant_templates(
                    catalog_product_id,
                    &variant_ids,
                    self.options.force_refresh,
                )
                .await;
            if templates.is_empty() {
                warn!(product = %product.name, "No templates for product, skipping");
                continue;
            }

            let placements: BTreeSet<&str> =
                templates.iter().filter_map(|t| t.placement.as_deref()).collect();
            let Some(placement) = select_placement(&placements, self.options.placement.as_deref())
            else {
                warn!(product = %product.name, "Templates carry no placements, skipping");
                continue;
            };
            if let Some(requested) = self.options.placement.as_deref() {
                if requested != placement {
                    warn!(
                        product = %product.name,
                        requested = %requested,
                        using = %placement,
                        "Requested placement not offered"
                    );
                }
            }
            let placement = placement.to_string();

            let filtered: Vec<&Template> = templates
                .iter()
                .filter(|t| t.placement.as_deref() == Some(placement.as_str()))
                .collect();
            if filtered.is_empty() {
                warn!(product = %product.name, placement = %placement, "No templates for placement, skipping");
                continue;
            }

            let grouping = TemplateGrouping::build(&filtered, &resolved.variants);

            if grouping.different_urls {
                // template images differ: one record per variant, each using
                // the first template that covers it
                for variant in &resolved.variants {
                    let Some(&template_index) = grouping
                        .first_template_by_variant
                        .get(&variant.catalog_variant_id)
                    else {
                        continue;
                    };
                    let template = filtered[template_index];
                    if template.image_url.is_empty() {
                        continue;
                    }
                    let Some(image) = self.images.fetch_image(&template.image_url).await else {
                        warn!(
                            variant_id = variant.catalog_variant_id,
                            "Template image download failed, skipping variant"
                        );
                        continue;
                    };
                    records.push(variant_record(
                        product,
                        catalog_product_id,
                        &placement,
                        &resolved,
                        variant,
                        template,
                        grouping.vary_by_size,
                        image,
                    ));
                }
            } else {
                let template = filtered[0];
                if template.image_url.is_empty() {
                    warn!(product = %product.name, "Template carries no image URL, skipping");
                    continue;
                }
                let label = grouping.label_for(template, 1, &resolved.variants);
                let Some(image) = self.images.fetch_image(&template.image_url).await else {
                    warn!(product = %product.name, "Template image download failed, skipping");
                    continue;
                };
                records.push(product_record(
                    product,
                    catalog_product_id,
                    &placement,
                    &resolved,
                    template,
                    &label,
                    grouping.vary_by_size,
                    image,
                ));
            }
        }

        info!(records = records.len(), "Template fetch finished");
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
// Placement Selection
// ============================================================================

/// Pick the placement to export: the requested one when offered, otherwise
/// "front", otherwise the first offered placement in sorted order
fn select_placement<'p>(
    placements: &BTreeSet<&'p str>,
    requested: Option<&str>,
) -> Option<&'p str> {
    if let Some(requested) = requested {
        if let Some(found) = placements.get(requested) {
            return Some(*found);
        }
    }
    if let Some(front) = placements.get("front") {
        return Some(*front);
    }
    placements.iter().next().copied()
}

// ============================================================================
// Template Grouping
// ============================================================================

/// How the filtered templates of one product relate to its variants
struct TemplateGrouping {
    /// Templates cover differing size sets
    vary_by_size: bool,

    /// More than one distinct template image URL
    different_urls: bool,

    /// First template index covering each catalog variant
    first_template_by_variant: HashMap<i64, usize>,

    /// Techniques per template image URL, in first-seen order
    techniques_by_url: HashMap<String, Vec<String>>,
}

impl TemplateGrouping {
    fn build(templates: &[&Template], variants: &[VariantInfo]) -> Self {
        let mut size_keys: HashSet<Vec<String>> = HashSet::new();
        let mut first_template_by_variant: HashMap<i64, usize> = HashMap::new();
        let mut techniques_by_url: HashMap<String, Vec<String>> = HashMap::new();
        let mut urls: HashSet<&str> = HashSet::new();

        for (index, template) in templates.iter().enumerate() {
            let mut sizes: BTreeSet<String> = BTreeSet::new();
            for variant in variants {
                if template
                    .catalog_variant_ids
                    .contains(&variant.catalog_variant_id)
                {
                    sizes.insert(variant.size.clone());
                    first_template_by_variant
                        .entry(variant.catalog_variant_id)
                        .or_insert(index);
                }
            }
            size_keys.insert(sizes.into_iter().collect());

            let technique = template
                .technique
                .clone()
                .unwrap_or_else(|| "Unknown".to_string());
            let entry = techniques_by_url
                .entry(template.image_url.clone())
                .or_default();
            if !entry.contains(&technique) {
                entry.push(technique);
            }
            urls.insert(template.image_url.as_str());
        }

        TemplateGrouping {
            vary_by_size: size_keys.len() > 1,
            different_urls: urls.len() > 1,
            first_template_by_variant,
            techniques_by_url,
        }
    }

    /// Label in the form "Template 1 (Sizes: S, M) [Techniques: dtg]"
    fn label_for(&self, template: &Template, position: usize, variants: &[VariantInfo]) -> String {
        let mut sizes: Vec<&str> = Vec::new();
        for variant in variants {
            if template
                .catalog_variant_ids
                .contains(&variant.catalog_variant_id)
                && !sizes.contains(&variant.size.as_str())
            {
                sizes.push(variant.size.as_str());
            }
        }
        let techniques = self
            .techniques_by_url
            .get(&template.image_url)
            .cloned()
            .unwrap_or_else(|| vec!["Unknown".to_string()]);

        let mut label = format!("Template {}", position);
        if !sizes.is_empty() {
            label.push_str(&format!(" (Sizes: {})", sizes.join(", ")));
        }
        if !techniques.is_empty() {
            label.push_str(&format!(" [Techniques: {}]", techniques.join(", ")));
        }
        label
    }
}

// ============================================================================
// Record Builders
// ============================================================================

fn raw_variants(variants: &[VariantInfo]) -> Value {
    serde_json::to_value(variants).unwrap_or_default()
}

fn merge_template_info(document: &mut Value, template: &Template) {
    if let Some(map) = document.as_object_mut() {
        map.insert(
            "technique".to_string(),
            json!(template.technique.clone().unwrap_or_default()),
        );
        map.insert("template_width".to_string(), json!(template.template_width));
        map.insert(
            "template_height".to_string(),
            json!(template.template_height),
        );
        map.insert(
            "print_area_width".to_string(),
            json!(template.print_area_width),
        );
        map.insert(
            "print_area_height".to_string(),
            json!(template.print_area_height),
        );
        map.insert("print_area_top".to_string(), json!(template.print_area_top));
        map.insert(
            "print_area_left".to_string(),
            json!(template.print_area_left),
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn product_record(
    product: &StoreProduct,
    catalog_product_id: i64,
    placement: &str,
    resolved: &ProductVariants,
    template: &Template,
    label: &str,
    vary_by_size: bool,
    image: Arc<Vec<u8>>,
) -> ExportRecord {
    let mut document = json!({
        "product_id": product.id,
        "catalog_product_id": catalog_product_id,
        "name": product.name,
        "placement": placement,
        "template": label,
        "template_url": template.image_url,
        "main_category_id": resolved.main_category_id,
        "category_title": resolved.category_title,
        "variants": raw_variants(&resolved.variants),
        "templates_vary_by_size": vary_by_size,
    });
    merge_template_info(&mut document, template);

    ExportRecord {
        kind: RecordKind::Template,
        catalog_product_id,
        placement: placement.to_string(),
        document,
        image: Some(image),
        extras: Vec::new(),
    }
}

#[allow(clippy::too_many_arguments)]
fn variant_record(
    product: &StoreProduct,
    catalog_product_id: i64,
    placement: &str,
    resolved: &ProductVariants,
    variant: &VariantInfo,
    template: &Template,
    vary_by_size: bool,
    image: Arc<Vec<u8>>,
) -> ExportRecord {
    let mut document = json!({
        "product_id": product.id,
        "catalog_product_id": catalog_product_id,
        "name": product.name,
        "placement": placement,
        "variant_id": variant.catalog_variant_id,
        "variant_size": normalize_size(&variant.size),
        "variant_color": variant.color_code,
        "template_url": template.image_url,
        "main_category_id": resolved.main_category_id,
        "category_title": resolved.category_title,
        "templates_vary_by_size": vary_by_size,
    });
    merge_template_info(&mut document, template);

    // colliding primary names keep only the first variant's image, so each
    // variant's template also rides along under its own name
    let extras = vec![NamedImage::new(
        format!("template_{}.png", variant.catalog_variant_id),
        image.clone(),
    )];

    ExportRecord {
        kind: RecordKind::Template,
        catalog_product_id,
        placement: placement.to_string(),
        document,
        image: Some(image),
        extras,
    }
}
