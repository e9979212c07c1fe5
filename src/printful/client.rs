//! Printful API client
//!
//! One client instance owns the credential, the session caches and the
//! request policy: every network call is paced by the throttle, 429
//! responses retry a bounded number of times with a fixed backoff, and GET
//! responses land in the response cache under canonical keys. The catalog
//! operations on top convert failures into absence so a batch fetch keeps
//! going when a single product misbehaves.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use governor::{
    clock::DefaultClock, middleware::NoOpMiddleware, state::NotKeyed, Quota, RateLimiter,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::domain::{
    MockupImageGroup, MockupStyles, PrintAreaInfo, ProductVariants, StoreProduct, StyleGroup,
    Template, VariantIdSet, VariantInfo,
};
use crate::printful::cache::{self, SessionCache};
use crate::printful::error::{ClientError, ClientResult};
use crate::printful::models::{
    CatalogVariantDetail, ImageGroupItem, PrintfulResponse, StoreProductDetail,
    StoreProductSummary, StyleGroupItem, TaskCreated, TemplateItem, UploadedFile,
};
use crate::printful::pagination;
use crate::printful::task::{PollOutcome, TaskPoller};
use crate::printful::transport::{HttpTransport, Transport};

/// Page size for template listings
pub const TEMPLATE_PAGE_LIMIT: u32 = 100;
/// Page size for style listings
pub const STYLE_PAGE_LIMIT: u32 = 100;
/// Page size for image listings
pub const IMAGE_PAGE_LIMIT: u32 = 20;

// ============================================================================
// Credential Check
// ============================================================================

/// Outcome of probing the API with the configured credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialCheck {
    /// The API accepted the token
    Valid,
    /// The token is missing or the API rejected it
    Invalid,
    /// The API could not be reached or answered outside the known statuses
    Unreachable,
}

impl fmt::Display for CredentialCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CredentialCheck::Valid => "valid",
            CredentialCheck::Invalid => "invalid",
            CredentialCheck::Unreachable => "unreachable",
        };
        write!(f, "{}", label)
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct PrintfulClient {
    /// HTTP transport; swapped for a scripted one in tests
    transport: Arc<dyn Transport>,

    /// Session caches, dropped together with the client
    caches: SessionCache,

    /// Bearer token; `None` means every probe reports `Invalid`
    access_token: Option<String>,

    /// API root without a trailing slash
    base_url: String,

    /// Request pacing; `None` when the configured delay is zero
    limiter: Option<RateLimiter<NotKeyed, governor::state::InMemoryState, DefaultClock, NoOpMiddleware>>,

    /// Fixed wait after a 429 response
    rate_limit_backoff: Duration,

    /// How many times a 429 response may be retried
    max_rate_limit_retries: u32,

    /// Wait between mockup task status reads
    poll_interval: Duration,

    /// Status read budget per mockup task
    poll_max_attempts: u32,
}

impl PrintfulClient {
    pub fn new(settings: &Settings) -> Self {
        Self::with_transport(settings, Arc::new(HttpTransport::new()))
    }

    pub fn with_transport(settings: &Settings, transport: Arc<dyn Transport>) -> Self {
        let limiter = Quota::with_period(Duration::from_millis(settings.throttle.request_delay_ms))
            .map(RateLimiter::direct);

        PrintfulClient {
            transport,
            caches: SessionCache::new(),
            access_token: settings
                .api
                .access_token
                .clone()
                .filter(|token| !token.is_empty()),
            base_url: settings.api.base_url.trim_end_matches('/').to_string(),
            limiter,
            rate_limit_backoff: Duration::from_secs(settings.throttle.rate_limit_backoff_secs),
            max_rate_limit_retries: settings.throttle.max_rate_limit_retries,
            poll_interval: Duration::from_secs(settings.polling.interval_secs),
            poll_max_attempts: settings.polling.max_attempts,
        }
    }

    /// Swap the credential. Everything cached under the old credential is
    /// dropped before the new one takes effect, so a failed clear never
    /// leaves mixed-credential state behind.
    pub async fn set_access_token(&mut self, access_token: Option<String>) {
        self.caches.clear_all().await;
        self.access_token = access_token.filter(|token| !token.is_empty());
        info!("Access token replaced, session caches cleared");
    }

    /// Empty all six cache categories
    pub async fn clear_cache(&self) {
        self.caches.clear_all().await;
        info!("Session caches cleared");
    }

    // ========================================================================
    // Credential Validation
    // ========================================================================

    /// Probe `/store/products` with the configured token.
    ///
    /// The probe bypasses the response cache and never retries; a throttled
    /// or failing API reports `Unreachable` rather than blocking startup.
    pub async fn validate_credential(&self) -> CredentialCheck {
        let Some(token) = self.access_token.as_deref() else {
            warn!("No access token configured");
            return CredentialCheck::Invalid;
        };

        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        let url = self.url_for("/store/products", &[]);
        match self.transport.get(&url, Some(token)).await {
            Ok(response) => match response.status {
                200 => CredentialCheck::Valid,
                401 | 403 => {
                    warn!(status = response.status, "Access token rejected");
                    CredentialCheck::Invalid
                }
                status => {
                    warn!(status = status, "Credential probe got unexpected status");
                    CredentialCheck::Unreachable
                }
            },
            Err(err) => {
                warn!(error = %err, "Credential probe failed");
                CredentialCheck::Unreachable
            }
        }
    }

    // ========================================================================
    // Request Layer
    // ========================================================================

    /// Cached GET. Concurrent calls for the same key share one network
    /// fetch; errors are logged and surface as `None` without being cached.
    pub async fn request(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        force_refresh: bool,
    ) -> Option<Value> {
        let key = cache::response_key(endpoint, params);

        if force_refresh {
            match self.send_raw(endpoint, params, None).await {
                Ok(value) => {
                    self.caches.responses.insert(key, value.clone()).await;
                    Some(value)
                }
                Err(err) => {
                    warn!(endpoint = %endpoint, error = %err, "Request failed");
                    None
                }
            }
        } else {
            self.caches
                .responses
                .optionally_get_with(key, async {
                    match self.send_raw(endpoint, params, None).await {
                        Ok(value) => Some(value),
                        Err(err) => {
                            warn!(endpoint = %endpoint, error = %err, "Request failed");
                            None
                        }
                    }
                })
                .await
        }
    }

    /// Uncached POST through the same throttle and retry policy as GET
    pub async fn post(&self, endpoint: &str, body: &Value) -> Option<Value> {
        match self.send_raw(endpoint, &[], Some(body)).await {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(endpoint = %endpoint, error = %err, "POST failed");
                None
            }
        }
    }

    /// One throttled exchange with bounded 429 retries
    async fn send_raw(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        body: Option<&Value>,
    ) -> ClientResult<Value> {
        let url = self.url_for(endpoint, params);
        let mut attempts: u32 = 0;

        loop {
            if let Some(limiter) = &self.limiter {
                limiter.until_ready().await;
            }

            let response = match body {
                Some(body) => self.transport.post(&url, self.token(), body).await?,
                None => self.transport.get(&url, self.token()).await?,
            };

            match response.status {
                200 => return serde_json::from_str(&response.body).map_err(ClientError::from),
                201 if body.is_some() => {
                    return serde_json::from_str(&response.body).map_err(ClientError::from)
                }
                429 => {
                    attempts += 1;
                    if attempts > self.max_rate_limit_retries {
                        return Err(ClientError::RateLimited { attempts });
                    }
                    warn!(
                        endpoint = %endpoint,
                        attempt = attempts,
                        backoff_secs = self.rate_limit_backoff.as_secs(),
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(self.rate_limit_backoff).await;
                }
                401 | 403 => return Err(ClientError::Auth(body_preview(&response.body))),
                status => {
                    return Err(ClientError::Api {
                        status,
                        message: body_preview(&response.body),
                    })
                }
            }
        }
    }

    fn token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    fn url_for(&self, endpoint: &str, params: &[(String, String)]) -> String {
        let query = cache::canonical_query(params);
        if query.is_empty() {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.base_url, endpoint, query)
        }
    }

    // ========================================================================
    // Store Products
    // ========================================================================

    /// All store products with their catalog product IDs resolved.
    ///
    /// A product whose detail cannot be fetched or parsed is kept without a
    /// catalog ID; a failed listing yields an empty result.
    pub async fn fetch_store_products(&self, force_refresh: bool) -> Vec<StoreProduct> {
        let Some(listing) = self.request("/store/products", &[], force_refresh).await else {
            error!("Failed to fetch store products");
            return Vec::new();
        };
        let summaries: Vec<StoreProductSummary> = match parse_result(listing) {
            Ok(summaries) => summaries,
            Err(err) => {
                error!(error = %err, "Unexpected store product listing shape");
                return Vec::new();
            }
        };

        let mut products = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let endpoint = format!("/store/products/{}", summary.id);
            let mut catalog_product_id = None;
            if let Some(detail) = self.request(&endpoint, &[], force_refresh).await {
                match parse_result::<StoreProductDetail>(detail) {
                    Ok(detail) => {
                        catalog_product_id = detail
                            .sync_variants
                            .first()
                            .and_then(|variant| variant.product.product_id);
                    }
                    Err(err) => {
                        warn!(product_id = summary.id, error = %err, "Unexpected product detail shape")
                    }
                }
            }
            if catalog_product_id.is_none() {
                warn!(product_id = summary.id, "Could not resolve catalog product ID");
            }
            products.push(StoreProduct {
                id: summary.id,
                name: summary.name,
                catalog_product_id,
            });
        }
        products
    }

    // ========================================================================
    // Variants
    // ========================================================================

    /// Resolve all variants of a store product, with catalog size, color and
    /// stock detail. Fields of variants whose detail call fails degrade to
    /// empty defaults; the category comes from the first variant that
    /// resolves. The result is cached even when no variant resolved.
    pub async fn get_product_variants(
        &self,
        product_id: i64,
        force_refresh: bool,
    ) -> ProductVariants {
        let key = product_id.to_string();
        if !force_refresh {
            if let Some(cached) = self.caches.variants.get(&key).await {
                return cached;
            }
        }

        let mut variants = Vec::new();
        let mut main_category_id = None;
        let mut category_title = String::new();

        let endpoint = format!("/store/products/{}", product_id);
        if let Some(detail) = self.request(&endpoint, &[], force_refresh).await {
            match parse_result::<StoreProductDetail>(detail) {
                Ok(detail) => {
                    for sync_variant in detail.sync_variants {
                        let Some(catalog_variant_id) = sync_variant.product.variant_id else {
                            warn!(
                                product_id = product_id,
                                "Sync variant without catalog variant ID, skipping"
                            );
                            continue;
                        };

                        let mut info = VariantInfo {
                            catalog_variant_id,
                            size: String::new(),
                            color_code: String::new(),
                            in_stock: false,
                        };
                        let variant_endpoint = format!("/products/variant/{}", catalog_variant_id);
                        if let Some(variant_detail) =
                            self.request(&variant_endpoint, &[], force_refresh).await
                        {
                            match parse_result::<CatalogVariantDetail>(variant_detail) {
                                Ok(resolved) => {
                                    info.size = resolved.variant.size.unwrap_or_default();
                                    info.color_code =
                                        resolved.variant.color_code.unwrap_or_default();
                                    info.in_stock = resolved.variant.in_stock.unwrap_or(false);
                                    if main_category_id.is_none() {
                                        main_category_id = resolved.product.main_category_id;
                                        category_title =
                                            resolved.product.product_type.unwrap_or_default();
                                    }
                                }
                                Err(err) => warn!(
                                    catalog_variant_id = catalog_variant_id,
                                    error = %err,
                                    "Unexpected variant detail shape"
                                ),
                            }
                        }
                        variants.push(info);
                    }
                }
                Err(err) => {
                    warn!(product_id = product_id, error = %err, "Unexpected product detail shape")
                }
            }
        }

        let resolved = ProductVariants {
            variants,
            main_category_id,
            category_title,
        };
        debug!(
            product_id = product_id,
            variants = resolved.variants.len(),
            category = %resolved.category_title,
            "Variants resolved"
        );
        self.caches.variants.insert(key, resolved.clone()).await;
        resolved
    }

    // ========================================================================
    // Templates
    // ========================================================================

    /// Printing templates of a catalog product, filtered to the templates
    /// that apply to at least one of the given variants and deduplicated by
    /// image URL (first occurrence wins). Empty results are returned but
    /// never cached.
    pub async fn get_catalog_variant_templates(
        &self,
        catalog_product_id: i64,
        variant_ids: &VariantIdSet,
        force_refresh: bool,
    ) -> Vec<Template> {
        if variant_ids.is_empty() {
            return Vec::new();
        }
        let key = cache::template_key(catalog_product_id, variant_ids);
        if !force_refresh {
            if let Some(cached) = self.caches.templates.get(&key).await {
                return cached;
            }
        }

        let endpoint = format!("/v2/catalog-products/{}/mockup-templates", catalog_product_id);
        let items: Vec<TemplateItem> =
            pagination::collect_paged(self, &endpoint, &[], TEMPLATE_PAGE_LIMIT, force_refresh)
                .await;

        let mut templates: Vec<Template> = Vec::new();
        let mut seen_urls: HashSet<String> = HashSet::new();
        for item in items {
            if !variant_ids.intersects(&item.catalog_variant_ids) {
                continue;
            }
            let template = Template::from(item);
            if seen_urls.insert(template.image_url.clone()) {
                templates.push(template);
            }
        }

        if templates.is_empty() {
            debug!(
                catalog_product_id = catalog_product_id,
                "No templates matched, cache left untouched"
            );
        } else {
            self.caches.templates.insert(key, templates.clone()).await;
        }
        templates
    }

    // ========================================================================
    // Mockup Styles & Images
    // ========================================================================

    /// Style listing of a catalog product. Print-area metadata comes from
    /// the first group of the fully accumulated listing; an empty listing
    /// yields `None` and is never cached.
    pub async fn get_mockup_styles(
        &self,
        catalog_product_id: i64,
        force_refresh: bool,
    ) -> Option<MockupStyles> {
        let key = cache::style_key(catalog_product_id);
        if !force_refresh {
            if let Some(cached) = self.caches.styles.get(&key).await {
                return Some(cached);
            }
        }

        let endpoint = format!("/v2/catalog-products/{}/mockup-styles", catalog_product_id);
        let items: Vec<StyleGroupItem> =
            pagination::collect_paged(self, &endpoint, &[], STYLE_PAGE_LIMIT, force_refresh).await;
        if items.is_empty() {
            return None;
        }

        let groups: Vec<StyleGroup> = items.into_iter().map(StyleGroup::from).collect();
        let print_area = PrintAreaInfo::from_groups(&groups);
        let listing = MockupStyles { groups, print_area };
        self.caches.styles.insert(key, listing.clone()).await;
        Some(listing)
    }

    /// Mockup images of one style, grouped per variant. Empty results are
    /// returned but never cached.
    pub async fn get_mockup_images(
        &self,
        catalog_product_id: i64,
        style_id: i64,
        force_refresh: bool,
    ) -> Vec<MockupImageGroup> {
        let key = cache::image_key(catalog_product_id, style_id);
        if !force_refresh {
            if let Some(cached) = self.caches.images.get(&key).await {
                return cached;
            }
        }

        let endpoint = format!("/v2/catalog-products/{}/images", catalog_product_id);
        let params = vec![("mockup_style_ids".to_string(), style_id.to_string())];
        let items: Vec<ImageGroupItem> =
            pagination::collect_paged(self, &endpoint, &params, IMAGE_PAGE_LIMIT, force_refresh)
                .await;

        let groups: Vec<MockupImageGroup> = items.into_iter().map(MockupImageGroup::from).collect();
        if !groups.is_empty() {
            self.caches.images.insert(key, groups.clone()).await;
        }
        groups
    }

    // ========================================================================
    // File Upload & Mockup Generation
    // ========================================================================

    /// Upload raw design bytes as a base64 payload
    pub async fn upload_file(&self, file_data: &[u8]) -> Option<UploadedFile> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(file_data);
        let body = json!({ "file": encoded });
        let response = self.post("/files", &body).await?;
        match parse_result::<UploadedFile>(response) {
            Ok(file) => {
                info!(file_id = file.id, "Design file uploaded");
                Some(file)
            }
            Err(err) => {
                warn!(error = %err, "Unexpected upload response shape");
                None
            }
        }
    }

    /// Generate a mockup for one variant and placement from an uploaded
    /// file. Returns the full completed task payload; only completed
    /// payloads are cached, so a timed out or failed task is retried from
    /// scratch on the next call.
    pub async fn generate_mockup(
        &self,
        product_id: i64,
        variant_id: i64,
        placement: &str,
        uploaded_file_id: i64,
    ) -> Option<Value> {
        let key = cache::mockup_key(product_id, variant_id, placement, uploaded_file_id);
        if let Some(cached) = self.caches.mockups.get(&key).await {
            debug!(key = %key, "Serving generated mockup from cache");
            return Some(cached);
        }

        let body = json!({
            "variant_ids": [variant_id],
            "format": "png",
            "files": [{
                "placement": placement,
                "image_url": format!("{}/files/{}", self.base_url, uploaded_file_id),
            }],
        });
        let created = self.post("/mockup-generator/create-task", &body).await?;
        let task_key = match parse_result::<TaskCreated>(created) {
            Ok(TaskCreated {
                task_key: Some(task_key),
            }) => task_key,
            Ok(TaskCreated { task_key: None }) => {
                error!("Task creation response carried no task key");
                return None;
            }
            Err(err) => {
                error!(error = %err, "Unexpected task creation response");
                return None;
            }
        };

        info!(task_key = %task_key, "Mockup task created, polling");
        match self.run_mockup_task(&task_key).await {
            Ok(payload) => {
                self.caches.mockups.insert(key, payload.clone()).await;
                Some(payload)
            }
            Err(err) => {
                error!(task_key = %task_key, error = %err, "Mockup generation did not complete");
                None
            }
        }
    }

    /// Poll a task until it completes, fails or runs out of attempts. The
    /// first read happens immediately; the poll interval only separates
    /// consecutive reads. Status reads bypass the response cache so the
    /// observed status can actually change between reads.
    async fn run_mockup_task(&self, task_key: &str) -> ClientResult<Value> {
        let params = vec![("task_key".to_string(), task_key.to_string())];
        let mut poller = TaskPoller::new(self.poll_max_attempts);

        loop {
            let payload = match self.send_raw("/mockup-generator/task", &params, None).await {
                Ok(value) => Some(value),
                Err(err) => {
                    debug!(task_key = %task_key, error = %err, "Task status read failed");
                    None
                }
            };
            let status = payload
                .as_ref()
                .and_then(|value| value.pointer("/result/status"))
                .and_then(Value::as_str);

            match poller.observe(status) {
                PollOutcome::Completed => {
                    info!(task_key = %task_key, attempts = poller.attempts(), "Mockup task completed");
                    // a completed status was read out of this payload
                    return payload
                        .ok_or_else(|| ClientError::TaskFailed(task_key.to_string()));
                }
                PollOutcome::Failed => return Err(ClientError::TaskFailed(task_key.to_string())),
                PollOutcome::TimedOut => {
                    return Err(ClientError::TaskTimedOut {
                        attempts: poller.attempts(),
                    })
                }
                PollOutcome::Continue => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Unwrap the `result` of a v1 envelope
fn parse_result<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    let envelope: PrintfulResponse<T> = serde_json::from_value(value)?;
    Ok(envelope.result)
}

fn body_preview(body: &str) -> String {
    body.chars().take(500).collect()
}


#[cfg(test)]
mod tests {
    use super::testing::{envelope, test_client, test_settings};
    use super::*;
    use crate::printful::transport::testing::FakeTransport;

    #[tokio::test(start_paused = true)]
    async fn test_cached_request_hits_network_once() {
        let (transport, client) = test_client();
        transport.stub("GET", "/store/products", 200, envelope(json!([])));

        let first = client.request("/store/products", &[], false).await;
        let second = client.request("/store/products", &[], false).await;

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(transport.total_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_share_one_fetch() {
        let (transport, client) = test_client();
        transport.stub("GET", "/store/products", 200, envelope(json!([])));

        let (a, b) = tokio::join!(
            client.request("/store/products", &[], false),
            client.request("/store/products", &[], false)
        );

        assert!(a.is_some() && b.is_some());
        assert_eq!(transport.total_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_refresh_overwrites_cache() {
        let (transport, client) = test_client();
        transport.stub("GET", "/store/products", 200, envelope(json!({ "n": 1 })));
        transport.stub("GET", "/store/products", 200, envelope(json!({ "n": 2 })));

        let first = client.request("/store/products", &[], false).await;
        let forced = client.request("/store/products", &[], true).await;
        let cached = client.request("/store/products", &[], false).await;

        assert_ne!(first, forced);
        assert_eq!(forced, cached);
        assert_eq!(transport.total_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_params_share_cache_entry_in_any_order() {
        let (transport, client) = test_client();
        transport.stub("GET", "/v2/x?limit=10&offset=0", 200, envelope(json!([])));

        let a = vec![
            ("offset".to_string(), "0".to_string()),
            ("limit".to_string(), "10".to_string()),
        ];
        let b = vec![
            ("limit".to_string(), "10".to_string()),
            ("offset".to_string(), "0".to_string()),
        ];
        client.request("/v2/x", &a, false).await;
        client.request("/v2/x", &b, false).await;

        assert_eq!(transport.total_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_request_is_not_cached() {
        let (transport, client) = test_client();
        transport.stub("GET", "/store/products", 500, json!({ "error": "boom" }));
        transport.stub("GET", "/store/products", 200, envelope(json!([])));

        assert!(client.request("/store/products", &[], false).await.is_none());
        assert!(client.request("/store/products", &[], false).await.is_some());
        assert_eq!(transport.total_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_request_retries_then_succeeds() {
        let (transport, client) = test_client();
        transport.stub("GET", "/store/products", 429, json!({}));
        transport.stub("GET", "/store/products", 200, envelope(json!([])));

        let value = client.request("/store/products", &[], false).await;

        assert!(value.is_some());
        assert_eq!(transport.total_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retries_are_bounded() {
        let (transport, client) = test_client();
        transport.stub("GET", "/store/products", 429, json!({}));

        let value = client.request("/store/products", &[], false).await;

        assert!(value.is_none());
        // initial attempt plus the three configured retries
        assert_eq!(transport.total_calls(), 4);
    }

    #[tokio::test]
    async fn test_throttle_paces_consecutive_requests() {
        let mut settings = test_settings();
        settings.throttle.request_delay_ms = 25;
        let transport = Arc::new(FakeTransport::new());
        let client = PrintfulClient::with_transport(&settings, transport.clone());
        transport.stub("GET", "/store/products", 200, envelope(json!([])));

        let start = std::time::Instant::now();
        client.request("/store/products", &[], true).await;
        client.request("/store/products", &[], true).await;

        assert!(start.elapsed() >= Duration::from_millis(25));
        assert_eq!(transport.total_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_validate_credential_accepts_valid_token() {
        let (transport, client) = test_client();
        transport.stub("GET", "/store/products", 200, envelope(json!([])));

        assert_eq!(client.validate_credential().await, CredentialCheck::Valid);
        assert_eq!(transport.calls()[0].token.as_deref(), Some("test-token"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_validate_credential_rejects_bad_token() {
        let (transport, client) = test_client();
        transport.stub("GET", "/store/products", 401, json!({ "error": "nope" }));

        assert_eq!(client.validate_credential().await, CredentialCheck::Invalid);
    }

    #[tokio::test(start_paused = true)]
    async fn test_validate_credential_unreachable_on_server_error() {
        let (transport, client) = test_client();
        transport.stub("GET", "/store/products", 500, json!({}));

        assert_eq!(
            client.validate_credential().await,
            CredentialCheck::Unreachable
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_validate_credential_unreachable_on_connection_error() {
        let (transport, client) = test_client();
        transport.stub_connection_error("GET", "/store/products", "connection refused");

        assert_eq!(
            client.validate_credential().await,
            CredentialCheck::Unreachable
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_validate_credential_invalid_without_token() {
        let transport = Arc::new(FakeTransport::new());
        let mut settings = test_settings();
        settings.api.access_token = None;
        let client = PrintfulClient::with_transport(&settings, transport.clone());

        assert_eq!(client.validate_credential().await, CredentialCheck::Invalid);
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_validate_probe_bypasses_response_cache() {
        let (transport, client) = test_client();
        transport.stub("GET", "/store/products", 200, envelope(json!([])));

        client.request("/store/products", &[], false).await;
        client.validate_credential().await;

        assert_eq!(transport.total_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_products_resolve_catalog_ids() {
        let (transport, client) = test_client();
        transport.stub(
            "GET",
            "/store/products",
            200,
            envelope(json!([
                { "id": 12, "name": "Classic Tee" },
                { "id": 13, "name": "Poster" }
            ])),
        );
        transport.stub(
            "GET",
            "/store/products/12",
            200,
            envelope(json!({
                "sync_variants": [{ "product": { "product_id": 71, "variant_id": 4012 } }]
            })),
        );
        transport.stub(
            "GET",
            "/store/products/13",
            200,
            envelope(json!({ "sync_variants": [] })),
        );

        let products = client.fetch_store_products(false).await;

        assert_eq!(products.len(), 2);
        assert_eq!(
            products[0],
            StoreProduct {
                id: 12,
                name: "Classic Tee".to_string(),
                catalog_product_id: Some(71),
            }
        );
        assert_eq!(products[1].catalog_product_id, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_products_listing_failure_is_empty() {
        let (transport, client) = test_client();
        transport.stub("GET", "/store/products", 500, json!({}));

        let products = client.fetch_store_products(false).await;

        assert!(products.is_empty());
        assert_eq!(transport.total_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_variant_resolution_degrades_missing_detail() {
        let (transport, client) = test_client();
        transport.stub(
            "GET",
            "/store/products/12",
            200,
            envelope(json!({
                "sync_variants": [
                    { "product": { "product_id": 71, "variant_id": 4012 } },
                    { "product": { "product_id": 71, "variant_id": 4013 } }
                ]
            })),
        );
        transport.stub(
            "GET",
            "/products/variant/4012",
            200,
            envelope(json!({
                "variant": { "size": "M", "color_code": "#ffffff", "in_stock": true },
                "product": { "main_category_id": 24, "type": "T-Shirt" }
            })),
        );
        // detail for 4013 is not stubbed and answers 404

        let resolved = client.get_product_variants(12, false).await;

        assert_eq!(resolved.variants.len(), 2);
        assert_eq!(resolved.variants[0].size, "M");
        assert!(resolved.variants[0].in_stock);
        assert_eq!(resolved.variants[1].size, "");
        assert_eq!(resolved.variants[1].color_code, "");
        assert!(!resolved.variants[1].in_stock);
        assert_eq!(resolved.main_category_id, Some(24));
        assert_eq!(resolved.category_title, "T-Shirt");
    }

    #[tokio::test(start_paused = true)]
    async fn test_variants_cached_even_when_empty() {
        let (transport, client) = test_client();
        // nothing stubbed, so the detail request fails

        let first = client.get_product_variants(99, false).await;
        assert!(first.variants.is_empty());

        let calls = transport.total_calls();
        let second = client.get_product_variants(99, false).await;

        assert_eq!(first, second);
        assert_eq!(transport.total_calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_template_filter_keeps_matching_and_unique() {
        let (transport, client) = test_client();
        transport.stub(
            "GET",
            "/v2/catalog-products/71/mockup-templates?limit=100&offset=0",
            200,
            json!({ "data": [
                { "catalog_variant_ids": [1, 2], "placement": "front", "image_url": "urlX" },
                { "catalog_variant_ids": [2, 3], "placement": "front", "image_url": "urlX" },
                { "catalog_variant_ids": [4],    "placement": "front", "image_url": "urlY" },
                { "catalog_variant_ids": [2],    "placement": "back",  "image_url": "urlZ" }
            ] }),
        );

        let templates = client
            .get_catalog_variant_templates(71, &VariantIdSet::new(vec![2]), false)
            .await;

        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].image_url, "urlX");
        assert_eq!(templates[0].catalog_variant_ids, vec![1, 2]);
        assert_eq!(templates[1].image_url, "urlZ");
    }

    fn template_page(start: i64, count: i64) -> Value {
        let data: Vec<Value> = (start..start + count)
            .map(|n| {
                json!({
                    "catalog_variant_ids": [2],
                    "placement": "front",
                    "image_url": format!("https://img.example/{}", n),
                })
            })
            .collect();
        json!({ "data": data })
    }

    #[tokio::test(start_paused = true)]
    async fn test_template_pages_accumulate_until_short_page() {
        let (transport, client) = test_client();
        let base = "/v2/catalog-products/71/mockup-templates?limit=100&offset=";
        transport.stub("GET", &format!("{}0", base), 200, template_page(0, 100));
        transport.stub("GET", &format!("{}100", base), 200, template_page(100, 100));
        transport.stub("GET", &format!("{}200", base), 200, template_page(200, 43));

        let templates = client
            .get_catalog_variant_templates(71, &VariantIdSet::new(vec![2]), false)
            .await;

        assert_eq!(templates.len(), 243);
        assert_eq!(transport.total_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_templates_cached_by_canonical_variant_set() {
        let (transport, client) = test_client();
        transport.stub(
            "GET",
            "/v2/catalog-products/71/mockup-templates?limit=100&offset=0",
            200,
            template_page(0, 1),
        );

        let a = client
            .get_catalog_variant_templates(71, &VariantIdSet::new(vec![2, 1]), false)
            .await;
        let calls = transport.total_calls();
        let b = client
            .get_catalog_variant_templates(71, &"1, 2".parse().unwrap(), false)
            .await;

        assert_eq!(a, b);
        assert_eq!(transport.total_calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_template_result_not_cached() {
        let (transport, client) = test_client();
        transport.stub(
            "GET",
            "/v2/catalog-products/71/mockup-templates?limit=100&offset=0",
            200,
            json!({ "data": [] }),
        );

        let ids = VariantIdSet::new(vec![2]);
        assert!(client
            .get_catalog_variant_templates(71, &ids, false)
            .await
            .is_empty());
        client.get_catalog_variant_templates(71, &ids, false).await;

        assert_eq!(transport.calls_to("mockup-templates"), 2);
    }

    fn style_group(dpi: i64, style_id: i64) -> Value {
        json!({
            "print_area_width": 1200,
            "print_area_height": 1600,
            "dpi": dpi,
            "print_area_type": "simple",
            "technique": "dtg",
            "mockup_styles": [
                { "id": style_id, "category_name": "Flat", "view_name": "Front" }
            ]
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_mockup_styles_metadata_from_first_group() {
        let (transport, client) = test_client();
        let first_page: Vec<Value> = (0..100).map(|n| style_group(150, n)).collect();
        transport.stub(
            "GET",
            "/v2/catalog-products/71/mockup-styles?limit=100&offset=0",
            200,
            json!({ "data": first_page }),
        );
        transport.stub(
            "GET",
            "/v2/catalog-products/71/mockup-styles?limit=100&offset=100",
            200,
            json!({ "data": [style_group(300, 200)] }),
        );

        let listing = client.get_mockup_styles(71, false).await.unwrap();

        assert_eq!(listing.groups.len(), 101);
        // metadata comes from the first group even with later pages present
        assert_eq!(listing.print_area.dpi, Some(150));
        assert_eq!(listing.print_area.technique.as_deref(), Some("dtg"));

        client.get_mockup_styles(71, false).await;
        assert_eq!(transport.calls_to("mockup-styles"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_styles_are_none_and_not_cached() {
        let (transport, client) = test_client();
        // unstubbed listing answers 404

        assert!(client.get_mockup_styles(71, false).await.is_none());
        assert!(client.get_mockup_styles(71, false).await.is_none());

        assert_eq!(transport.calls_to("mockup-styles"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mockup_images_keyed_per_style() {
        let (transport, client) = test_client();
        transport.stub(
            "GET",
            "/v2/catalog-products/71/images?limit=20&mockup_style_ids=5&offset=0",
            200,
            json!({ "data": [{
                "catalog_variant_id": 4012,
                "color": "White",
                "images": [{ "placement": "front", "image_url": "https://img.example/m5" }]
            }] }),
        );
        transport.stub(
            "GET",
            "/v2/catalog-products/71/images?limit=20&mockup_style_ids=6&offset=0",
            200,
            json!({ "data": [{
                "catalog_variant_id": 4012,
                "color": "White",
                "images": [{ "placement": "back", "image_url": "https://img.example/m6" }]
            }] }),
        );

        let five = client.get_mockup_images(71, 5, false).await;
        client.get_mockup_images(71, 5, false).await;
        let six = client.get_mockup_images(71, 6, false).await;

        assert_eq!(five.len(), 1);
        assert_eq!(five[0].images[0].image_url.as_deref(), Some("https://img.example/m5"));
        assert_eq!(six[0].images[0].placement.as_deref(), Some("back"));
        assert_eq!(transport.calls_to("/images"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_file_sends_base64_payload() {
        let (transport, client) = test_client();
        transport.stub("POST", "/files", 200, envelope(json!({ "id": 77 })));

        let uploaded = client.upload_file(b"design-bytes").await.unwrap();

        assert_eq!(uploaded.id, 77);
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        let expected = base64::engine::general_purpose::STANDARD.encode(b"design-bytes");
        assert_eq!(calls[0].body.as_ref().unwrap()["file"], json!(expected));
    }

    #[tokio::test(start_paused = true)]
    async fn test_post_accepts_created_status() {
        let (transport, client) = test_client();
        transport.stub("POST", "/files", 201, envelope(json!({ "id": 1 })));

        assert!(client.post("/files", &json!({ "file": "x" })).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_mockup_polls_until_completed() {
        let (transport, client) = test_client();
        transport.stub(
            "POST",
            "/mockup-generator/create-task",
            200,
            envelope(json!({ "task_key": "tk1" })),
        );
        let status_path = "/mockup-generator/task?task_key=tk1";
        for _ in 0..5 {
            transport.stub("GET", status_path, 200, envelope(json!({ "status": "pending" })));
        }
        transport.stub(
            "GET",
            status_path,
            200,
            envelope(json!({
                "status": "completed",
                "mockups": [{ "placement": "front", "mockup_url": "https://img.example/done" }]
            })),
        );

        let payload = client.generate_mockup(12, 4012, "front", 77).await.unwrap();

        assert_eq!(
            payload.pointer("/result/status").and_then(Value::as_str),
            Some("completed")
        );
        assert_eq!(transport.calls_to("/mockup-generator/task"), 6);

        // the completed payload is served from cache from now on
        let again = client.generate_mockup(12, 4012, "front", 77).await.unwrap();
        assert_eq!(again, payload);
        assert_eq!(transport.calls_to("create-task"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_mockup_timeout_caches_nothing() {
        let (transport, client) = test_client();
        transport.stub(
            "POST",
            "/mockup-generator/create-task",
            200,
            envelope(json!({ "task_key": "tk2" })),
        );
        transport.stub(
            "GET",
            "/mockup-generator/task?task_key=tk2",
            200,
            envelope(json!({ "status": "pending" })),
        );

        let result = client.generate_mockup(12, 4012, "front", 77).await;

        assert!(result.is_none());
        assert_eq!(transport.calls_to("task_key=tk2"), 30);
        client.caches.mockups.run_pending_tasks().await;
        assert_eq!(client.caches.mockups.entry_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_mockup_stops_on_failed_task() {
        let (transport, client) = test_client();
        transport.stub(
            "POST",
            "/mockup-generator/create-task",
            200,
            envelope(json!({ "task_key": "tk3" })),
        );
        transport.stub(
            "GET",
            "/mockup-generator/task?task_key=tk3",
            200,
            envelope(json!({ "status": "failed" })),
        );

        assert!(client.generate_mockup(12, 4012, "front", 77).await.is_none());
        assert_eq!(transport.calls_to("task_key=tk3"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_access_token_clears_caches() {
        let (transport, mut client) = test_client();
        transport.stub("GET", "/store/products", 200, envelope(json!([])));

        client.request("/store/products", &[], false).await;
        assert_eq!(transport.total_calls(), 1);

        client.set_access_token(Some("other".to_string())).await;
        client.request("/store/products", &[], false).await;

        assert_eq!(transport.total_calls(), 2);
        assert_eq!(transport.calls()[1].token.as_deref(), Some("other"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cache_forces_refetch() {
        let (transport, client) = test_client();
        transport.stub("GET", "/store/products", 200, envelope(json!([])));

        client.request("/store/products", &[], false).await;
        client.clear_cache().await;
        client.request("/store/products", &[], false).await;

        assert_eq!(transport.total_calls(), 2);
    }
}
