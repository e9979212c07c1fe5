//! Headless fetch flows
//!
//! The flows walk store products and turn them into export records: one
//! flow for printing templates, one for mockup previews. Both run entirely
//! on the client's cached operations and report per-product progress
//! through an optional callback.

mod images;
mod mockups;
mod templates;

pub use images::{ImageFetchError, ImageFetcher, ImageSource};
pub use mockups::{MockupFetchOptions, MockupFetcher};
pub use templates::{TemplateFetchOptions, TemplateFetcher};

#[cfg(test)]
pub(crate) use images::testing::FakeImages;

/// Progress of a fetch run, reported once per product
#[derive(Debug, Clone)]
pub struct FetchProgress {
    /// Zero-based position of the product being processed
    pub index: usize,
    /// Total number of products in this run
    pub total: usize,
    pub product_name: String,
}

/// Callback invoked before each product is processed
pub type ProgressCallback = Box<dyn Fn(&FetchProgress) + Send + Sync>;
