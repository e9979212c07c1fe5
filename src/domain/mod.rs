//! Domain types and models

mod catalog;
mod mockup;

pub use catalog::{
    normalize_size, ProductVariants, StoreProduct, Template, VariantIdSet, VariantInfo,
};
pub use mockup::{
    MockupImage, MockupImageGroup, MockupStyle, MockupStyles, PrintAreaInfo, StyleGroup,
};
