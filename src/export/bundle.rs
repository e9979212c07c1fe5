//! Bundle assembly
//!
//! A bundle is what one fetch run exports: a manifest of JSON documents
//! plus the images the run downloaded, each under a deterministic entry
//! name. Documents describe their images by URL; the bytes ride beside
//! them, so a manifest can never leak binary payloads.

use chrono::Local;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// What a record describes. The kind decides the image entry prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Template,
    Mockup,
}

impl RecordKind {
    fn prefix(self) -> &'static str {
        match self {
            RecordKind::Template => "template",
            RecordKind::Mockup => "mockup",
        }
    }
}

/// An image carried under an explicit archive entry name
#[derive(Debug, Clone, PartialEq)]
pub struct NamedImage {
    pub name: String,
    pub bytes: Arc<Vec<u8>>,
}

impl NamedImage {
    pub fn new(name: impl Into<String>, bytes: Arc<Vec<u8>>) -> Self {
        NamedImage {
            name: name.into(),
            bytes,
        }
    }
}

/// One gathered item: its manifest document plus the binary payloads held
/// beside it
#[derive(Debug, Clone)]
pub struct ExportRecord {
    pub kind: RecordKind,
    pub catalog_product_id: i64,
    pub placement: String,

    /// Manifest entry; carries image URLs, never image bytes
    pub document: Value,

    /// Primary image, stored under `image_filename()`
    pub image: Option<Arc<Vec<u8>>>,

    /// Additional images stored under their own names, such as the
    /// per-variant template images
    pub extras: Vec<NamedImage>,
}

impl ExportRecord {
    /// Archive entry name of the primary image
    pub fn image_filename(&self) -> String {
        format!(
            "{}_{}_{}.png",
            self.kind.prefix(),
            self.catalog_product_id,
            self.placement
        )
    }
}

/// An assembled export: manifest plus uniquely named images
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Shared stem of the manifest and archive names
    stem: String,

    /// Manifest documents in record order
    pub documents: Vec<Value>,

    /// Images in first-seen order; entry names are unique
    pub images: Vec<NamedImage>,
}

impl Bundle {
    /// Assemble a bundle stamped with the current local time
    pub fn assemble(records: &[ExportRecord], prefix: &str) -> Self {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        Bundle::assemble_with_timestamp(records, prefix, &timestamp)
    }

    /// Assemble under a fixed timestamp.
    ///
    /// Document order follows record order. Image entry names are
    /// deduplicated across the whole bundle; the first occurrence of a name
    /// wins and later ones are dropped.
    pub fn assemble_with_timestamp(
        records: &[ExportRecord],
        prefix: &str,
        timestamp: &str,
    ) -> Self {
        let mut documents = Vec::with_capacity(records.len());
        let mut images = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for record in records {
            documents.push(record.document.clone());

            if let Some(bytes) = &record.image {
                let name = record.image_filename();
                if seen.insert(name.clone()) {
                    images.push(NamedImage::new(name, bytes.clone()));
                }
            }
            for extra in &record.extras {
                if seen.insert(extra.name.clone()) {
                    images.push(extra.clone());
                }
            }
        }

        Bundle {
            stem: format!("{}_{}", prefix, timestamp),
            documents,
            images,
        }
    }

    pub fn manifest_name(&self) -> String {
        format!("{}.json", self.stem)
    }

    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.stem)
    }

    /// Pretty-printed manifest body
    pub fn manifest_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.documents)
    }
}
