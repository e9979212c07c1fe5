//! Export bundles
//!
//! Assembly and archiving of fetch results: records pair a manifest
//! document with downloaded image bytes, bundles give both deterministic
//! names, and the writer ships them as one zip.

mod bundle;
mod writer;

pub use bundle::{Bundle, ExportRecord, NamedImage, RecordKind};
pub use writer::{BundleWriter, ExportError, ZipBundleWriter};
