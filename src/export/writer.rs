//! Archive writing
//!
//! The writer turns an assembled bundle into one deflate-compressed zip
//! holding the manifest and every image. It is a trait so the CLI path and
//! tests can share the assembly step while writing to different targets.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::export::bundle::Bundle;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Manifest serialization failed: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Writes an assembled bundle somewhere durable
pub trait BundleWriter {
    /// Write the bundle into `dir`, creating it if needed, and return the
    /// path of the archive
    fn write_to_dir(&self, bundle: &Bundle, dir: &Path) -> Result<PathBuf, ExportError>;
}

/// One `{prefix}_{timestamp}.zip` per bundle
#[derive(Debug, Default)]
pub struct ZipBundleWriter;

impl ZipBundleWriter {
    /// Stream the bundle into any seekable target
    pub fn write_bundle<W: Write + Seek>(
        &self,
        bundle: &Bundle,
        target: W,
    ) -> Result<(), ExportError> {
        let mut archive = ZipWriter::new(target);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        archive.start_file(bundle.manifest_name(), options)?;
        archive.write_all(bundle.manifest_json()?.as_bytes())?;

        for image in &bundle.images {
            archive.start_file(image.name.as_str(), options)?;
            archive.write_all(&image.bytes)?;
        }

        archive.finish()?;
        Ok(())
    }
}

impl BundleWriter for ZipBundleWriter {
    fn write_to_dir(&self, bundle: &Bundle, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(bundle.archive_name());
        let file = File::create(&path)?;
        self.write_bundle(bundle, file)?;
        info!(
            path = %path.display(),
            documents = bundle.documents.len(),
            images = bundle.images.len(),
            "Bundle written"
        );
        Ok(path)
    }
}
