//! Code generation backends for the Firefly compiler
//!
//! A [`Backend`] turns the declaration tree of one unit into binary
//! artifacts. [`ImageBackend`] is the reference backend: it writes a
//! self-describing image of the declaration per type.

pub mod error;
pub mod image;

use std::fs;
use std::path::{Path, PathBuf};

use firefly_core::declaration::TypeDeclaration;
use firefly_core::unit::{Artifact, CompilationUnit};
use tracing::debug;

pub use error::CodegenError;
pub use image::{decode_image, DecodedImage, ImageBackend, IMAGE_EXTENSION, IMAGE_MAGIC, IMAGE_VERSION};

/// Per-unit information handed to a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMetadata {
    /// File name of the unit the declaration came from
    pub source_file: String,
}

impl UnitMetadata {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
        }
    }

    pub fn for_unit(unit: &CompilationUnit) -> Self {
        Self::new(unit.file_name.clone())
    }
}

/// Turns a declaration tree into binary artifacts
pub trait Backend: Send + Sync {
    fn generate(
        &self,
        declaration: &TypeDeclaration,
        metadata: &UnitMetadata,
    ) -> Result<Vec<Artifact>, CodegenError>;
}

/// Write artifacts under `dir`, creating directories as needed
///
/// Returns the written paths in artifact order.
pub fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>, CodegenError> {
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let relative = Path::new(&artifact.name);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(CodegenError::InvalidImage(format!(
                "artifact name '{}' escapes the output directory",
                artifact.name
            )));
        }

        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &artifact.bytes)?;
        debug!("Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
        written.push(path);
    }
    Ok(written)
}
