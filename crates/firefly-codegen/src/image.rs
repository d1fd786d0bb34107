//! Declaration images
//!
//! Layout of an image:
//!
//! ```text
//! +--------+-------------+-------------------------------------+
//! | FFC\0  | version u16 | JSON {"sourceFile", "declaration"}  |
//! +--------+-------------+-------------------------------------+
//! ```
//!
//! The version is big-endian.

use firefly_core::declaration::TypeDeclaration;
use firefly_core::unit::Artifact;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::CodegenError;
use crate::{Backend, UnitMetadata};

pub const IMAGE_MAGIC: [u8; 4] = *b"FFC\0";
pub const IMAGE_VERSION: u16 = 1;
pub const IMAGE_EXTENSION: &str = "ffc";

const HEADER_LEN: usize = IMAGE_MAGIC.len() + 2;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagePayload<'a> {
    source_file: &'a str,
    declaration: &'a TypeDeclaration,
}

/// Contents of an image
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedImage {
    pub source_file: String,
    pub declaration: TypeDeclaration,
}

/// Emits one image per declared type
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageBackend;

impl ImageBackend {
    pub fn new() -> Self {
        Self
    }

    /// Output name of a type: `a/b/Name.ffc` for `a.b.Name`
    pub fn artifact_name(qualified_name: &str) -> String {
        format!("{}.{}", qualified_name.replace('.', "/"), IMAGE_EXTENSION)
    }
}

impl Backend for ImageBackend {
    fn generate(
        &self,
        declaration: &TypeDeclaration,
        metadata: &UnitMetadata,
    ) -> Result<Vec<Artifact>, CodegenError> {
        if declaration.qualified_name.is_empty()
            || declaration.qualified_name.split('.').any(str::is_empty)
        {
            return Err(CodegenError::InvalidDeclaration(format!(
                "'{}' is not a valid qualified name",
                declaration.qualified_name
            )));
        }

        let payload = ImagePayload {
            source_file: &metadata.source_file,
            declaration,
        };

        let mut bytes = Vec::with_capacity(256);
        bytes.extend_from_slice(&IMAGE_MAGIC);
        bytes.extend_from_slice(&IMAGE_VERSION.to_be_bytes());
        serde_json::to_writer(&mut bytes, &payload)?;

        trace!(
            "Generated image for {} ({} bytes)",
            declaration.qualified_name,
            bytes.len()
        );
        Ok(vec![Artifact {
            name: Self::artifact_name(&declaration.qualified_name),
            bytes,
        }])
    }
}

/// Read an image produced by [`ImageBackend`]
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, CodegenError> {
    if bytes.len() < HEADER_LEN {
        return Err(CodegenError::InvalidImage(format!(
            "image is {} bytes, shorter than its header",
            bytes.len()
        )));
    }
    if bytes[..IMAGE_MAGIC.len()] != IMAGE_MAGIC {
        return Err(CodegenError::InvalidImage("bad magic".to_string()));
    }

    let version = u16::from_be_bytes([bytes[4], bytes[5]]);
    if version != IMAGE_VERSION {
        return Err(CodegenError::UnsupportedVersion {
            found: version,
            expected: IMAGE_VERSION,
        });
    }

    Ok(serde_json::from_slice(&bytes[HEADER_LEN..])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use firefly_core::unit::UnitKind;

    #[test]
    fn test_header() {
        let declaration = TypeDeclaration::new("app.Main", UnitKind::Unit);
        let artifacts = ImageBackend
            .generate(&declaration, &UnitMetadata::new("Main.firefly"))
            .unwrap();

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name, "app/Main.ffc");
        assert_eq!(&artifacts[0].bytes[..4], b"FFC\0");
        assert_eq!(&artifacts[0].bytes[4..6], &[0, 1]);
    }

    #[test]
    fn test_rejects_bad_images() {
        assert!(matches!(decode_image(b"FF"), Err(CodegenError::InvalidImage(_))));
        assert!(matches!(
            decode_image(b"XYZ\0\0\x01{}"),
            Err(CodegenError::InvalidImage(_))
        ));
        assert!(matches!(
            decode_image(b"FFC\0\0\x09{}"),
            Err(CodegenError::UnsupportedVersion { found: 9, .. })
        ));
        assert!(matches!(decode_image(b"FFC\0\0\x01{"), Err(CodegenError::Json(_))));
    }

    #[test]
    fn test_rejects_invalid_names() {
        let declaration = TypeDeclaration::new("app..Main", UnitKind::Unit);
        assert!(matches!(
            ImageBackend.generate(&declaration, &UnitMetadata::new("Main.firefly")),
            Err(CodegenError::InvalidDeclaration(_))
        ));
    }
}
