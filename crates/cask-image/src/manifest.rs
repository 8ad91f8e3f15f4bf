//! Image manifest decoding.
//!
//! Two manifest shapes carry a layer list:
//! - schema 1 (`fsLayers[].blobSum`), which lists layers top-most first
//! - schema 2 and OCI (`layers[].digest`), which list the base layer first
//!
//! Layers are kept in the order the registry sent them.

use cask_common::{CaskError, CaskResult};
use serde::Deserialize;

/// Media types sent in the `Accept` header of a manifest request.
///
/// Manifest list and OCI index types are absent. Registries that still
/// convert a multi-platform tag to a single manifest do so only when the
/// client does not accept lists.
pub const ACCEPTED_MEDIA_TYPES: &[&str] = &[
    "application/vnd.docker.distribution.manifest.v2+json",
    "application/vnd.oci.image.manifest.v1+json",
    "application/vnd.docker.distribution.manifest.v1+prettyjws",
    "application/vnd.docker.distribution.manifest.v1+json",
];

/// One layer of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDescriptor {
    /// Content digest (e.g. `sha256:...`).
    pub digest: String,
}

/// A decoded image manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Schema version the layer list was decoded from.
    pub schema_version: u32,
    /// Layers in registry order.
    pub layers: Vec<LayerDescriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    schema_version: Option<u32>,
    fs_layers: Option<Vec<RawFsLayer>>,
    layers: Option<Vec<RawDescriptor>>,
    manifests: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFsLayer {
    blob_sum: String,
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    digest: String,
}

impl Manifest {
    /// Decode a manifest response body.
    pub fn from_slice(body: &[u8]) -> CaskResult<Self> {
        let raw: RawManifest = serde_json::from_slice(body).map_err(|e| CaskError::Decode {
            what: "manifest",
            message: e.to_string(),
        })?;

        if let Some(fs_layers) = raw.fs_layers {
            return Ok(Self {
                schema_version: raw.schema_version.unwrap_or(1),
                layers: fs_layers
                    .into_iter()
                    .map(|l| LayerDescriptor { digest: l.blob_sum })
                    .collect(),
            });
        }

        if let Some(layers) = raw.layers {
            return Ok(Self {
                schema_version: raw.schema_version.unwrap_or(2),
                layers: layers
                    .into_iter()
                    .map(|l| LayerDescriptor { digest: l.digest })
                    .collect(),
            });
        }

        let message = if raw.manifests.is_some() {
            "multi-platform manifest lists are not supported".to_string()
        } else {
            "no layer list in manifest".to_string()
        };
        Err(CaskError::Decode {
            what: "manifest",
            message,
        })
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the manifest has no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer digests in registry order.
    pub fn digests(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|l| l.digest.as_str())
    }
}
