use std::path::{Path, PathBuf};

use cask_common::{CaskError, CaskPaths, CaskResult};

use crate::layer;
use crate::manifest::Manifest;
use crate::reference::ImageReference;
use crate::registry::{RegistryClient, RegistryToken};

/// Outcome of assembling a root filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullReport {
    /// Digests applied, in application order.
    pub applied: Vec<String>,
    /// Total compressed bytes downloaded.
    pub bytes: u64,
}

/// Downloads and extracts an image's layers one at a time.
pub struct Puller<'a> {
    client: &'a RegistryClient,
    reference: &'a ImageReference,
    token: &'a RegistryToken,
}

impl<'a> Puller<'a> {
    /// Create a puller for one authorized reference.
    pub fn new(
        client: &'a RegistryClient,
        reference: &'a ImageReference,
        token: &'a RegistryToken,
    ) -> Self {
        Self {
            client,
            reference,
            token,
        }
    }

    /// Apply every layer of `manifest` to `rootfs`, in manifest order.
    ///
    /// Each archive is downloaded next to the extracted content, unpacked,
    /// then removed before the next layer is requested.
    pub async fn assemble(&self, manifest: &Manifest, rootfs: &Path) -> CaskResult<PullReport> {
        if manifest.schema_version == 1 {
            tracing::info!(
                reference = %self.reference,
                "Schema 1 manifest lists layers top-most first; applying in received order"
            );
        }

        let mut report = PullReport::default();
        for (index, digest) in manifest.digests().enumerate() {
            let archive = CaskPaths::layer_archive(rootfs, digest)?;
            let bytes = self
                .client
                .download_blob(self.reference, self.token, digest, &archive)
                .await?;
            tracing::debug!(index, digest, bytes, "Downloaded layer");

            apply_blocking(archive, rootfs.to_path_buf()).await?;

            report.applied.push(digest.to_string());
            report.bytes += bytes;
        }

        tracing::debug!(
            layers = report.applied.len(),
            bytes = report.bytes,
            rootfs = %rootfs.display(),
            "Root filesystem assembled"
        );
        Ok(report)
    }
}

async fn apply_blocking(archive: PathBuf, rootfs: PathBuf) -> CaskResult<()> {
    tokio::task::spawn_blocking(move || layer::apply_layer(&archive, &rootfs))
        .await
        .map_err(|e| CaskError::Internal {
            message: format!("Task join error: {e}"),
        })?
}
