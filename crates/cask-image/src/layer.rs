//! Layer archive extraction.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use cask_common::{CaskError, CaskResult};

/// Compression applied to a layer archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// gzip (`1f 8b`).
    Gzip,
    /// zstd (`28 b5 2f fd`).
    Zstd,
    /// Plain tar.
    None,
}

impl Compression {
    /// Detect compression from the first bytes of an archive.
    #[must_use]
    pub fn detect(header: &[u8]) -> Self {
        if header.starts_with(&[0x1f, 0x8b]) {
            Self::Gzip
        } else if header.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Self::Zstd
        } else {
            Self::None
        }
    }
}

/// Unpack `archive` into `rootfs`.
///
/// Entries overwrite whatever earlier layers left at the same path. A failure
/// partway through leaves the entries unpacked so far in place. When running
/// as root, entries keep the uid and gid recorded in the archive.
pub fn extract_layer(archive: &Path, rootfs: &Path) -> CaskResult<()> {
    let file = File::open(archive).map_err(CaskError::filesystem("open", archive))?;
    let mut reader = BufReader::new(file);
    let compression = Compression::detect(
        reader
            .fill_buf()
            .map_err(CaskError::filesystem("read", archive))?,
    );

    tracing::debug!(archive = %archive.display(), ?compression, "Extracting layer");

    let reader: Box<dyn Read> = match compression {
        Compression::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
        Compression::Zstd => Box::new(
            zstd::stream::read::Decoder::with_buffer(reader)
                .map_err(CaskError::filesystem("decompress", archive))?,
        ),
        Compression::None => Box::new(reader),
    };

    let mut tar = tar::Archive::new(reader);
    tar.set_preserve_permissions(true);
    tar.set_preserve_ownerships(can_chown());
    tar.set_overwrite(true);
    tar.unpack(rootfs)
        .map_err(CaskError::filesystem("extract", archive))?;

    Ok(())
}

// Unprivileged chown to a foreign uid fails with EPERM.
#[cfg(unix)]
fn can_chown() -> bool {
    rustix::process::geteuid().is_root()
}

#[cfg(not(unix))]
const fn can_chown() -> bool {
    false
}

/// Extract `archive` into `rootfs`, then delete the archive file.
pub fn apply_layer(archive: &Path, rootfs: &Path) -> CaskResult<()> {
    extract_layer(archive, rootfs)?;
    std::fs::remove_file(archive).map_err(CaskError::filesystem("remove", archive))?;
    tracing::debug!(archive = %archive.display(), "Removed layer archive");
    Ok(())
}
