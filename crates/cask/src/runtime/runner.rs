//! One run, from image name to exit status.

use std::path::PathBuf;

use cask_common::CaskResult;
use cask_image::{ImageReference, Puller, RegistryClient};

use super::config::RunConfig;
use super::launcher::{self, ExitStatus};
use super::lifecycle::{Lifecycle, RunPhase};
use crate::filesystem::RootFilesystem;
use crate::namespace;

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// How the command terminated.
    pub status: ExitStatus,
    /// Where the image was assembled.
    pub rootfs: PathBuf,
    /// Whether `rootfs` was left on disk.
    pub retained: bool,
}

/// Pulls an image and runs a command in it.
#[derive(Debug)]
pub struct Runner {
    registry: RegistryClient,
    config: RunConfig,
}

impl Runner {
    /// Create a runner.
    pub fn new(registry: RegistryClient, config: RunConfig) -> Self {
        Self { registry, config }
    }

    /// The run configuration.
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Pull `image` and run `program` with `args` inside it.
    ///
    /// Every step runs to completion before the next starts. The first
    /// failure ends the run; a non-zero exit of the command does not.
    pub async fn run(&self, image: &str, program: &str, args: &[String]) -> CaskResult<RunOutcome> {
        let mut lifecycle = Lifecycle::new();
        let result = self.drive(&mut lifecycle, image, program, args).await;
        match &result {
            Ok(outcome) => lifecycle.finish(outcome.status.code()),
            Err(e) => lifecycle.abort(e),
        }
        result
    }

    async fn drive(
        &self,
        lifecycle: &mut Lifecycle,
        image: &str,
        program: &str,
        args: &[String],
    ) -> CaskResult<RunOutcome> {
        lifecycle.enter(RunPhase::Resolve);
        let reference = ImageReference::parse(image);
        // Fail before touching the network if the mode is unavailable here.
        let isolation = namespace::for_mode(self.config.isolation)?;
        tracing::info!(image, reference = %reference, "Resolved image");

        lifecycle.enter(RunPhase::Auth);
        let token = self.registry.fetch_token(&reference).await?;

        lifecycle.enter(RunPhase::Manifest);
        let manifest = self.registry.fetch_manifest(&reference, &token).await?;
        tracing::info!(
            reference = %reference,
            layers = manifest.len(),
            schema_version = manifest.schema_version,
            "Fetched manifest"
        );

        lifecycle.enter(RunPhase::Pull);
        let rootfs = RootFilesystem::create(&self.config.paths.tmp, self.config.retention)?;
        let report = Puller::new(&self.registry, &reference, &token)
            .assemble(&manifest, rootfs.path())
            .await?;
        tracing::info!(
            layers = report.applied.len(),
            bytes = report.bytes,
            rootfs = %rootfs.path().display(),
            "Image assembled"
        );

        lifecycle.enter(RunPhase::Launch);
        let process = launcher::launch(isolation.as_ref(), rootfs.path(), program, args)?;

        lifecycle.enter(RunPhase::Wait);
        let status = process.wait(self.config.wait_timeout).await?;

        Ok(RunOutcome {
            status,
            rootfs: rootfs.path().to_path_buf(),
            retained: rootfs.is_retained(),
        })
    }
}
