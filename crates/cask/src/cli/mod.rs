//! CLI command definitions and handlers.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use cask_image::{RegistryClient, RegistryConfig};

use crate::namespace::IsolationMode;
use crate::runtime::{RunConfig, Runner};

/// Cask - Minimal Container Launcher
#[derive(Parser)]
#[command(name = "cask")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Helper commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Pull an image and run a command inside it
    Run {
        /// Registry connection options.
        #[command(flatten)]
        registry: RegistryArgs,

        /// Directory the root filesystem is created in
        #[arg(long, env = "CASK_TMP_DIR")]
        tmp_dir: Option<PathBuf>,

        /// Remove the root filesystem when the command exits
        #[arg(long)]
        rm: bool,

        /// How the command is isolated from the host
        #[arg(long, value_enum, default_value_t = IsolationMode::platform_default())]
        isolation: IsolationMode,

        /// Kill the command after this many seconds
        #[arg(long, value_name = "SECONDS")]
        wait_timeout: Option<u64>,

        /// Image to pull (e.g. alpine, myuser/myapp)
        image: String,

        /// Command and arguments, resolved inside the image
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },
}

/// Registry connection options.
#[derive(Args, Debug, Clone)]
pub struct RegistryArgs {
    /// Registry API base URL
    #[arg(long, env = "CASK_REGISTRY_URL", default_value = RegistryConfig::DOCKER_HUB_URL)]
    pub registry_url: String,

    /// Token endpoint URL
    #[arg(long, env = "CASK_AUTH_URL", default_value = RegistryConfig::DOCKER_HUB_AUTH_URL)]
    pub auth_url: String,

    /// Service name sent to the token endpoint
    #[arg(long, env = "CASK_AUTH_SERVICE", default_value = RegistryConfig::DOCKER_HUB_SERVICE)]
    pub auth_service: String,

    /// Connect timeout for registry requests (seconds)
    #[arg(long, value_name = "SECONDS", default_value = "30")]
    pub connect_timeout: u64,

    /// Overall timeout for each registry request (seconds)
    #[arg(long, value_name = "SECONDS", default_value = "300")]
    pub request_timeout: u64,
}

impl RegistryArgs {
    /// Build the registry configuration.
    #[must_use]
    pub fn to_config(&self) -> RegistryConfig {
        RegistryConfig::default()
            .with_registry_url(&self.registry_url)
            .with_auth_url(&self.auth_url)
            .with_service(&self.auth_service)
            .with_timeouts(
                Duration::from_secs(self.connect_timeout),
                Duration::from_secs(self.request_timeout),
            )
    }
}

impl Cli {
    /// Default log directive for the chosen verbosity.
    #[must_use]
    pub const fn log_directive(&self) -> &'static str {
        if self.debug { "cask=debug" } else { "cask=warn" }
    }

    /// Execute the CLI command, returning the exit status to report.
    pub async fn execute(self) -> Result<i32> {
        match self.command {
            Commands::Run {
                registry,
                tmp_dir,
                rm,
                isolation,
                wait_timeout,
                image,
                command,
            } => {
                let mut config = RunConfig::default().with_isolation(isolation);
                if let Some(tmp) = tmp_dir {
                    config = config.with_tmp(tmp);
                }
                if rm {
                    config = config.remove_rootfs();
                }
                if let Some(seconds) = wait_timeout {
                    config = config.with_wait_timeout(Duration::from_secs(seconds));
                }

                let client = RegistryClient::new(registry.to_config()).map_err(|e| {
                    color_eyre::eyre::eyre!("Failed to create registry client: {}", e)
                })?;
                let runner = Runner::new(client, config);

                let (program, args) = command
                    .split_first()
                    .ok_or_else(|| color_eyre::eyre::eyre!("No command specified"))?;

                let outcome = runner
                    .run(&image, program, args)
                    .await
                    .map_err(|e| color_eyre::eyre::eyre!("Failed to run {}: {}", image, e))?;

                if outcome.retained {
                    tracing::info!(
                        rootfs = %outcome.rootfs.display(),
                        "Root filesystem left in place"
                    );
                }
                Ok(outcome.status.code())
            }
        }
    }
}
