use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};

use crate::auth::{AdoContext, Token};
use crate::config::Config;
use crate::error::AdoError;
use crate::manifest::AzurePipeline;
use crate::output;
use crate::providers::AzureDevOpsProvider;
use crate::state::DownloadState;
use crate::sync::{self, SyncOptions};

const ORG_URL_ENV: &str = "AZURE_DEVOPS_ORG_URL";
const PROJECT_ENV: &str = "AZURE_DEVOPS_PROJECT_NAME";
const TOKEN_ENV: &str = "AZURE_DEVOPS_EXT_PAT";

#[derive(Parser)]
#[command(name = "ado-ad")]
#[command(author, version, about = "Azure DevOps artifacts downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Organization URL (e.g., 'https://dev.azure.com/org')
    #[arg(long, global = true, env = ORG_URL_ENV)]
    org_url: Option<String>,

    /// Project the pipelines live in
    #[arg(long, global = true, env = PROJECT_ENV)]
    project: Option<String>,

    /// Personal access token
    #[arg(long, global = true, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// State file recording the downloaded build of each resource
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Directory the per-resource folders are created in
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the newest matching build artifacts of every pipeline resource
    Sync {
        /// Pipeline manifest declaring `resources.pipelines`
        manifest: PathBuf,

        /// Ignore recorded builds and download everything again
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },
    /// Show the builds recorded in the state file
    Status,
}

impl Cli {
    fn state_file(&self, config: &Config) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| config.state.file.clone())
    }

    fn output_dir(&self, config: &Config) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| config.output.directory.clone())
    }

    /// Combines flags, environment and config file into the connection
    /// settings. Flags and environment win over the file.
    fn context(&self, config: &Config) -> Result<AdoContext, AdoError> {
        let settings = &config.azure_devops;

        let organization_url = required(
            self.org_url.as_ref().or(settings.organization_url.as_ref()),
            ORG_URL_ENV,
            "organization URL",
        )?;
        let project = required(
            self.project.as_ref().or(settings.project.as_ref()),
            PROJECT_ENV,
            "project",
        )?;
        let token = required(
            self.token.as_ref().or(settings.token.as_ref()),
            TOKEN_ENV,
            "access token",
        )?;

        Ok(AdoContext {
            organization_url,
            project,
            token: Token::from(token),
        })
    }

    async fn execute_sync(&self, config: &Config, manifest: &Path, force: bool) -> Result<()> {
        let context = self.context(config)?;
        let pipeline = AzurePipeline::load(manifest)?;
        info!(
            "Loaded {} pipeline resources from {}",
            pipeline.pipelines().len(),
            manifest.display()
        );

        let provider = AzureDevOpsProvider::new(
            &context,
            &config.azure_devops.api_version,
            self.output_dir(config),
        )?;
        let options = SyncOptions {
            state_file: self.state_file(config),
            backup: config.state.backup,
            force,
        };

        let summary = sync::run(&provider, pipeline.pipelines(), &options).await?;

        if config.output.summary {
            output::print_summary(&summary);
        }

        Ok(())
    }

    fn execute_status(&self, config: &Config) -> Result<()> {
        let state_file = self.state_file(config);
        let state = DownloadState::load(&state_file)?;
        output::print_state(&state, &state_file);
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Sync { manifest, force } => {
                self.execute_sync(&config, manifest, *force).await
            }
            Commands::Status => self.execute_status(&config),
        }
    }
}

fn required(value: Option<&String>, env: &str, what: &str) -> Result<String, AdoError> {
    match value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(value) => Ok(value.to_string()),
        None => Err(AdoError::Config(format!(
            "missing {what}, set {env} or configure it in ado-ad.toml"
        ))),
    }
}
