use crate::config::LoaderConfig;
use crate::domain::model::WildcardStrategy;
use crate::utils::error::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "ukps-domains")]
#[command(about = "Check domains and emails against the UK public sector domains registry")]
pub struct CliConfig {
    /// Path to a TOML loader configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the remote URL prefix
    #[arg(long, global = true)]
    pub remote_url: Option<String>,

    /// Override the local data directory
    #[arg(long, global = true)]
    pub local_dir: Option<PathBuf>,

    /// Override the remote fetch timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Only read the local data directory
    #[arg(long, global = true)]
    pub no_remote: bool,

    /// Wildcard tie-break strategy
    #[arg(long, value_enum, global = true)]
    pub wildcard: Option<WildcardArg>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Exit 0 if the domain is registered, 1 otherwise
    CheckDomain { domain: String },
    /// Exit 0 if the email's domain is registered, 1 otherwise
    CheckEmail { email: String },
    /// Print the matching entry as JSON
    Lookup {
        /// A domain, or an email address if it contains '@'
        input: String,
        /// Skip the organisation metadata join
        #[arg(long)]
        no_enrich: bool,
    },
    /// Sort and reformat a registry document in place
    Format {
        path: PathBuf,
        /// Report whether the file needs formatting without writing it
        #[arg(long)]
        check: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WildcardArg {
    LastMatch,
    MostSpecific,
}

impl From<WildcardArg> for WildcardStrategy {
    fn from(arg: WildcardArg) -> Self {
        match arg {
            WildcardArg::LastMatch => WildcardStrategy::LastMatch,
            WildcardArg::MostSpecific => WildcardStrategy::MostSpecific,
        }
    }
}

impl CliConfig {
    /// Builds the loader configuration: file (or defaults) first, then flag overrides.
    pub fn loader_config(&self) -> Result<LoaderConfig> {
        let mut config = match &self.config {
            Some(path) => LoaderConfig::from_file(path)?,
            None => LoaderConfig::default(),
        };

        if let Some(url) = &self.remote_url {
            config.remote_url_prefix = url.clone();
        }
        if let Some(dir) = &self.local_dir {
            config.local_directory = dir.clone();
        }
        if let Some(timeout) = self.timeout {
            config.remote_timeout_secs = timeout;
        }
        if self.no_remote {
            config.allow_remote = false;
        }
        if let Some(wildcard) = self.wildcard {
            config.wildcard_strategy = wildcard.into();
        }

        Ok(config)
    }
}
