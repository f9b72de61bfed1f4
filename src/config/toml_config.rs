use crate::domain::model::WildcardStrategy;
use crate::utils::error::{Result, UkpsError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_REMOTE_URL_PREFIX: &str =
    "https://raw.githubusercontent.com/govuk-digital-backbone/ukps-domains/refs/heads/main/data";
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 2;
pub const DEFAULT_LOCAL_DIRECTORY: &str = "./data";
pub const DEFAULT_REGISTRY_FILE: &str = "user_domains.json";
pub const DEFAULT_ORGANISATIONS_FILE: &str = "govuk_organisations.json";

const MAX_REMOTE_TIMEOUT_SECS: u64 = 300;

/// Where and how the registry documents are loaded from.
///
/// Every field has a default, so an empty TOML file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub remote_url_prefix: String,
    pub local_directory: PathBuf,
    pub registry_file: String,
    pub organisations_file: String,
    pub remote_timeout_secs: u64,
    pub allow_remote: bool,
    pub wildcard_strategy: WildcardStrategy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            remote_url_prefix: DEFAULT_REMOTE_URL_PREFIX.to_string(),
            local_directory: PathBuf::from(DEFAULT_LOCAL_DIRECTORY),
            registry_file: DEFAULT_REGISTRY_FILE.to_string(),
            organisations_file: DEFAULT_ORGANISATIONS_FILE.to_string(),
            remote_timeout_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
            allow_remote: true,
            wildcard_strategy: WildcardStrategy::default(),
        }
    }
}

impl LoaderConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(UkpsError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| UkpsError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| UkpsError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// The URL prefix with surrounding whitespace and trailing slashes removed.
    pub fn normalized_url_prefix(&self) -> &str {
        self.remote_url_prefix.trim().trim_end_matches('/')
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }

    /// The documents every load must obtain, registry first.
    pub fn files(&self) -> [&str; 2] {
        [self.registry_file.as_str(), self.organisations_file.as_str()]
    }

    pub fn remote_url_for(&self, file: &str) -> String {
        format!("{}/{}", self.normalized_url_prefix(), file)
    }
}

impl Validate for LoaderConfig {
    fn validate(&self) -> Result<()> {
        if self.allow_remote {
            validation::validate_url("remote_url_prefix", self.normalized_url_prefix())?;
            validation::validate_range(
                "remote_timeout_secs",
                self.remote_timeout_secs,
                1,
                MAX_REMOTE_TIMEOUT_SECS,
            )?;
        }

        let local_directory = self.local_directory.to_string_lossy();
        validation::validate_path("local_directory", &local_directory)?;

        for (field, file) in [
            ("registry_file", &self.registry_file),
            ("organisations_file", &self.organisations_file),
        ] {
            validation::validate_bare_filename(field, file)?;
            validation::validate_file_extension(field, file, &["json"])?;
        }

        if self.registry_file == self.organisations_file {
            return Err(UkpsError::InvalidConfigValueError {
                field: "organisations_file".to_string(),
                value: self.organisations_file.clone(),
                reason: "must differ from registry_file".to_string(),
            });
        }

        tracing::debug!("Loader configuration validation passed");
        Ok(())
    }
}
