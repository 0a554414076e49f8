//! Manifest parser.
//!
//! This module handles loading manifests from YAML files and applying
//! environment overrides, with proper precedence and error handling.

use crate::error::{ConfigError, KdaError, Result};
use std::path::Path;
use tracing::{debug, info};

use super::spec::DeployManifest;

/// Parser for deployment manifests.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving `.env`.
    base_path: Option<std::path::PathBuf>,
}

impl ConfigParser {
    /// Creates a new parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving `.env`.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a manifest from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<DeployManifest> {
        let path = path.as_ref();
        info!("Loading manifest from: {}", path.display());

        if !path.exists() {
            return Err(KdaError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            KdaError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses a manifest from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<DeployManifest> {
        debug!("Parsing YAML manifest");

        let manifest: DeployManifest = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            KdaError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!("Parsed manifest for application: {}", manifest.application.name);
        Ok(manifest)
    }

    /// Loads a manifest and applies environment overrides.
    ///
    /// Recognized variables: `KDA_APPLICATION_NAME`, `KDA_ENDPOINT`, `KDA_STATE_PATH`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<DeployManifest> {
        let mut manifest = self.load_file(path)?;
        Self::apply_overrides(&mut manifest, |key| std::env::var(key).ok());
        Ok(manifest)
    }

    /// Applies overrides from a variable lookup.
    fn apply_overrides(manifest: &mut DeployManifest, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("KDA_APPLICATION_NAME") {
            debug!("Overriding application.name from environment");
            manifest.application.name = name;
        }

        if let Some(endpoint) = lookup("KDA_ENDPOINT") {
            debug!("Overriding remote.endpoint from environment");
            manifest.remote.endpoint = endpoint;
        }

        if let Some(path) = lookup("KDA_STATE_PATH") {
            debug!("Overriding state.path from environment");
            manifest.state.path = Some(path);
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| std::path::PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                KdaError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Reads the bearer token named by `remote.auth_token_env`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is named but not set.
    pub fn auth_token(manifest: &DeployManifest) -> Result<Option<String>> {
        let Some(var) = &manifest.remote.auth_token_env else {
            return Ok(None);
        };
        std::env::var(var)
            .map(Some)
            .map_err(|_| KdaError::Config(ConfigError::MissingEnvVar { name: var.clone() }))
    }
}

/// Default manifest file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["kda.deploy.yaml", "kda.deploy.yml"];

/// Finds the manifest in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no manifest is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<std::path::PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found manifest: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(KdaError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}
