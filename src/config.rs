use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the Fintrack API, e.g. "https://api.fintrack.example/v1"
  pub url: String,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./fintrack.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/fintrack/config.yaml
  /// 4. ~/.config/fintrack/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/fintrack/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("fintrack.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("fintrack").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the API token from environment variables.
  ///
  /// Checks FINTRACK_API_TOKEN first, then FINTRACK_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("FINTRACK_API_TOKEN")
      .or_else(|_| std::env::var("FINTRACK_TOKEN"))
      .map_err(|_| {
        eyre!("API token not found. Set FINTRACK_API_TOKEN or FINTRACK_TOKEN environment variable.")
      })
  }

  #[cfg(test)]
  pub(crate) fn for_url(url: &str) -> Self {
    Self {
      api: ApiConfig {
        url: url.to_string(),
      },
    }
  }
}
