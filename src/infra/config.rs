use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::generate::Credential;
use crate::core::profile::DEFAULT_TOP_N;
use crate::core::prompt::Rubric;
use crate::error::ConfigurationError;

/// Config files checked in the working directory, first match wins.
pub const CONFIG_FILES: [&str; 4] =
    ["essaylens.toml", "essaylens.yaml", "essaylens.json", ".essaylens.toml"];

/// Environment variable read when no key is configured elsewhere.
pub const FALLBACK_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Generation service key (prefer the environment over the file)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Generative model identifier
    pub model: String,

    /// Service base URL
    pub endpoint: String,

    /// Number of frequency entries sent with the essay
    pub top_n: usize,

    /// Characters of essay text shown before analysis
    pub preview_chars: usize,

    /// Analysis rubric constants
    pub rubric: Rubric,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            api_key: None,
            model: "gemini-2.5-pro".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            top_n: DEFAULT_TOP_N,
            preview_chars: 500,
            rubric: Rubric::default(),
        }
    }
}

impl Config
{
    /// Resolve the credential: explicit override, then config, then
    /// `GEMINI_API_KEY`.
    pub fn credential(
        &self,
        override_key: Option<&str>,
    ) -> Option<Credential>
    {
        override_key
            .and_then(Credential::new)
            .or_else(|| {
                self.api_key
                    .as_deref()
                    .and_then(Credential::new)
            })
            .or_else(|| {
                std::env::var(FALLBACK_KEY_VAR)
                    .ok()
                    .and_then(Credential::new)
            })
    }
}

/// Load configuration from the working directory.
pub fn load_config() -> Result<Config, ConfigurationError>
{
    load_config_from(Path::new("."))
}

/// Load configuration with files resolved against `dir`.
pub fn load_config_from(dir: &Path) -> Result<Config, ConfigurationError>
{
    let mut builder = config::Config::builder();

    // Load from config files in priority order
    for name in &CONFIG_FILES
    {
        let path = dir.join(name);
        if path.exists()
        {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    // ESSAYLENS_API_KEY, ESSAYLENS_RUBRIC__SCORE_SCALE, ...
    builder = builder.add_source(
        config::Environment::with_prefix("ESSAYLENS")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .map_err(|e| ConfigurationError::Invalid(e.to_string()))?;

    cfg.try_deserialize()
        .map_err(|e| ConfigurationError::Invalid(e.to_string()))
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_FILES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use assert_fs::prelude::*;

    use super::*;
    use crate::core::prompt::ScoreScale;

    #[test]
    fn defaults_round_trip_through_toml()
    {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(!text.contains("api_key"));

        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.model, "gemini-2.5-pro");
        assert_eq!(back.top_n, 10);
        assert_eq!(back.rubric, Rubric::default());
    }

    #[test]
    fn file_overrides_defaults()
    {
        let tmp = assert_fs::TempDir::new().unwrap();
        tmp.child("essaylens.toml")
            .write_str("top_n = 5\nmodel = \"gemini-2.5-flash\"\n[rubric]\nscore_scale = \"ten\"\n")
            .unwrap();

        let cfg = load_config_from(tmp.path()).unwrap();
        assert_eq!(cfg.top_n, 5);
        assert_eq!(cfg.model, "gemini-2.5-flash");
        assert_eq!(cfg.rubric.score_scale, ScoreScale::Ten);
        assert_eq!(cfg.rubric.summary_sentences, "4-5");
        assert_eq!(cfg.preview_chars, 500);
    }

    #[test]
    fn malformed_file_is_configuration_error()
    {
        let tmp = assert_fs::TempDir::new().unwrap();
        tmp.child("essaylens.toml")
            .write_str("top_n = \"many\"\n")
            .unwrap();

        assert!(matches!(load_config_from(tmp.path()), Err(ConfigurationError::Invalid(_))));
    }

    #[test]
    fn explicit_key_wins_and_blank_is_ignored()
    {
        let cfg = Config { api_key: Some("from-file".into()), ..Config::default() };

        assert!(cfg.credential(Some("flag")).is_some());
        // Blank override falls through to the file value
        assert!(cfg.credential(Some("  ")).is_some());
    }
}
