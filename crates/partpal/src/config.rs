use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use partpal_core::engine::DEFAULT_QUERY_TIMEOUT;
use partpal_core::{Distributor, EngineConfig, ExecutionMode};
use partpal_distributors::{DigiKey, DigiKeyConfig, Mouser, MouserConfig};
use serde::Deserialize;

/// Files looked up in the working directory when `--config` is not given
const LOCAL_CONFIG_FILES: [&str; 2] = [".partpal.toml", ".partpal.json"];

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub engine: EngineSection,
    pub distributors: DistributorsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    pub mode: Option<ExecutionMode>,
    /// Per line item deadline in concurrent mode, 0 disables it
    pub query_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistributorsSection {
    pub mouser: Option<MouserSection>,
    pub digikey: Option<DigiKeySection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MouserSection {
    pub api_key: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DigiKeySection {
    pub client_id: String,
    pub client_secret: String,
    pub sandbox: bool,
    pub base_url: Option<String>,
    pub locale_site: Option<String>,
    pub locale_currency: Option<String>,
}

impl Config {
    /// Load from `path`, or from the first config file found in the usual places.
    ///
    /// Having no config file at all is not an error here; it surfaces later as
    /// an engine with no distributors.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match find_config() {
                Some(path) => path,
                None => {
                    log::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        log::debug!("Loading config from {}", path.display());

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        }
    }

    /// Engine settings from the config file, overridden by command line flags
    pub fn engine_config(
        &self,
        mode: Option<ExecutionMode>,
        timeout_secs: Option<u64>,
    ) -> EngineConfig {
        let query_timeout = match timeout_secs.or(self.engine.query_timeout_secs) {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_QUERY_TIMEOUT),
        };
        EngineConfig {
            mode: mode.or(self.engine.mode).unwrap_or_default(),
            query_timeout,
        }
    }

    /// Construct and initialize every configured distributor.
    ///
    /// A distributor that fails to initialize is logged and left out, so one
    /// bad credential does not stop the others from being used.
    pub fn distributors(&self, http_timeout: Duration) -> Vec<Arc<dyn Distributor>> {
        let mut configured: Vec<(Box<dyn Distributor>, Vec<&str>)> = Vec::new();

        if let Some(mouser) = &self.distributors.mouser {
            let mut config = MouserConfig {
                timeout: http_timeout,
                ..MouserConfig::default()
            };
            if let Some(base_url) = &mouser.base_url {
                config.base_url = base_url.clone();
            }
            configured.push((
                Box::new(Mouser::new(config)) as Box<dyn Distributor>,
                vec![mouser.api_key.as_str()],
            ));
        }

        if let Some(digikey) = &self.distributors.digikey {
            let mut config = if digikey.sandbox {
                DigiKeyConfig::sandbox()
            } else {
                DigiKeyConfig::default()
            };
            config.timeout = http_timeout;
            if let Some(base_url) = &digikey.base_url {
                config.base_url = base_url.clone();
            }
            if let Some(site) = &digikey.locale_site {
                config.locale_site = site.clone();
            }
            if let Some(currency) = &digikey.locale_currency {
                config.locale_currency = currency.clone();
            }
            configured.push((
                Box::new(DigiKey::new(config)) as Box<dyn Distributor>,
                vec![digikey.client_id.as_str(), digikey.client_secret.as_str()],
            ));
        }

        configured
            .into_iter()
            .filter_map(|(mut distributor, credentials)| {
                match distributor.initialize(&credentials) {
                    Ok(()) => {
                        log::info!("{} ready", distributor.name());
                        Some(Arc::<dyn Distributor>::from(distributor))
                    }
                    Err(e) => {
                        log::warn!("Skipping {}: {e}", distributor.name());
                        None
                    }
                }
            })
            .collect()
    }

    /// Like [`Config::distributors`], but an empty result is an error
    pub fn require_distributors(
        &self,
        http_timeout: Duration,
    ) -> Result<Vec<Arc<dyn Distributor>>> {
        let distributors = self.distributors(http_timeout);
        if distributors.is_empty() {
            bail!(
                "No distributors configured. Add Mouser or DigiKey credentials to .partpal.toml \
                 or ~/.partpal/config.toml, or pass --config"
            );
        }
        Ok(distributors)
    }
}

fn find_config() -> Option<PathBuf> {
    LOCAL_CONFIG_FILES
        .iter()
        .map(PathBuf::from)
        .chain(dirs::home_dir().map(|home| home.join(".partpal").join("config.toml")))
        .find(|path| path.is_file())
}
