use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use truthsocial::ClientConfig;

#[derive(Deserialize, Default)]
pub struct Config {
    pub token: Option<String>,
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub rate_limit_floor: u64,
}

impl Config {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let conf_contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Unable to read config file {:?}", path.as_ref()))?;
        Ok(toml::from_str(&conf_contents)?)
    }

    /// Read the config file if there is one, a token can also come from the command line
    pub fn read_optional(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::read(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn client_config(self, token: Option<String>) -> Result<ClientConfig> {
        let token = token.or(self.token).ok_or_else(|| {
            anyhow!("Missing token, set it in the config file or TRUTHSOCIAL_TOKEN")
        })?;

        let mut conf = ClientConfig::new(token);
        if let Some(base_url) = self.base_url {
            conf.base_url = base_url;
        }
        if let Some(user_agent) = self.user_agent {
            conf.user_agent = user_agent;
        }
        if let Some(secs) = self.timeout_secs {
            conf.timeout = Duration::from_secs(secs);
        }
        conf.rate_limit_floor = self.rate_limit_floor;
        Ok(conf)
    }
}
