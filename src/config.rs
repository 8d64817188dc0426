//! Settings resolved from the environment (and a `.env` file if there is one).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_GATEWAY_URL: &str = "https://localhost:5000";
pub const DEFAULT_RESOURCE_DIR: &str = "resources/clientportal.beta.gw";
const DEFAULT_AUTH_POLL_SECONDS: u64 = 5;
const DEFAULT_AUTH_TIMEOUT_SECONDS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    /// Example: `https://localhost:5000`
    pub gateway_url: String,
    /// Working directory of the gateway, contains `bin/` and `root/`
    pub resource_dir: PathBuf,
    /// PEM encoded root certificate of the gateway
    pub root_cert_path: Option<PathBuf>,
    /// Folder to dump response bodies into
    pub save_response_path: Option<PathBuf>,
    /// Pause between two authentication checks
    pub auth_poll: Duration,
    /// Give up waiting for the user to log in after this long
    pub auth_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            resource_dir: PathBuf::from(DEFAULT_RESOURCE_DIR),
            root_cert_path: None,
            save_response_path: None,
            auth_poll: Duration::from_secs(DEFAULT_AUTH_POLL_SECONDS),
            auth_timeout: Duration::from_secs(DEFAULT_AUTH_TIMEOUT_SECONDS),
        }
    }
}

impl Config {
    /// Load `.env` if present and resolve every setting from the environment.
    pub fn from_env() -> anyhow::Result<Config> {
        match dotenv::dotenv() {
            Ok(path) => log::debug!("loaded .env from {}", path.display()),
            Err(err) => log::debug!("couldn't load .env file: {:?}", err),
        };

        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Resolve every setting through `lookup`, missing keys use the defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let gateway_url = lookup("GATEWAY_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.gateway_url);

        let resource_dir = lookup("GATEWAY_RESOURCE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.resource_dir);

        let root_cert_path = lookup("GATEWAY_ROOT_CERT_PATH").map(PathBuf::from);

        let save_response = match lookup("GATEWAY_SAVE_RESPONSE") {
            None => false,
            Some(s) => s
                .trim()
                .parse::<bool>()
                .context("parse GATEWAY_SAVE_RESPONSE as bool")?,
        };
        let save_response_path = if save_response {
            let path = lookup("GATEWAY_SAVE_RESPONSE_PATH")
                .context("GATEWAY_SAVE_RESPONSE is set but GATEWAY_SAVE_RESPONSE_PATH is missing")?;
            Some(PathBuf::from(path))
        } else {
            None
        };

        let auth_poll = seconds(&lookup, "GATEWAY_AUTH_POLL_SECONDS")?.unwrap_or(defaults.auth_poll);
        let auth_timeout =
            seconds(&lookup, "GATEWAY_AUTH_TIMEOUT_SECONDS")?.unwrap_or(defaults.auth_timeout);

        if auth_poll.is_zero() {
            anyhow::bail!("GATEWAY_AUTH_POLL_SECONDS must be greater than zero");
        }

        Ok(Config {
            gateway_url,
            resource_dir,
            root_cert_path,
            save_response_path,
            auth_poll,
            auth_timeout,
        })
    }
}

fn seconds<F>(lookup: &F, key: &str) -> anyhow::Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|s| {
            s.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .with_context(|| format!("parse {}", key))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;
    use std::time::Duration;

    use super::{Config, DEFAULT_GATEWAY_URL};

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(
            config.resource_dir,
            Path::new("resources/clientportal.beta.gw")
        );
        assert_eq!(config.root_cert_path, None);
        assert_eq!(config.save_response_path, None);
        assert_eq!(config.auth_poll, Duration::from_secs(5));
        assert_eq!(config.auth_timeout, Duration::from_secs(300));
    }

    #[test]
    fn overrides() {
        let config = config_from(&[
            ("GATEWAY_URL", "https://127.0.0.1:5001/"),
            ("GATEWAY_RESOURCE_DIR", "/opt/gateway"),
            ("GATEWAY_ROOT_CERT_PATH", "/opt/gateway/cacert.pem"),
            ("GATEWAY_SAVE_RESPONSE", "true"),
            ("GATEWAY_SAVE_RESPONSE_PATH", "responses"),
            ("GATEWAY_AUTH_POLL_SECONDS", "1"),
            ("GATEWAY_AUTH_TIMEOUT_SECONDS", " 60 "),
        ])
        .unwrap();

        assert_eq!(config.gateway_url, "https://127.0.0.1:5001");
        assert_eq!(config.resource_dir, Path::new("/opt/gateway"));
        assert_eq!(
            config.root_cert_path.as_deref(),
            Some(Path::new("/opt/gateway/cacert.pem"))
        );
        assert_eq!(
            config.save_response_path.as_deref(),
            Some(Path::new("responses"))
        );
        assert_eq!(config.auth_poll, Duration::from_secs(1));
        assert_eq!(config.auth_timeout, Duration::from_secs(60));
    }

    #[test]
    fn save_response_disabled_ignores_path() {
        let config = config_from(&[
            ("GATEWAY_SAVE_RESPONSE", "false"),
            ("GATEWAY_SAVE_RESPONSE_PATH", "responses"),
        ])
        .unwrap();

        assert_eq!(config.save_response_path, None);
    }

    #[test]
    fn save_response_flag_is_trimmed() {
        let config = config_from(&[
            ("GATEWAY_SAVE_RESPONSE", " true\n"),
            ("GATEWAY_SAVE_RESPONSE_PATH", "responses"),
        ])
        .unwrap();

        assert_eq!(
            config.save_response_path.as_deref(),
            Some(Path::new("responses"))
        );
    }

    #[test]
    fn invalid_values() {
        assert!(config_from(&[("GATEWAY_SAVE_RESPONSE", "yes")]).is_err());
        assert!(config_from(&[("GATEWAY_SAVE_RESPONSE", "true")]).is_err());
        assert!(config_from(&[("GATEWAY_AUTH_POLL_SECONDS", "five")]).is_err());
        assert!(config_from(&[("GATEWAY_AUTH_POLL_SECONDS", "0")]).is_err());
        assert!(config_from(&[("GATEWAY_AUTH_TIMEOUT_SECONDS", "-1")]).is_err());
    }
}
