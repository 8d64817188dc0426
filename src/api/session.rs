//! The collaborator that talks HTTP to the gateway.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use chrono::Local;
use reqwest::tls::Version;
use reqwest::Method;
use serde_json::Value;

use crate::config::Config;

/// Sends a request to an endpoint of the gateway and returns the response body.
///
/// The authenticator only decides *what* to ask, connection handling is up to
/// the implementation.
#[allow(async_fn_in_trait)]
pub trait Session {
    /// `endpoint` is a path like `/api/iserver/auth/status`.
    async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        json_payload: Option<&Value>,
    ) -> anyhow::Result<String>;
}

fn elapsed_ms(start: &Instant) -> u128 {
    start.elapsed().as_millis()
}

pub struct HttpSession {
    /// Use to make REST requests
    client: reqwest::Client,
    /// Example: `https://localhost:5000`
    base_url: String,
    /// Path to save responses to
    save_response_path: Option<PathBuf>,
}

impl HttpSession {
    pub async fn new(config: &Config) -> anyhow::Result<HttpSession> {
        // the gateway listens locally, a system proxy would only get in the way
        let mut builder = reqwest::Client::builder()
            .min_tls_version(Version::TLS_1_2)
            .no_proxy();

        match config.root_cert_path.as_ref() {
            None => {
                log::warn!("no gateway root cert configured, accepting invalid certs");
                builder = builder.danger_accept_invalid_certs(true);
            }
            Some(path) => {
                let pem = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("couldn't read root cert at {}", path.display()))?;
                let cert = reqwest::Certificate::from_pem(&pem).context("certificate is invalid")?;
                builder = builder.add_root_certificate(cert);
            }
        };

        let client = builder
            .build()
            .context("invalid http client configuration")?;

        let save_response_path = match config.save_response_path.as_ref() {
            None => None,
            Some(path) => Self::prepare_save_response_path(path.clone()).await,
        };

        Ok(HttpSession {
            client,
            base_url: config.gateway_url.clone(),
            save_response_path,
        })
    }

    /// Make sure the folder exists, otherwise responses aren't saved.
    async fn prepare_save_response_path(path: PathBuf) -> Option<PathBuf> {
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_dir() => Some(path),
            Ok(_) => {
                log::warn!("{} is not a folder, not saving responses", path.display());
                None
            }
            Err(_) => match tokio::fs::create_dir_all(&path).await {
                Ok(()) => {
                    log::info!("created folder {} to save responses to", path.display());
                    Some(path)
                }
                Err(err) => {
                    log::warn!("couldn't create folder {}: {:?}", path.display(), err);
                    None
                }
            },
        }
    }

    async fn save_response(&self, endpoint: &str, text: &str) {
        let Some(mut path) = self.save_response_path.clone() else {
            return;
        };

        let now = Local::now().format("%Y-%m-%d_%H-%M-%S.%3f");
        let name = endpoint.trim_matches('/').replace('/', "-");
        path.push(format!("response_{}_{}.json", now, name));

        if let Err(err) = tokio::fs::write(&path, text).await {
            log::warn!("couldn't save {}: {:?}", path.display(), err);
        }
    }

    /// Example: `session.make_url("/api/sso/validate")` will produce
    /// `https://localhost:5000/api/sso/validate`
    pub fn make_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

impl Session for HttpSession {
    async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        json_payload: Option<&Value>,
    ) -> anyhow::Result<String> {
        let url = self.make_url(endpoint);

        let now = Instant::now();
        let mut builder = self.client.request(method.clone(), &url);
        if let Some(payload) = json_payload {
            builder = builder.json(payload);
        }

        let resp = builder
            .send()
            .await
            .with_context(|| format!("send {} request to {}", method, url))?;
        let status = resp.status();

        if let Err(err) = resp.error_for_status_ref() {
            log::warn!("{} {} returned {}", method, url, status);
            return Err(err).context("response status non 2XX");
        }

        let text = resp.text().await.context("read response body")?;

        log::debug!(
            "{} request to {} ({}) took {}ms",
            method,
            url,
            status.as_u16(),
            elapsed_ms(&now),
        );

        self.save_response(endpoint, &text).await;

        Ok(text)
    }
}
