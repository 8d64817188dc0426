//! Exposes an `Authenticator` to bring up the gateway and log in through it.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use parking_lot::Mutex;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::time::{Instant, MissedTickBehavior};

use crate::api::{self, endpoint, Session};
use crate::config::Config;
use crate::process::{command, GatewayPid, Platform, ProcessListing, Processes, System};

/// Result of [`Authenticator::is_already_running`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningCheck {
    pub is_running: bool,
    /// What the process listing reported
    pub data: ProcessListing,
}

/// Result of [`Authenticator::login`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Login {
    /// A new gateway was started and the login page opened
    Launched(GatewayPid),
    /// Some gateway was already up, its pid if the listing had one
    AlreadyRunning(Option<GatewayPid>),
}

pub struct Authenticator<S, P = System> {
    /// Does all the HTTP
    session: S,
    /// Lists, spawns and kills processes
    processes: P,
    platform: Platform,
    /// Working directory of the gateway
    resource_dir: PathBuf,
    /// Login page opened in the browser
    gateway_url: String,
    /// Spawned by us or found by the process listing
    server_process_id: Mutex<Option<GatewayPid>>,
    /// Set once the gateway reported an authenticated session
    authenticated: Mutex<bool>,
}

impl<S: Session> Authenticator<S, System> {
    pub fn new(session: S, config: &Config) -> Authenticator<S, System> {
        Authenticator {
            session,
            processes: System,
            platform: Platform::current(),
            resource_dir: config.resource_dir.clone(),
            gateway_url: config.gateway_url.clone(),
            server_process_id: Mutex::new(None),
            authenticated: Mutex::new(false),
        }
    }
}

impl<S: Session, P: Processes> Authenticator<S, P> {
    /// Swap out how processes are run, the platform stays as is.
    pub fn with_processes<Q: Processes>(self, processes: Q) -> Authenticator<S, Q> {
        Authenticator {
            session: self.session,
            processes,
            platform: self.platform,
            resource_dir: self.resource_dir,
            gateway_url: self.gateway_url,
            server_process_id: self.server_process_id,
            authenticated: self.authenticated,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn server_process_id(&self) -> Option<GatewayPid> {
        *self.server_process_id.lock()
    }

    /// Last known authentication state, see [`Self::check_auth`].
    pub fn authenticated(&self) -> bool {
        *self.authenticated.lock()
    }

    /// Start the gateway unless one is running already.
    ///
    /// The user still has to fill in the login form that was opened in the
    /// browser, use [`Self::wait_until_authenticated`] to find out when that
    /// happened.
    pub async fn login(&self) -> anyhow::Result<Login> {
        let running = self.is_already_running().await?;

        if running.is_running {
            log::info!("gateway already running, no need to start back up");
            return Ok(Login::AlreadyRunning(self.server_process_id()));
        }

        let pid = self.startup_gateway().await?;
        Ok(Login::Launched(pid))
    }

    /// Start the gateway and open its login page.
    pub async fn startup_gateway(&self) -> anyhow::Result<GatewayPid> {
        let line = command::launch(self.platform);
        let pid = self
            .processes
            .spawn(&line, &self.resource_dir)
            .context("start gateway")?;

        log::info!(
            "started gateway in {} (pid {})",
            self.resource_dir.display(),
            pid
        );
        *self.server_process_id.lock() = Some(pid);

        // the gateway is up either way, the user can open the page themselves
        let browser = command::browser(self.platform, &self.gateway_url);
        if let Err(err) = self.processes.status(&browser).await {
            log::warn!(
                "couldn't open browser, log in at {}: {:?}",
                self.gateway_url,
                err
            );
        }

        Ok(pid)
    }

    /// Look for a running gateway and remember its pid if there is one.
    pub async fn is_already_running(&self) -> anyhow::Result<RunningCheck> {
        let line = command::listing(self.platform);
        let output = self
            .processes
            .capture(&line)
            .await
            .context("list processes")?;

        let data = ProcessListing::parse(self.platform, &output.stdout)
            .with_context(|| format!("parse output of `{}`", line))?;
        let is_running = data.is_running();

        if is_running {
            match data.first_pid() {
                Ok(Some(pid)) => *self.server_process_id.lock() = Some(pid),
                Ok(None) => {}
                Err(err) => log::warn!("gateway is running but its pid is unusable: {}", err),
            }
        }

        Ok(RunningCheck { is_running, data })
    }

    /// Kill the gateway, `pid` defaults to the one spawned or found earlier.
    ///
    /// Returns whatever the kill utility printed. If it failed the tracked pid
    /// is kept, the process is most likely still alive.
    pub async fn close_gateway(&self, pid: Option<GatewayPid>) -> anyhow::Result<String> {
        let tracked = self.server_process_id();
        let Some(pid) = pid.or(tracked) else {
            anyhow::bail!("no gateway process id known, pass one explicitly");
        };

        let line = command::kill(self.platform, pid);
        let output = self
            .processes
            .capture(&line)
            .await
            .context("close gateway")?;

        if !output.success {
            anyhow::bail!("couldn't close gateway (pid {}): {}", pid, output.message());
        }

        log::info!("closed gateway (pid {})", pid);
        if tracked == Some(pid) {
            *self.server_process_id.lock() = None;
        }

        Ok(output.stdout)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: Option<&serde_json::Value>,
    ) -> anyhow::Result<T> {
        let text = self
            .session
            .make_request(Method::POST, endpoint, payload)
            .await?;
        serde_json::from_str(&text).with_context(|| format!("parse {} response json", endpoint))
    }

    /// Current authentication status to the brokerage system.
    pub async fn is_authenticated(&self) -> anyhow::Result<api::AuthStatus> {
        self.post(endpoint::AUTH_STATUS, None).await
    }

    /// Select the account subsequent requests (orders, trades, ...) refer to.
    pub async fn update_server_account(
        &self,
        account_id: &str,
    ) -> anyhow::Result<api::ServerAccount> {
        let payload = json!({ "acctId": account_id });
        self.post(endpoint::SERVER_ACCOUNT, Some(&payload)).await
    }

    /// Validate the current session for the SSO user.
    pub async fn sso_validate(&self) -> anyhow::Result<api::Validation> {
        self.post(endpoint::SSO_VALIDATE, None).await
    }

    /// Reauthenticate to the brokerage system, needs a valid SSO session.
    pub async fn reauthenticate(&self) -> anyhow::Result<api::Reauthentication> {
        self.post(endpoint::REAUTHENTICATE, None).await
    }

    /// End the gateway session.
    pub async fn logout(&self) -> anyhow::Result<api::Logout> {
        let logout = self.post(endpoint::LOGOUT, None).await?;
        *self.authenticated.lock() = false;
        Ok(logout)
    }

    /// Ask the gateway whether the user has logged in yet.
    ///
    /// Only the `authenticated` field is looked at, whatever else the status
    /// contains. Errors are swallowed, the gateway is unreachable while it boots.
    pub async fn check_auth(&self) -> bool {
        log::info!("checking authentication status...");

        match self.post::<serde_json::Value>(endpoint::AUTH_STATUS, None).await {
            Ok(status) if status.get("authenticated") == Some(&serde_json::Value::Bool(true)) => {
                *self.authenticated.lock() = true;
            }
            Ok(_) => {}
            Err(err) => log::debug!("couldn't check authentication status: {:?}", err),
        }

        self.authenticated()
    }

    /// Call [`Self::check_auth`] every `poll` until it succeeds or `timeout`
    /// has passed.
    pub async fn wait_until_authenticated(
        &self,
        poll: Duration,
        timeout: Duration,
    ) -> anyhow::Result<()> {
        if poll.is_zero() {
            anyhow::bail!("poll interval must be greater than zero");
        }
        let deadline = Instant::now() + timeout;

        let mut interval = tokio::time::interval(poll);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // first tick completes immediately
            interval.tick().await;

            if self.check_auth().await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                anyhow::bail!("not authenticated after {}s", timeout.as_secs());
            }
        }
    }
}
