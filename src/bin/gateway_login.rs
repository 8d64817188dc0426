use anyhow::Context;
use portal_auth::api::HttpSession;
use portal_auth::config::Config;
use portal_auth::{logger, Authenticator, Login};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    logger::init().context("initialize logger")?;

    let config = Config::from_env().context("load config")?;
    let session = HttpSession::new(&config).await?;
    let auth = Authenticator::new(session, &config);

    match auth.login().await.context("bring up gateway")? {
        Login::Launched(pid) => {
            log::info!("log in at {} (gateway pid {})", config.gateway_url, pid)
        }
        Login::AlreadyRunning(Some(pid)) => log::info!("using running gateway (pid {})", pid),
        Login::AlreadyRunning(None) => log::info!("using running gateway"),
    }

    tokio::select! {
        res = auth.wait_until_authenticated(config.auth_poll, config.auth_timeout) => {
            res.context("wait for login")?;
        }
        res = tokio::signal::ctrl_c() => {
            res.context("listen for ctrl-c")?;
            log::warn!("interrupted before the login completed");
            return Ok(());
        }
    }

    let status = auth.is_authenticated().await.context("fetch auth status")?;
    println!("{}", serde_json::to_string_pretty(&status)?);

    Ok(())
}
