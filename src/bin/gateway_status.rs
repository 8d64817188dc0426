use anyhow::Context;
use portal_auth::api::HttpSession;
use portal_auth::config::Config;
use portal_auth::{logger, Authenticator};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    logger::init().context("initialize logger")?;

    let config = Config::from_env().context("load config")?;
    let session = HttpSession::new(&config).await?;
    let auth = Authenticator::new(session, &config);

    let running = auth.is_already_running().await?;
    if !running.is_running {
        log::info!("gateway is not running ({:?})", running.data);
        return Ok(());
    }

    match auth.server_process_id() {
        Some(pid) => log::info!("gateway is running (pid {})", pid),
        None => log::info!("gateway is running"),
    }

    let status = auth.is_authenticated().await.context("fetch auth status")?;
    println!("{}", serde_json::to_string_pretty(&status)?);

    if status.authenticated {
        let validation = auth.sso_validate().await.context("validate sso session")?;
        log::info!(
            "sso session of {} is {}",
            validation.user_name.as_deref().unwrap_or("<unknown>"),
            if validation.result { "valid" } else { "invalid" },
        );
    } else if status.connected {
        let reauth = auth.reauthenticate().await.context("reauthenticate")?;
        log::info!("reauthentication: {}", reauth.message);
    }

    Ok(())
}
