use anyhow::Context;
use portal_auth::api::HttpSession;
use portal_auth::config::Config;
use portal_auth::process::GatewayPid;
use portal_auth::{logger, Authenticator};

/// Usage: `gateway_close [pid]`, without a pid the running gateway is looked up.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    logger::init().context("initialize logger")?;

    let pid = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<GatewayPid>().context("parse pid argument"))
        .transpose()?;

    let config = Config::from_env().context("load config")?;
    let session = HttpSession::new(&config).await?;
    let auth = Authenticator::new(session, &config);

    if pid.is_none() && !auth.is_already_running().await?.is_running {
        log::info!("gateway is not running");
        return Ok(());
    }

    let output = auth.close_gateway(pid).await?;
    if !output.trim().is_empty() {
        println!("{}", output.trim());
    }

    Ok(())
}
