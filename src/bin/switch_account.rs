use anyhow::Context;
use dialoguer::theme::ColorfulTheme;
use portal_auth::api::HttpSession;
use portal_auth::config::Config;
use portal_auth::{logger, Authenticator};

async fn prompt_account_id() -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || {
        dialoguer::Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Account to switch to")
            .report(false)
            .interact_text()
    })
    .await
    .context("join prompt")?
    .context("prompt for account id")
}

/// Usage: `switch_account [account-id]`, prompts when no id is given.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    logger::init().context("initialize logger")?;

    let config = Config::from_env().context("load config")?;
    let session = HttpSession::new(&config).await?;
    let auth = Authenticator::new(session, &config);

    if !auth.check_auth().await {
        anyhow::bail!("not authenticated, run gateway_login first");
    }

    let account_id = match std::env::args().nth(1) {
        Some(account_id) => account_id,
        None => prompt_account_id().await?,
    };

    let account = auth
        .update_server_account(account_id.trim())
        .await
        .context("switch account")?;

    if account.set {
        log::info!(
            "switched to {}",
            account.account_id.as_deref().unwrap_or(account_id.trim())
        );
    } else {
        log::warn!("gateway didn't switch to {}", account_id.trim());
    }

    Ok(())
}
