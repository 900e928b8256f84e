use anyhow::{Context, Result};
use std::path::Path;
use tokio::net::TcpListener;

use kwresearch_ads::oauth::{receive_authorization_code, ClientSecret};

/// Run the installed-application consent flow and print the tokens.
pub async fn run_auth(client_secret_path: &Path, port: u16) -> Result<()> {
    let secret = ClientSecret::from_file(client_secret_path)?;

    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .context("Failed to bind loopback listener")?;
    let redirect_uri = format!("http://127.0.0.1:{}/", listener.local_addr()?.port());
    let state = uuid::Uuid::new_v4().simple().to_string();

    let url = secret.authorization_url(&redirect_uri, &state)?;
    println!("Please visit this URL to authorize this application:\n\n{url}\n");
    log::info!("Waiting for the authorization redirect on {}", redirect_uri);

    let code = receive_authorization_code(listener, &state).await?;

    let http = reqwest::Client::new();
    let tokens = secret
        .exchange_code(&http, &code, &redirect_uri)
        .await
        .context("Failed to exchange authorization code")?;

    println!("Access Token: {}", tokens.access_token);
    match tokens.refresh_token {
        Some(refresh_token) => {
            println!("Refresh Token: {refresh_token}");
            println!("\nAdd the refresh token to google-ads.yaml as refresh_token.");
        }
        None => {
            anyhow::bail!(
                "No refresh token returned. Revoke this app's access at \
                 https://myaccount.google.com/permissions and run 'kwresearch auth' again."
            );
        }
    }

    Ok(())
}
