use anyhow::{Context, Result};
use colored::Colorize;

use super::App;

/// Without a token, announces the authorization redirect; with one, plays the
/// redirect callback and reconciles the session.
pub async fn login(app: &mut App, token: Option<&str>) -> Result<()> {
    let Some(token) = token else {
        app.shell.login().await.context("Login failed")?;
        let identity = &app.config.identity;
        println!("Authorize at {}", identity.authorization_endpoint.bold());
        println!("  client_id:    {}", identity.client_id);
        println!("  redirect_uri: {}", identity.redirect_uri);
        println!("  scope:        {}", identity.scopes().collect::<Vec<_>>().join(" "));
        println!("Then run `fitgate login --token <token>` with the token you receive.");
        return Ok(());
    };

    app.identity
        .complete_login(token)
        .context("Token could not be decoded")?;
    app.shell
        .poll_identity()
        .context("Identity provider reported an unusable session")?;

    let user = app
        .shell
        .state()
        .current()
        .claims()
        .map(|claims| claims.display_name().to_string())
        .unwrap_or_default();
    println!("{} signed in as {}", "✓".green(), user.bold());
    println!("Location: {}", app.shell.location());
    Ok(())
}

pub async fn logout(app: &mut App) -> Result<()> {
    let was_authenticated = app.shell.state().is_authenticated();
    let navigation = app.shell.logout().await.context("Logout failed")?;
    if was_authenticated {
        println!("{} signed out", "✓".green());
    } else {
        println!("No active session");
    }
    println!("Location: {}", navigation.location);
    Ok(())
}
