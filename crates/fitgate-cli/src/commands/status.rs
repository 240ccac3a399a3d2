use anyhow::Result;
use colored::Colorize;
use fitgate_core::session::{RestoreOutcome, SessionCredential};

use super::App;

pub fn run(app: &App) -> Result<()> {
    println!("Session store: {}", app.session_file.display());
    if let RestoreOutcome::Discarded { reason } = &app.restored {
        println!("Restore:       {} ({})", "discarded".yellow(), reason);
    }

    match app.shell.state().current() {
        SessionCredential::Anonymous => {
            println!("User:          {}", "signed out".dimmed());
        }
        SessionCredential::Authenticated { token, claims } => {
            println!("User:          {} ({})", claims.display_name(), claims.subject());
            if let Some(email) = &claims.email {
                println!("Email:         {}", email);
            }
            println!("Token:         {}", abbreviate(&token));
        }
    }

    let ready = if app.shell.is_ready() {
        "ready".green()
    } else {
        "not ready".yellow()
    };
    println!("Session:       {}", ready);
    if app.identity.is_login_pending() {
        println!("Login:         {}", "pending".cyan());
    }

    let tree = if app.shell.routes().is_authenticated() {
        "authenticated"
    } else {
        "unauthenticated"
    };
    println!("Route tree:    {}", tree);
    println!("Location:      {}", app.shell.location());
    Ok(())
}

fn abbreviate(token: &str) -> String {
    const SHOWN: usize = 12;
    match token.char_indices().nth(SHOWN) {
        Some((cut, _)) => format!("{}… ({} chars)", &token[..cut], token.chars().count()),
        None => token.to_string(),
    }
}
