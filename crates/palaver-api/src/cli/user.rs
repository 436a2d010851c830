//! `palaver user` -- local users and their API tokens.

use console::style;

use palaver_types::config::AuthProviderKind;
use palaver_types::error::RepositoryError;

use crate::state::AppState;

pub async fn add_user(
    state: &AppState,
    email: &str,
    name: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    if !email.contains('@') {
        anyhow::bail!("'{email}' does not look like an email address");
    }
    if state.config.auth.provider != AuthProviderKind::Local {
        tracing::warn!("auth.provider is not local; this token will not be accepted by the server");
    }

    let (user, token) = match state.keys.create_user(email, name).await {
        Ok(created) => created,
        Err(RepositoryError::Conflict(_)) => anyhow::bail!("A user with email '{email}' already exists"),
        Err(e) => return Err(e.into()),
    };

    if json {
        let out = serde_json::json!({ "user": user, "token": token });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Created {}",
        style("✓").green().bold(),
        style(user.display_label()).cyan()
    );
    println!();
    println!(
        "  {} API token (save this -- it won't be shown again):",
        style("🔑").bold()
    );
    println!();
    println!("  {}", style(&token).yellow().bold());
    println!();
    println!(
        "  {}",
        style(format!("Sign in with: palaver login --token {token}")).dim()
    );
    println!();
    Ok(())
}

pub async fn list_users(state: &AppState, json: bool) -> anyhow::Result<()> {
    let users = state.keys.list_users().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("\n  {}\n", style("No users yet.").dim());
        return Ok(());
    }

    println!();
    for user in &users {
        println!(
            "  {}  {}  {}",
            style(&user.id).dim(),
            style(&user.email).cyan(),
            user.display_name.as_deref().unwrap_or("")
        );
    }
    println!();
    Ok(())
}
