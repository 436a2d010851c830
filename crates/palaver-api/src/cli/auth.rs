//! `palaver login`, `logout` and `whoami`.
//!
//! Login behaves like the login page: with a live session it sends you on to
//! the chat instead of asking for credentials again.

use console::style;
use dialoguer::{Input, Password};

use palaver_core::session::{GateState, Route, SessionGate, SessionStore};
use palaver_core::view::ProfileView;
use palaver_types::identity::AuthSession;

use crate::state::ClientState;

pub async fn login(
    client: &ClientState,
    email: Option<String>,
    token: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut gate = SessionGate::new();
    gate.check(client.store.as_ref()).await;
    if gate.redirect_for(Route::Login) == Some(Route::Chat) && token.is_none() && email.is_none() {
        let label = gate.user().map(|u| u.display_label().to_string()).unwrap_or_default();
        if json {
            println!("{}", serde_json::json!({ "signed_in": true, "user": gate.user() }));
        } else {
            println!(
                "\n  {} Already signed in as {}. Run {} to start chatting.\n",
                style("✓").green().bold(),
                style(label).cyan(),
                style("palaver chat").cyan()
            );
        }
        return Ok(());
    }

    let session = match token {
        Some(token) => client.store.sign_in_with_token(&token).await?,
        None if client.store.supports_password() => {
            let email = match email {
                Some(email) => email,
                None => Input::<String>::new().with_prompt("Email").interact_text()?,
            };
            let password = Password::new().with_prompt("Password").interact()?;
            client.store.sign_in_with_password(&email, &password).await?
        }
        None => {
            if email.is_some() {
                anyhow::bail!(
                    "Password sign-in needs auth.provider = \"gotrue\"; use --token with a key from `palaver user add`"
                );
            }
            let token = Password::new().with_prompt("API token").interact()?;
            client.store.sign_in_with_token(&token).await?
        }
    };

    print_signed_in(&session, json)?;
    Ok(())
}

fn print_signed_in(session: &AuthSession, json: bool) -> anyhow::Result<()> {
    if json {
        let out = serde_json::json!({
            "signed_in": true,
            "user": session.user,
            "expires_at": session.expires_at,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "\n  {} Signed in as {}\n",
        style("✓").green().bold(),
        style(session.user.display_label()).cyan()
    );
    Ok(())
}

pub async fn logout(client: &ClientState, json: bool) -> anyhow::Result<()> {
    client.store.sign_out().await?;
    if json {
        println!("{}", serde_json::json!({ "signed_in": false }));
    } else {
        println!("\n  {} Signed out.\n", style("✓").green().bold());
    }
    Ok(())
}

pub async fn whoami(client: &ClientState, json: bool) -> anyhow::Result<()> {
    let mut view = ProfileView::new(client.store.clone(), client.api.clone());

    if let GateState::RedirectingToLogin = view.mount().await {
        if json {
            println!("{}", serde_json::json!({ "signed_in": false }));
        } else {
            print_login_hint();
        }
        return Ok(());
    }

    let Some(profile) = view.profile() else {
        print_login_hint();
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(profile)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(profile.display_label()).cyan().bold());
    println!("  {}  {}", style("Email:").bold(), profile.email);
    println!("  {}     {}", style("Id:").bold(), style(&profile.id).dim());
    if let Some(avatar) = &profile.avatar_url {
        println!("  {} {}", style("Avatar:").bold(), style(avatar).dim());
    }
    println!(
        "  {} {}",
        style("Server:").bold(),
        style(&client.config.client.server_url).dim()
    );
    println!();
    Ok(())
}

pub fn print_login_hint() {
    println!(
        "\n  {} Not signed in. Run {} first.\n",
        style("!").yellow().bold(),
        style("palaver login").cyan()
    );
}
