//! `palaver serve` -- run the HTTP API until Ctrl+C or SIGTERM.

use console::style;

use palaver_types::config::AuthProviderKind;

use crate::http::router::build_router;
use crate::state::AppState;

pub async fn serve(state: AppState, bind: Option<String>) -> anyhow::Result<()> {
    let addr = bind.unwrap_or_else(|| state.config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let (provider, model) = state.chat_service.inference_provider();
    tracing::info!(
        %addr,
        identity = state.chat_service.identity_provider(),
        provider,
        model,
        "Server starting"
    );

    println!(
        "  {} Palaver API listening on {}",
        style("⚡").bold(),
        style(format!("http://{addr}")).cyan()
    );
    println!(
        "  {}  {} / {}",
        style("Model:").bold(),
        style(provider).dim(),
        style(model).dim()
    );
    if state.config.auth.provider == AuthProviderKind::Local && state.keys.list_users().await?.is_empty() {
        println!(
            "  {} No users yet. Create one with {}",
            style("!").yellow().bold(),
            style("palaver user add --email <email>").cyan()
        );
    }
    println!("  {}", style("Press Ctrl+C to stop").dim());

    let router = build_router(state.clone());
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.db_pool.close().await;
    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
