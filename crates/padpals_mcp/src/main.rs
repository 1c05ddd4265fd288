use std::sync::Arc;

use padpals_client::config::Config;
use padpals_client::http_client::ReqwestStorefrontClient;
use padpals_client::navigation::Navigator;
use padpals_client::session::SessionContext;
use padpals_mcp::PadPalsMcpHandler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `PADPALS_LOG_LEVEL`, then `RUST_LOG`, then `info`.
    let log_env = std::env::var("PADPALS_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    let combined_filter = format!("{},rmcp=warn,serve_inner=warn", log_env);
    let env_filter = tracing_subscriber::EnvFilter::try_new(combined_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,rmcp=warn,serve_inner=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::info!("padpals_mcp: log filter: {}", log_env);

    let config = Config::from_env()?;
    let client = ReqwestStorefrontClient::from_config(&config)?;

    let session = match &config.session_path {
        Some(path) => SessionContext::load(path).await.unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "could not restore session; continuing as guest");
            SessionContext::guest()
        }),
        None => SessionContext::guest(),
    };
    let handler = PadPalsMcpHandler::with_session(
        Arc::new(client),
        session,
        Navigator::new(),
        config.session_path.clone(),
    );
    handler.bootstrap().await;

    tracing::info!(
        "padpals_mcp: registered {} tools and {} prompts",
        handler.tool_count(),
        handler.prompt_count()
    );

    tracing::info!("padpals_mcp: starting stdio MCP server...");
    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let server = rmcp::serve_server(handler, transport).await?;
    server.waiting().await?;

    Ok(())
}
