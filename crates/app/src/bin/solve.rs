// Kata Solver - one-shot prompt runner

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kata_app::KataSolverFacade;
use kata_common::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .pretty()
        .init();

    let prompt = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if prompt.trim().is_empty() {
        anyhow::bail!("usage: solve <prompt>");
    }

    let facade = KataSolverFacade::from_env().map_err(|e| {
        error!("Failed to initialize kata solver: {}", e);
        e
    })?;

    info!(model = %facade.config().default_model, "Starting conversation");

    let reply = facade.start_conversation(&prompt).await.map_err(|e| {
        error!(code = e.error_code(), "Conversation failed: {}", e);
        e
    })?;

    let breakdown = facade
        .solver()
        .get_conversation_token_breakdown(reply.conversation_id)
        .await?;

    println!("{}", reply.response);
    println!(
        "\n[conversation {} | {} tokens across {} messages]",
        reply.conversation_id, breakdown.total_tokens, breakdown.message_count
    );

    Ok(())
}
