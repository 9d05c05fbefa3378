use anyhow::Context;

use mail_classifier::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env().context("failed to load configuration")?;

    eprintln!("📬 Mail classifier v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   Provider: {}", config.llm.base_url);
    eprintln!("   Frontend: {}", config.frontend_url);
    eprintln!("   Classify API: http://{}/api/classify", config.bind_addr());
    eprintln!("   Health: http://{}/api/health\n", config.bind_addr());

    mail_classifier::server::serve(config).await?;

    Ok(())
}
