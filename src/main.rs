/// Chlu Query - reference implementation of the Chlu Query API
///
/// Loads configuration from the environment, brings up the Chlu node and
/// serves the HTTP API until interrupted.
use chlu_query::{
    config::{GatewayConfig, DEFAULT_LOG_FILTER},
    context::AppContext,
    server,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.logging.filter)
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    print_banner();

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start node and server; returns after a graceful shutdown
    server::serve(ctx).await?;

    tracing::info!("Goodbye!");
    Ok(())
}

fn print_banner() {
    println!(
        r#"
   ________    __         ____
  / ____/ /_  / /_  __   / __ \__  _____  _______  __
 / /   / __ \/ / / / /  / / / / / / / _ \/ ___/ / / /
/ /___/ / / / / /_/ /  / /_/ / /_/ /  __/ /  / /_/ /
\____/_/ /_/_/\__,_/   \___\_\__,_/\___/_/   \__, /
                                            /____/
        Chlu API Query v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
