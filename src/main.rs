/// Earl Box - file upload and download service
use earl_box::{
    config::{LogFormat, LoggingConfig, ServerConfig},
    context::AppContext,
    error::AppResult,
    jobs, server,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize logging
    init_tracing(&config.logging);

    // Print banner
    print_banner();

    // Create application context
    let ctx = AppContext::new(config).await?;
    let ctx = Arc::new(ctx);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    // Start server
    server::serve((*ctx).clone()).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level)
        .unwrap_or_else(|_| EnvFilter::new(earl_box::config::DEFAULT_LOG_FILTER));

    let (json, pretty) = match logging.format {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .init();
}

fn print_banner() {
    println!(
        r#"
    ______           __   ____
   / ____/___ ______/ /  / __ )____  _  __
  / __/ / __ `/ ___/ /  / __  / __ \| |/_/
 / /___/ /_/ / /  / /  / /_/ / /_/ />  <
/_____/\__,_/_/  /_/  /_____/\____/_/|_|

        File upload service v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
