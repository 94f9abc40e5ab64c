use std::error::Error;

use likeburst::{LikeClient, ServiceConfig, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .with_target(false)
        .init();

    let config = ServiceConfig::from_env()?;
    let client = LikeClient::builder()
        .with_config(config.client.clone())
        .build()?;

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    server::serve(listener, client).await?;
    Ok(())
}
