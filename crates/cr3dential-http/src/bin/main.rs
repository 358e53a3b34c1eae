use cr3dential_http::config::http_config;
use cr3dential_http::server;
use log::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = (**http_config()).clone();
    info!("{}", config);

    server::server(config).await?.await?;
    Ok(())
}
