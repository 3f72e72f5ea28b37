use mock_server::MockConfig;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt::init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let defaults = MockConfig::default();
    let config = MockConfig {
        api_key: std::env::var("RTM_API_KEY").unwrap_or(defaults.api_key),
        shared_secret: std::env::var("RTM_SHARED_SECRET").unwrap_or(defaults.shared_secret),
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, api_key = %config.api_key, "mock service listening");
    mock_server::run_with(listener, config).await
}
