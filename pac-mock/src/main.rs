use pac_mock::{MockState, router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pac_mock=info".into()),
        )
        .init();

    let addr = std::env::var("PAC_MOCK_ADDR").unwrap_or_else(|_| "127.0.0.1:8090".into());
    let token = std::env::var("PAC_MOCK_TOKEN").ok();

    let state = Arc::new(MockState::new(token));
    let listener = TcpListener::bind(&addr).await?;

    info!("Mock PAC listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}
