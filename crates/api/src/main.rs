#[tokio::main]
async fn main() {
    bazaar_observability::init();

    let config = bazaar_api::config::ApiConfig::from_env();

    let app = bazaar_api::app::build_app(&config).await;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind listen address");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
