use axum::{Router, routing::post};
use clap::Parser;
use dotenv::dotenv;
use tower_http::cors::{Any, CorsLayer};

use nl2gql::web::handlers::query_handler;
use nl2gql::{AppState, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("nl2gql=info".parse()?),
        )
        .init();

    let port = args.listen_port();
    let app_state = AppState::new(&args)?;

    let app = Router::new()
        .route("/query", post(query_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!("server running on http://0.0.0.0:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
