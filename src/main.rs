use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use ronda::identity::{IdentityProvider, StaticIdentity};
use ronda::store::postgres::{create_pool, run_migrations, PgDocumentStore};
use ronda::store::DocumentStore;
use ronda::{config, review, routes, state};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ronda=info,tower_http=info".into()),
        )
        .init();

    let config = Arc::new(config::Config::from_env()?);

    let pool = create_pool(&config.database_url).await?;
    run_migrations(pool.as_ref()).await?;
    let store: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::new(pool));

    let identity: Arc<dyn IdentityProvider> =
        Arc::new(StaticIdentity::new(config.dev_actor.clone()));

    let state = Arc::new(state::AppState {
        review: review::ReviewWorkflow::new(store),
        identity,
        config: config.clone(),
    });

    let app = Router::new()
        .route("/api/submissions", post(routes::create_submission))
        .route("/api/submissions/mine", get(routes::my_submissions))
        .route("/api/submissions/:submission_id", get(routes::get_submission))
        .route(
            "/api/submissions/:submission_id/revise",
            post(routes::revise_submission),
        )
        .route(
            "/api/review/:token",
            get(routes::review_target).post(routes::submit_review),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Ronda listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
