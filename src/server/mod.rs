mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::API;
use crate::server::handlers::{distances, fares};

pub type DynAPI = Arc<dyn API + Send + Sync>;

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/fare", get(fares::estimate))
        .route("/api/distance", get(distances::measure))
        .layer(Extension(api))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) {
    let app = router(Arc::new(api) as DynAPI);

    tracing::info!("listening on {}", addr);

    if let Err(err) = axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
    {
        tracing::error!("server stopped: {}", err);
    }
}

async fn root() -> &'static str {
    "Ridewise Backend Running"
}
