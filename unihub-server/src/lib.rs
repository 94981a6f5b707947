mod auth;
mod config;
mod context;
mod docs;
mod errors;
mod events;
mod schemas;
mod serialized;
mod session;
mod sysadmin;
mod users;

use std::{
    net::{Ipv6Addr, SocketAddr},
    sync::Arc,
};

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub use config::{ServerConfig, DEFAULT_PORT};
pub use context::{Campus, ServerContext};

pub type Router = axum::Router<ServerContext>;

/// Starts the unihub server
pub async fn run_server(campus: Arc<Campus>, config: ServerConfig) {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, config.port).into();

    let cors = cors_layer(&config);

    let context = ServerContext {
        campus,
        config: Arc::new(config),
    };

    let version_one_router = Router::new()
        .nest("/auth", auth::router())
        .nest("/events", events::router())
        .nest("/sysadmin", sysadmin::router())
        .nest("/users", users::router());

    let root_router = Router::new()
        .nest("/v1", version_one_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context);

    let listener = TcpListener::bind(&addr).await.expect("listens on address");

    axum::serve(listener, root_router.into_make_service())
        .await
        .expect("server runs");
}

/// The frontend sends the session cookie cross-origin, so the allowed
/// origins are explicit and credentials are on. A wildcard would be refused
/// by the browser for credentialed requests anyway.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
