use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::Method,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::handler::PaymasterHandler;
use crate::service::RpcService;

async fn rpc<H: PaymasterHandler + 'static>(
    State(service): State<Arc<RpcService<H>>>,
    body: Bytes,
) -> Json<Value> {
    Json(service.handle_bytes(&body).await)
}

/// Liveness probe.
pub async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}

/// `POST /` serves JSON-RPC, `GET /ping` answers liveness checks.
pub fn router<H: PaymasterHandler + 'static>(service: Arc<RpcService<H>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", post(rpc::<H>))
        .route("/ping", get(ping))
        .layer(cors)
        .with_state(service)
}

/// Bind and start the JSON-RPC server on the specified address.
/// Returns a handle that can be awaited to run the server.
pub async fn bind_rpc_server<H: PaymasterHandler + 'static>(
    addr: SocketAddr,
    service: Arc<RpcService<H>>,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<anyhow::Result<()>>)> {
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!(
        message = "Paymaster RPC server bound successfully",
        address = %bound_addr
    );

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await?;
        Ok(())
    });

    Ok((bound_addr, handle))
}
