mod handlers;
mod identity;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, patch, post},
    Router,
};

use crate::api::API;
use crate::error::{server_error, Error};
use crate::server::handlers::{accounts, events, messages, rides};

pub use identity::USER_ID_HEADER;

type DynAPI = Arc<dyn API + Send + Sync>;

pub fn router<T: API + Sync + Send + 'static>(api: T) -> Router {
    let api = Arc::new(api) as DynAPI;

    Router::new()
        .route("/rides", post(rides::create))
        .route("/rides/:id", get(rides::find))
        .route("/rides/:id/accept", patch(rides::accept))
        .route("/rides/:id/complete", patch(rides::complete))
        .route("/rides/:id/cancel", patch(rides::cancel))
        .route(
            "/rides/:id/messages",
            post(messages::send).get(messages::find),
        )
        .route("/available_rides", get(rides::available))
        .route("/users/:id/rides/active", get(rides::active))
        .route("/users/:id/rides/completed", get(rides::completed))
        .route("/users/:id/balance", get(accounts::balance))
        .route("/events", get(events::find))
        .route("/events/stream", get(events::stream))
        .layer(Extension(api))
}

pub async fn serve(app: Router, addr: SocketAddr) -> Result<(), Error> {
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(server_error)
}
