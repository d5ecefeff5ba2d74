//! HTTP control surface: router assembly and request plumbing.

pub mod routes;

use axum::extract::{FromRequest, Request};
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::RoomError;
use crate::room::registry::RoomRegistry;
use crate::ws;

#[derive(Clone)]
pub struct AppState {
    pub rooms: RoomRegistry,
}

/// JSON extractor whose rejection keeps the `{error}` body shape.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RoomError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(RoomError::bad_request(rejection.body_text())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/api/rooms", post(routes::create_room))
        .route("/api/rooms/:code", get(routes::get_room))
        .route("/api/rooms/:code/join", post(routes::join_room))
        .route("/api/rooms/:code/admissions", post(routes::review_admission))
        .route("/api/rooms/:code/start", post(routes::start_game))
        .route("/api/rooms/:code/call", post(routes::call_number))
        .route("/api/rooms/:code/draft", post(routes::update_draft))
        .route("/api/rooms/:code/submit", post(routes::submit_answers))
        .route("/api/rooms/:code/end", post(routes::end_round))
        .route("/api/rooms/:code/score", post(routes::score_submission))
        .route("/api/rooms/:code/publish", post(routes::publish_round))
        .route("/api/rooms/:code/discard", post(routes::discard_round))
        .route("/api/rooms/:code/cancel", post(routes::cancel_game))
        .route("/api/rooms/:code/finish", post(routes::finish_game))
        .route("/ws/:code", get(ws::connection::ws_handler))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
