//! HTTP routes.
//!
//! - `GET /heartbeat` - latest device status as JSON, 404 before the
//!   first heartbeat arrives.
//! - `POST /cmd` - validate and forward an operator command; 400 for an
//!   unrecognized command, 502 when the broker is unreachable.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use varal_session::{Error, VaralService};

pub fn router(service: VaralService) -> Router {
    Router::new()
        .route("/heartbeat", get(get_heartbeat))
        .route("/cmd", post(send_command))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct CommandRequest {
    command: String,
}

#[derive(Debug, Serialize)]
struct CommandResponse {
    status: &'static str,
    sent: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

async fn get_heartbeat(State(service): State<VaralService>) -> Response {
    match service.latest_status() {
        Some(record) => Json(record).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                detail: "no heartbeat received from the device yet".to_string(),
            }),
        )
            .into_response(),
    }
}

async fn send_command(
    State(service): State<VaralService>,
    Json(body): Json<CommandRequest>,
) -> Response {
    match service.send_command(&body.command).await {
        Ok(command) => Json(CommandResponse {
            status: "ok",
            sent: command.as_str(),
        })
        .into_response(),
        Err(err @ Error::InvalidCommand(_)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                detail: err.to_string(),
            }),
        )
            .into_response(),
        Err(err) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorBody {
                detail: err.to_string(),
            }),
        )
            .into_response(),
    }
}
