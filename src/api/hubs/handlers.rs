use axum::{
    Json,
    extract::{
        Path,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use serde_json::json;
use uuid::Uuid;

use crate::api::extractors::{AuthCtx, AuthCtxExtractor};
use crate::error::{AppError, ErrorResponse};

use super::dto::NegotiateResponse;

pub const KNOWN_HUBS: &[&str] = &["chat", "notifications"];

fn ensure_known(hub: &str) -> Result<(), AppError> {
    if KNOWN_HUBS.contains(&hub) {
        Ok(())
    } else {
        Err(AppError::not_found(format!("hub {hub}")))
    }
}

#[utoipa::path(
    post,
    path = "/hubs/{hub}/negotiate",
    params(
        ("hub" = String, Path, description = "Hub name"),
        ("access_token" = Option<String>, Query, description = "Access token; honoured on /hubs/ paths only"),
    ),
    responses(
        (status = 200, description = "Connection details", body = NegotiateResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 404, description = "Unknown hub", body = ErrorResponse),
    ),
    security(
        ("Bearer" = []),
        ("access_token" = []),
    ),
    tag = "hubs"
)]
pub async fn negotiate(
    Path(hub): Path<String>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<NegotiateResponse>, AppError> {
    ensure_known(&hub)?;

    let connection_id = Uuid::new_v4();
    tracing::info!(
        %connection_id,
        hub = %hub,
        subject = ctx.subject.as_deref().unwrap_or("-"),
        "hub negotiated"
    );

    Ok(Json(NegotiateResponse {
        connection_id,
        url: format!("/hubs/{hub}"),
        hub,
        available_transports: vec!["WebSockets".to_string()],
    }))
}

pub async fn connect(
    Path(hub): Path<String>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    ensure_known(&hub)?;
    Ok(ws.on_upgrade(move |socket| session(socket, hub, ctx)))
}

/// Greets the caller, then echoes text frames until the peer closes.
async fn session(mut socket: WebSocket, hub: String, ctx: AuthCtx) {
    let greeting = json!({
        "type": "connected",
        "hub": hub,
        "subject": ctx.subject,
    })
    .to_string();

    if socket.send(Message::Text(greeting.into())).await.is_err() {
        return;
    }

    while let Some(message) = socket.recv().await {
        match message {
            Ok(Message::Text(text)) => {
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    tracing::debug!(hub = %hub, "hub session closed");
}
