use std::collections::HashMap;

use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, Method, StatusCode,
    },
    response::Response,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use application::services::SendDirectMessageRequest;
use application::{MessageDto, NotificationDto};

use crate::{error::ApiError, state::AppState, ws_connection::WebSocketConnection};

#[derive(Debug, Deserialize)]
struct SendMessagePayload {
    message: String,
}

pub fn router(state: AppState) -> Router {
    // 前端跨域访问，带上 Authorization 头
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(websocket_upgrade))
        .route("/message/send/{receiver_id}", post(send_message))
        // 静态段优先于参数段，latest-per-user 不会被吞掉
        .route("/message/latest-per-user", get(latest_per_user))
        .route("/message/{counterparty_id}", get(get_thread))
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/read", patch(mark_notification_read))
        .route("/notifications/clear-all", delete(clear_notifications))
        .route("/presence/online", get(online_users))
        .layer(cors)
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// 升级本身不做认证，连接通过 setup 事件绑定身份。
async fn websocket_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| WebSocketConnection::new(state).run(socket))
}

async fn send_message(
    State(state): State<AppState>,
    Path(receiver_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<SendMessagePayload>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let identity = state.jwt_service.extract_identity_from_headers(&headers)?;

    let stored = state
        .messaging_service
        .send(SendDirectMessageRequest {
            sender_id: identity.id,
            receiver_id,
            body: payload.message,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(MessageDto::from(&stored))))
}

async fn latest_per_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<HashMap<Uuid, MessageDto>>, ApiError> {
    let identity = state.jwt_service.extract_identity_from_headers(&headers)?;

    let items = state
        .messaging_service
        .latest_per_counterparty(identity.id)
        .await?;

    let dtos = items
        .into_iter()
        .map(|(counterparty, message)| (counterparty, MessageDto::from(&message)))
        .collect();

    Ok(Json(dtos))
}

async fn get_thread(
    State(state): State<AppState>,
    Path(counterparty_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let identity = state.jwt_service.extract_identity_from_headers(&headers)?;

    let thread = state
        .messaging_service
        .get_thread(identity.id, counterparty_id)
        .await?;

    Ok(Json(thread.iter().map(MessageDto::from).collect()))
}

async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<NotificationDto>>, ApiError> {
    let identity = state.jwt_service.extract_identity_from_headers(&headers)?;

    let items = state
        .notification_service
        .list_for_user(identity.id)
        .await?;

    Ok(Json(items))
}

async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    state.jwt_service.extract_identity_from_headers(&headers)?;
    state.notification_service.mark_read(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn clear_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let identity = state.jwt_service.extract_identity_from_headers(&headers)?;
    state.notification_service.clear_all(identity.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn online_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Uuid>>, ApiError> {
    state.jwt_service.extract_identity_from_headers(&headers)?;

    let users = state.hub.online_users().await;
    Ok(Json(users.into_iter().map(Uuid::from).collect()))
}
