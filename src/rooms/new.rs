use axum::{
    Json, debug_handler,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

use crate::{AppResult, session};

use super::admission::AdmissionError;
use super::model::Visibility;
use super::password;

#[derive(Debug, Deserialize)]
pub(crate) struct NewRoomBody {
    name: String,
    visibility: Visibility,
    capacity: u32,
    #[serde(default)]
    password: Option<String>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn new_room(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(body): Json<NewRoomBody>,
) -> AppResult<Response> {
    let Some(owner_id) = session::current_user(&session).await? else {
        return Ok(AdmissionError::Unauthenticated.into_response());
    };

    if body.name.trim().is_empty() {
        return Ok(bad_request("Room name must not be empty"));
    }
    if body.capacity == 0 {
        return Ok(bad_request("Capacity must be at least 1"));
    }

    let password_hash = match (body.visibility, body.password.as_deref()) {
        (Visibility::Private, Some(pw)) if !pw.is_empty() => {
            Some(password::hash(pw).map_err(|e| anyhow::anyhow!("password hash: {e}"))?)
        }
        (Visibility::Private, _) => {
            return Ok(bad_request("Private rooms require a password"));
        }
        (Visibility::Public, _) => None,
    };

    let uuid = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO rooms (uuid,name,is_public,password_hash,capacity,owner_id,participants,current_participants) \
         VALUES (?,?,?,?,?,?,'[]',0)",
    )
    .bind(uuid.to_string())
    .bind(body.name.trim())
    .bind(body.visibility == Visibility::Public)
    .bind(&password_hash)
    .bind(body.capacity as i64)
    .bind(&owner_id)
    .execute(&db_pool)
    .await?;

    info!(room = %uuid, owner = %owner_id, "room created");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Room created",
        "room_id": uuid,
    }))
    .into_response())
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "success": false, "message": message })),
    )
        .into_response()
}
