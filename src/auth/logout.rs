use axum::{Json, debug_handler, response::{IntoResponse, Response}};
use tower_sessions::Session;

use crate::AppResult;

#[debug_handler]
pub(crate) async fn logout(session: Session) -> AppResult<Response> {
    session.clear().await;
    Ok(Json(serde_json::json!({ "success": true, "message": "Signed out" })).into_response())
}
