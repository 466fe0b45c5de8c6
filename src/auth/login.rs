use axum::{
    Json, debug_handler,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::{AppResult, session::USER_ID};

#[derive(Debug, Deserialize)]
pub(crate) struct LoginBody {
    user_id: String,
}

/// Dev-grade session sign-in: stores the supplied id as the caller identity.
/// Real identity-provider glue lives outside this service.
#[debug_handler]
pub(crate) async fn login(
    session: Session,
    Json(LoginBody { user_id }): Json<LoginBody>,
) -> AppResult<Response> {
    let user_id = user_id.trim().to_owned();
    if user_id.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "success": false, "message": "user_id must not be empty" })),
        )
            .into_response());
    }

    session.insert(USER_ID, user_id.clone()).await?;
    info!("welcome u/{user_id}");

    Ok(Json(serde_json::json!({ "success": true, "message": "Signed in" })).into_response())
}
