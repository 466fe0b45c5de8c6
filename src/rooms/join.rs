use axum::{
    Json, debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AppResult, AppState, session};

use super::admission::{AdmissionError, AdmissionService, MembershipOutcome};
use super::store::SqliteRoomStore;

#[derive(Debug, Deserialize)]
pub(crate) struct JoinBody {
    #[serde(default)]
    password: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn join(
    Path(room_id): Path<Uuid>,
    State(admissions): State<AdmissionService<SqliteRoomStore>>,
    session: Session,
    Json(JoinBody { password }): Json<JoinBody>,
) -> AppResult<Response> {
    let caller = session::current_user(&session).await?;
    let outcome = admissions
        .join(room_id, caller.as_deref(), password.as_deref())
        .await;
    Ok(membership_response(outcome))
}

#[debug_handler(state = AppState)]
pub(crate) async fn leave(
    Path(room_id): Path<Uuid>,
    State(admissions): State<AdmissionService<SqliteRoomStore>>,
    session: Session,
) -> AppResult<Response> {
    let caller = session::current_user(&session).await?;
    let outcome = admissions.leave(room_id, caller.as_deref()).await;
    Ok(membership_response(outcome))
}

// The boundary stays {success, message}; the typed error picks the status
// and the specific message.
fn membership_response(outcome: Result<MembershipOutcome, AdmissionError>) -> Response {
    match outcome {
        Ok(outcome) => Json(serde_json::json!({
            "success": true,
            "message": outcome.message(),
        }))
        .into_response(),
        Err(err) => err.into_response(),
    }
}
