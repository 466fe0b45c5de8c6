use axum::{
    Json, debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AppResult, AppState, session};

use super::admission::AdmissionError;
use super::model::Visibility;
use super::store::{RoomStore, SqliteRoomStore};

/// Room state for UI refresh after a membership-change notification.
/// Private rooms are visible to their members and owner only.
#[debug_handler(state = AppState)]
pub(crate) async fn room_state(
    Path(room_id): Path<Uuid>,
    State(store): State<SqliteRoomStore>,
    session: Session,
) -> AppResult<Response> {
    let room = match store.get_room(room_id).await {
        Ok(Some(room)) => room,
        Ok(None) => return Ok(AdmissionError::RoomNotFound.into_response()),
        Err(err) => return Ok(AdmissionError::from(err).into_response()),
    };

    if room.visibility == Visibility::Private {
        let caller = session::current_user(&session).await?;
        let visible = caller
            .as_deref()
            .is_some_and(|user| user == room.owner_id || room.is_member(user));
        if !visible {
            return Ok(AdmissionError::RejectVisibility.into_response());
        }
    }

    Ok(Json(serde_json::json!({
        "id": room.id,
        "name": room.name,
        "visibility": room.visibility,
        "capacity": room.capacity,
        "owner_id": room.owner_id,
        "participants": room.participants,
        "participant_count": room.occupancy(),
    }))
    .into_response())
}
