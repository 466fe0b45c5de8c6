mod admission;
mod join;
mod model;
mod new;
mod notify;
mod password;
mod room;
mod store;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use admission::{AdmissionError, AdmissionService, Decision, MembershipOutcome, evaluate};
pub use model::{MembershipAttempt, RoomSnapshot, Visibility};
pub use notify::{MembershipChanged, Notifier};
pub use store::{RoomStore, SqliteRoomStore, StoreError, StoreWrite};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", post(new::new_room))
        .route("/{uuid}", get(room::room_state))
        .route("/{uuid}/join", post(join::join))
        .route("/{uuid}/leave", post(join::leave))
        .route("/{uuid}/ws", get(ws::room_ws))
}
