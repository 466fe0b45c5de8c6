use tower_sessions::Session;

use crate::AppResult;

pub const USER_ID: &str = "user_id";

/// Session Provider seam: the authenticated caller's id, if any.
pub async fn current_user(session: &Session) -> AppResult<Option<String>> {
    Ok(session.get::<String>(USER_ID).await?)
}
