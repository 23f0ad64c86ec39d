use crate::session::errors::SessionError;
use crate::session::types::{AUTHENTICATED_USER_ID_KEY, AuthContext};
use crate::userdb::UserExistence;

use super::session::Session;

/// Decides whether the request belongs to a logged-in user.
///
/// A session without a user id is anonymous and the user store is not
/// consulted. A user id whose account no longer exists is demoted to
/// anonymous. A failing user store fails the request.
pub async fn resolve_authentication(
    session: &Session,
    users: &dyn UserExistence,
) -> Result<AuthContext, SessionError> {
    let user_id = session.get_int(AUTHENTICATED_USER_ID_KEY).await;
    if user_id == 0 {
        return Ok(AuthContext::anonymous());
    }

    if users.exists(user_id).await? {
        Ok(AuthContext::authenticated(user_id))
    } else {
        tracing::debug!("User {user_id} from session no longer exists, treating as anonymous");
        Ok(AuthContext::anonymous())
    }
}

/// Records a successful credential check. The session moves to a fresh token.
pub async fn login(session: &Session, user_id: i64) -> Result<(), SessionError> {
    if user_id == 0 {
        return Err(SessionError::InvalidUserId(user_id));
    }
    session.renew_token().await;
    session.put(AUTHENTICATED_USER_ID_KEY, user_id).await?;
    tracing::info!("User {user_id} logged in");
    Ok(())
}

pub async fn logout(session: &Session) {
    session.renew_token().await;
    session.remove(AUTHENTICATED_USER_ID_KEY).await;
}
