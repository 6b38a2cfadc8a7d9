use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::Redirect,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::error::ApiError;

/// Session key under which the authenticated user's identity is stored.
pub const USER_KEY: &str = "user";
/// Session key for the logged-in flag.
pub const LOGGED_IN_KEY: &str = "logged_in";

/// Identity of the authenticated caller. Resolved once per request by the
/// extractor below and passed explicitly into every service call, so the
/// repository and stats code never touch ambient session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Write the authenticated identity into the session. Called on login and
/// on registration (auto-login).
pub async fn establish(session: &Session, user: &User) -> Result<(), ApiError> {
    session.insert(USER_KEY, CurrentUser::from(user)).await?;
    session.insert(LOGGED_IN_KEY, true).await?;
    Ok(())
}

/// Clear all session state and rotate the session id, so the old cookie no
/// longer authenticates and cannot be fixated.
pub async fn destroy(session: &Session) -> Result<(), ApiError> {
    session.clear().await;
    session.cycle_id().await?;
    Ok(())
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    /// Guard failure, not an error: unauthenticated callers are steered to
    /// the login flow.
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| Redirect::to("/login"))?;

        let logged_in = session
            .get::<bool>(LOGGED_IN_KEY)
            .await
            .ok()
            .flatten()
            .unwrap_or(false);
        let user = session.get::<CurrentUser>(USER_KEY).await.ok().flatten();

        match user {
            Some(user) if logged_in => Ok(user),
            _ => Err(Redirect::to("/login")),
        }
    }
}
