//! Session-based authentication and authorization guards for Rocket routes.
//!
//! A request is authenticated by its `session` cookie: the token must match
//! a session row that is neither revoked nor expired, and the session's
//! user must still exist. Authorization is role-based and deliberately
//! flat — a user is either a team `owner` or a `member` (the `role` column
//! on `users`).
//!
//! ```rust
//! use rocket::get;
//! use rosta_api::session_guards::{AuthenticatedUser, OwnerUser};
//!
//! #[get("/profile")]
//! fn profile(user: AuthenticatedUser) -> String {
//!     format!("Signed in as {}", user.user.email)
//! }
//!
//! #[get("/owner-tools")]
//! fn owner_tools(user: OwnerUser) -> String {
//!     format!("Owner access granted to {}", user.user.email)
//! }
//! ```

use chrono::Utc;
use diesel::prelude::*;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};

use crate::models::{Session, User};
use crate::orm::DbConn;
use crate::schema::{sessions, users};

/// A request guard for routes that require an authenticated user.
///
/// # Returns
/// - `Outcome::Success(AuthenticatedUser)` if the session cookie resolves
///   to a live session and user
/// - `Outcome::Error(Status::Unauthorized)` otherwise
/// - `Outcome::Error(Status::InternalServerError)` if no database
///   connection is available
#[derive(Debug)]
pub struct AuthenticatedUser {
    pub user: User,
}

impl AuthenticatedUser {
    pub fn is_owner(&self) -> bool {
        self.user.is_owner()
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let cookies = request.cookies();
        let db = match request.guard::<DbConn>().await {
            Outcome::Success(db) => db,
            _ => return Outcome::Error((Status::InternalServerError, ())),
        };

        let session_cookie = match cookies.get("session") {
            Some(cookie) => cookie,
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        let session_id = session_cookie.value().to_string();

        let session_result = db
            .run(move |conn| {
                sessions::table
                    .filter(sessions::id.eq(&session_id))
                    .filter(sessions::revoked.eq(false))
                    .filter(
                        sessions::expires_at
                            .is_null()
                            .or(sessions::expires_at.gt(Utc::now().naive_utc())),
                    )
                    .first::<Session>(conn)
                    .optional()
            })
            .await;

        let session = match session_result {
            Ok(Some(sess)) => sess,
            Ok(None) => return Outcome::Error((Status::Unauthorized, ())),
            Err(e) => {
                error!("Database error finding session: {:?}", e);
                return Outcome::Error((Status::Unauthorized, ()));
            }
        };

        let user_result = db
            .run(move |conn| {
                users::table
                    .filter(users::id.eq(session.user_id))
                    .first::<User>(conn)
                    .optional()
            })
            .await;

        match user_result {
            Ok(Some(user)) => Outcome::Success(AuthenticatedUser { user }),
            Ok(None) => Outcome::Error((Status::Unauthorized, ())),
            Err(e) => {
                error!("Database error finding user: {:?}", e);
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}

/// A request guard that additionally requires the `owner` role.
///
/// Roster creation and other team-level mutations are owner-only; members
/// get `Status::Forbidden`.
#[derive(Debug)]
pub struct OwnerUser {
    pub user: User,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for OwnerUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let auth_user = match AuthenticatedUser::from_request(request).await {
            Outcome::Success(user) => user,
            Outcome::Error(e) => return Outcome::Error(e),
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        if auth_user.is_owner() {
            Outcome::Success(OwnerUser {
                user: auth_user.user,
            })
        } else {
            Outcome::Error((Status::Forbidden, ()))
        }
    }
}
