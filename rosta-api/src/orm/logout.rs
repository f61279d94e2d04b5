//! Session revocation.

use diesel::prelude::*;

use crate::{orm::DbConn, schema::sessions::dsl::*};

/// Marks a session as revoked. The row is kept for auditing; the token is
/// unusable afterwards. Unknown session ids affect zero rows.
pub async fn revoke_session(db: &DbConn, session_id: &str) -> Result<usize, diesel::result::Error> {
    let session_id = session_id.to_string();
    db.run(move |conn| {
        diesel::update(sessions.filter(id.eq(&session_id)))
            .set(revoked.eq(true))
            .execute(conn)
    })
    .await
}
