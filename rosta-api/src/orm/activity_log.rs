use chrono::Utc;
use diesel::prelude::*;

use crate::models::NewActivityLog;

/// Appends one activity row. Failures are reported but never block the
/// action being logged; callers decide whether to surface them.
pub fn record_activity(
    conn: &mut SqliteConnection,
    target_team_id: i32,
    actor_user_id: Option<i32>,
    action_name: &str,
    actor_ip: Option<String>,
) -> Result<(), diesel::result::Error> {
    use crate::schema::activity_logs::dsl::*;

    let entry = NewActivityLog {
        team_id: target_team_id,
        user_id: actor_user_id,
        action: action_name.to_string(),
        timestamp: Utc::now().naive_utc(),
        ip_address: actor_ip,
    };

    diesel::insert_into(activity_logs)
        .values(&entry)
        .execute(conn)?;

    Ok(())
}
