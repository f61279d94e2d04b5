//! Startup fairing that seeds the default team and owner account.
//!
//! Set `ROSTA_TEAM_NAME`, `ROSTA_OWNER_EMAIL` and `ROSTA_OWNER_PASSWORD` to
//! control the seeded data; reasonable defaults are used otherwise so a
//! fresh database is immediately usable.

use diesel::prelude::*;
use dotenvy::dotenv;
use rocket::Rocket;
use rocket::fairing::AdHoc;

use crate::models::{Team, UserInput};
use crate::orm::DbConn;
use crate::orm::login::hash_password;
use crate::orm::team::{get_team_by_name, insert_team};
use crate::orm::team_member::add_team_member;
use crate::orm::user::{get_user_by_email, insert_user};

pub fn bootstrap_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Team Bootstrap", |rocket| async {
        dotenv().ok();

        let conn = match DbConn::get_one(&rocket).await {
            Some(conn) => conn,
            None => {
                error!("[bootstrap] ERROR: Could not get DB connection.");
                return Err(rocket);
            }
        };

        match conn.run(ensure_default_team_and_owner).await {
            Ok(()) => Ok(rocket),
            Err(e) => {
                error!("[bootstrap] ERROR seeding default team/owner: {:?}", e);
                Err(rocket)
            }
        }
    })
}

fn find_or_create_team(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Team, diesel::result::Error> {
    match get_team_by_name(conn, name)? {
        Some(team) => {
            info!("[bootstrap] Matched team: '{}'", name);
            Ok(team)
        }
        None => {
            info!("[bootstrap] Creating team: '{}'", name);
            insert_team(conn, name.to_string())
        }
    }
}

fn ensure_default_team_and_owner(
    conn: &mut SqliteConnection,
) -> Result<(), diesel::result::Error> {
    let team_name =
        std::env::var("ROSTA_TEAM_NAME").unwrap_or_else(|_| "Rosta Team".to_string());
    let team = find_or_create_team(conn, &team_name)?;

    let owner_email =
        std::env::var("ROSTA_OWNER_EMAIL").unwrap_or_else(|_| "owner@rosta.local".to_string());
    if get_user_by_email(conn, &owner_email)?.is_some() {
        return Ok(());
    }

    let owner_password = std::env::var("ROSTA_OWNER_PASSWORD").unwrap_or_else(|_| {
        warn!("[bootstrap] ROSTA_OWNER_PASSWORD not set; using default password");
        "changeme".to_string()
    });

    let owner = insert_user(
        conn,
        UserInput {
            name: Some("Owner".to_string()),
            email: owner_email.clone(),
            password_hash: hash_password(&owner_password),
            role: "owner".to_string(),
            hourly_rate: 0.0,
            max_weekly_hours: 40,
            min_weekly_hours: 0,
            seniority: 0,
            position: String::new(),
        },
    )?;
    add_team_member(conn, owner.id, team.id, "owner")?;

    info!("[bootstrap] Created owner account '{}'", owner_email);
    Ok(())
}
