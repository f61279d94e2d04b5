//! Test support: in-memory databases, seeded test data, and preconfigured
//! Rocket instances.
//!
//! Unit tests grab a bare connection from `setup_test_db()`; integration
//! tests build a full application with `test_rocket()` (or
//! `test_rocket_with_generator()` to script the model's behavior) against a
//! uniquely-named shared in-memory SQLite database.

use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use rocket::figment::{
    util::map,
    value::{Map, Value},
};
use rocket::{Build, Rocket, fairing::AdHoc};
use rocket_sync_db_pools::diesel;

use super::db::{DbConn, run_pending_migrations, set_foreign_keys};
use crate::bootstrap_fairing::bootstrap_fairing;
use crate::generation::Generator;
use crate::generation::client::StubGenerator;
use crate::jobs::generation_worker_fairing;
use crate::models::{Team, User, UserInput};
use crate::orm::login::hash_password;
use crate::orm::team::{get_team_by_name, insert_team};
use crate::orm::team_member::add_team_member;
use crate::orm::user::{get_user_by_email, insert_user};

/// Configures SQLite with performance-optimized settings for testing.
///
/// `synchronous = OFF` and `journal_mode = OFF` make SQLite faster but less
/// durable - only use for testing.
fn set_sqlite_test_pragmas(conn: &mut diesel::SqliteConnection) {
    conn.batch_execute(
        r#"
        PRAGMA synchronous = OFF;
        PRAGMA journal_mode = OFF;
        "#,
    )
    .expect("Failed to set SQLite PRAGMAs");
}

fn set_sqlite_test_pragmas_fairing() -> AdHoc {
    AdHoc::on_ignite("Set SQLite Test Pragmas", |rocket| async {
        let conn = DbConn::get_one(&rocket)
            .await
            .expect("database connection for pragmas");
        conn.run(|c| {
            set_sqlite_test_pragmas(c);
        })
        .await;
        rocket
    })
}

/// Creates a Rocket fairing that initializes standard test data.
///
/// Creates a consistent team and set of users every integration test can
/// rely on: an owner (`owner@example.com`) and two members, all with the
/// password `"admin"`.
fn test_data_init_fairing() -> AdHoc {
    AdHoc::on_ignite("Test Data Initialization", |rocket| async {
        let conn = DbConn::get_one(&rocket)
            .await
            .expect("database connection for test data initialization");

        conn.run(|c| {
            if let Err(e) = create_test_data(c) {
                eprintln!("[test-data-init] ERROR: Failed to create test data: {:?}", e);
            }
        })
        .await;

        rocket
    })
}

fn create_test_data(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    let team = match get_team_by_name(conn, "Test Team")? {
        Some(team) => team,
        None => insert_team(conn, "Test Team".to_string())?,
    };

    create_test_user(conn, &team, "owner@example.com", "owner", "manager", 5)?;
    create_test_user(conn, &team, "member1@example.com", "member", "barista", 2)?;
    create_test_user(conn, &team, "member2@example.com", "member", "floor", 1)?;

    Ok(())
}

fn create_test_user(
    conn: &mut SqliteConnection,
    team: &Team,
    email: &str,
    role: &str,
    position: &str,
    seniority: i32,
) -> Result<(), diesel::result::Error> {
    if get_user_by_email(conn, email)?.is_some() {
        return Ok(());
    }

    let user = insert_user(
        conn,
        UserInput {
            name: Some(email.split('@').next().unwrap_or("user").to_string()),
            email: email.to_string(),
            password_hash: hash_password("admin"),
            role: role.to_string(),
            hourly_rate: 22.0,
            max_weekly_hours: 38,
            min_weekly_hours: 8,
            seniority,
            position: position.to_string(),
        },
    )?;
    add_team_member(conn, user.id, team.id, role)?;

    Ok(())
}

/// Creates and configures a Rocket instance for testing with an in-memory
/// SQLite database and a scripted generator.
///
/// The returned Rocket instance will have:
/// - A unique in-memory SQLite database configured
/// - Foreign keys enabled, testing pragmas set, migrations run
/// - Bootstrap and test data initialization completed
/// - The generation worker running against the given generator, with fast
///   retry settings (no backoff, 2 attempts)
/// - All API routes mounted
pub fn test_rocket_with_generator(generator: Arc<dyn Generator>) -> Rocket<Build> {
    use uuid::Uuid;

    let unique_db_name = format!("file:test_db_{}?mode=memory&cache=shared", Uuid::new_v4());

    let db_config: Map<_, Value> = map! {
        "url" => unique_db_name.into(),
        "pool_size" => 5.into(),
        "timeout" => 5.into(),
    };
    let databases = map!["sqlite_db" => db_config];

    let figment = rocket::Config::figment()
        .merge(("databases", databases))
        .merge(("generation.max_attempts", 2))
        .merge(("generation.backoff_base_secs", 0))
        .merge(("generation.job_timeout_secs", 5));

    let rocket = rocket::custom(figment)
        .attach(DbConn::fairing())
        .attach(super::db::set_foreign_keys_fairing())
        .attach(set_sqlite_test_pragmas_fairing())
        .attach(super::db::run_migrations_fairing())
        .attach(bootstrap_fairing())
        .attach(test_data_init_fairing())
        .attach(generation_worker_fairing(generator));

    crate::mount_api_routes(rocket)
}

/// `test_rocket_with_generator` with a generator that always returns an
/// empty shift array. Enough for every test that never touches generation.
pub fn test_rocket() -> Rocket<Build> {
    test_rocket_with_generator(Arc::new(StubGenerator::with_response("[]")))
}

/// Creates a synchronous in-memory SQLite database connection for unit
/// tests, with migrations run and foreign keys enabled. Each call returns a
/// new, independent database.
pub fn setup_test_db() -> SqliteConnection {
    use diesel::Connection;

    let mut conn = SqliteConnection::establish(":memory:")
        .expect("Failed to create in-memory SQLite database");
    set_foreign_keys(&mut conn);
    run_pending_migrations(&mut conn);
    conn
}

/// Seeds a team with an owner account and returns both. For ORM unit tests
/// that need a minimal valid world.
pub fn setup_test_team(conn: &mut SqliteConnection) -> (Team, User) {
    let team = insert_team(conn, "Test Team".to_string()).expect("insert test team");
    let owner = insert_user(
        conn,
        UserInput {
            name: Some("Owner".to_string()),
            email: "owner@example.com".to_string(),
            password_hash: hash_password("admin"),
            role: "owner".to_string(),
            hourly_rate: 30.0,
            max_weekly_hours: 40,
            min_weekly_hours: 0,
            seniority: 5,
            position: "manager".to_string(),
        },
    )
    .expect("insert test owner");
    add_team_member(conn, owner.id, team.id, "owner").expect("add owner membership");
    (team, owner)
}

/// Adds a member user to the given team and returns it.
pub fn setup_test_member(conn: &mut SqliteConnection, team_id: i32, email: &str) -> User {
    let member = insert_user(
        conn,
        UserInput {
            name: Some(email.split('@').next().unwrap_or("member").to_string()),
            email: email.to_string(),
            password_hash: hash_password("admin"),
            role: "member".to_string(),
            hourly_rate: 22.0,
            max_weekly_hours: 38,
            min_weekly_hours: 8,
            seniority: 1,
            position: "barista".to_string(),
        },
    )
    .expect("insert test member");
    add_team_member(conn, member.id, team_id, "member").expect("add member membership");
    member
}

/// A minimal async-compatible wrapper for a synchronous SQLite connection,
/// mimicking the Rocket-style `.run()` interface for code written against
/// the `DbRunner` trait.
pub struct FakeDbConn<'a>(pub &'a mut diesel::SqliteConnection);

impl<'a> FakeDbConn<'a> {
    /// Executes a closure with a mutable reference to the underlying SQLite
    /// connection.
    ///
    /// # Safety
    /// This uses unsafe code to convert an immutable reference to mutable,
    /// which is safe in this controlled test environment where we know we
    /// have exclusive access.
    pub async fn run<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut diesel::SqliteConnection) -> R + Send + 'static,
        R: Send + 'static,
    {
        unsafe {
            let conn_ptr =
                self.0 as *const diesel::SqliteConnection as *mut diesel::SqliteConnection;
            f(&mut *conn_ptr)
        }
    }
}

/// Creates a `FakeDbConn` for async-style testing with the given SQLite
/// connection.
pub fn setup_test_dbconn<'a>(conn: &'a mut diesel::SqliteConnection) -> FakeDbConn<'a> {
    FakeDbConn(conn)
}
