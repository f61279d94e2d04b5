//! Persistence for generated shifts.
//!
//! The batch insert is the only multi-row mutation in the system. It runs
//! inside a single transaction so a batch is persisted completely or not at
//! all, and it refuses to add shifts to a roster that already has some —
//! two generation jobs for the same roster cannot both land.

use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use std::fmt;

use crate::models::{NewShift, Shift, ShiftCandidate, ShiftWithUser};
use crate::orm::roster::get_roster;

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = BigInt)]
    last_insert_rowid: i64,
}

/// Failure modes of the batch insert.
#[derive(Debug)]
pub enum ShiftBatchError {
    /// A candidate references a roster id that does not exist.
    RosterNotFound(i32),
    /// The roster already has persisted shifts; duplicate generation is
    /// rejected rather than double-inserted.
    RosterAlreadyPopulated(i32),
    /// A candidate's date falls outside its roster's date range.
    DateOutOfRange {
        index: usize,
        date: chrono::NaiveDate,
    },
    Database(diesel::result::Error),
}

impl fmt::Display for ShiftBatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftBatchError::RosterNotFound(rid) => {
                write!(f, "Roster with ID {} does not exist", rid)
            }
            ShiftBatchError::RosterAlreadyPopulated(rid) => {
                write!(f, "Roster {} already has shifts; refusing duplicate batch", rid)
            }
            ShiftBatchError::DateOutOfRange { index, date } => {
                write!(f, "shift {}: date {} is outside the roster date range", index, date)
            }
            ShiftBatchError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for ShiftBatchError {}

impl From<diesel::result::Error> for ShiftBatchError {
    fn from(e: diesel::result::Error) -> Self {
        ShiftBatchError::Database(e)
    }
}

impl ShiftBatchError {
    /// Storage-level failures are worth retrying; everything else means the
    /// batch itself is wrong and a retry cannot fix it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ShiftBatchError::Database(_))
    }
}

/// Inserts a validated batch of shifts as one atomic operation.
///
/// Every candidate's `hours` is normalized to a fixed 2-decimal string
/// before storage (`8` becomes `"8.00"`). Returns the inserted rows with
/// their generated ids, in batch order.
///
/// # Guarantees
/// * All-or-nothing: if any row fails, the whole transaction rolls back.
/// * No duplicate generation: a roster that already has shifts rejects the
///   batch with `RosterAlreadyPopulated`.
/// * Every date is checked against its roster's [start, end] range.
pub fn insert_shift_batch(
    conn: &mut SqliteConnection,
    batch: &[ShiftCandidate],
) -> Result<Vec<Shift>, ShiftBatchError> {
    use crate::schema::shifts::dsl::*;

    if batch.is_empty() {
        return Ok(Vec::new());
    }

    conn.transaction::<Vec<Shift>, ShiftBatchError, _>(|conn| {
        let mut batch_roster_ids: Vec<i32> = batch.iter().map(|c| c.roster_id).collect();
        batch_roster_ids.sort_unstable();
        batch_roster_ids.dedup();

        for rid in &batch_roster_ids {
            let roster =
                get_roster(conn, *rid)?.ok_or(ShiftBatchError::RosterNotFound(*rid))?;

            let existing: i64 = shifts
                .filter(roster_id.eq(*rid))
                .count()
                .get_result(conn)?;
            if existing > 0 {
                return Err(ShiftBatchError::RosterAlreadyPopulated(*rid));
            }

            for (index, candidate) in batch.iter().enumerate() {
                if candidate.roster_id == *rid
                    && (candidate.date < roster.start_date || candidate.date > roster.end_date)
                {
                    return Err(ShiftBatchError::DateOutOfRange {
                        index,
                        date: candidate.date,
                    });
                }
            }
        }

        let mut inserted = Vec::with_capacity(batch.len());
        for candidate in batch {
            let row = NewShift {
                roster_id: candidate.roster_id,
                user_id: candidate.user_id,
                shift_type: candidate.shift_type.clone(),
                date: candidate.date,
                start_time: candidate.start_time.clone(),
                finish_time: candidate.finish_time.clone(),
                hours: format!("{:.2}", candidate.hours),
            };

            diesel::insert_into(shifts).values(&row).execute(conn)?;

            let last_id = diesel::sql_query("SELECT last_insert_rowid() as last_insert_rowid")
                .get_result::<LastInsertRowId>(conn)?
                .last_insert_rowid;

            inserted.push(shifts.filter(id.eq(last_id as i32)).first::<Shift>(conn)?);
        }

        Ok(inserted)
    })
}

/// Returns all shifts for a roster, ordered by date then start time.
pub fn get_shifts_by_roster(
    conn: &mut SqliteConnection,
    target_roster_id: i32,
) -> Result<Vec<Shift>, diesel::result::Error> {
    use crate::schema::shifts::dsl::*;
    shifts
        .filter(roster_id.eq(target_roster_id))
        .order((date.asc(), start_time.asc()))
        .load::<Shift>(conn)
}

/// Returns all shifts for a roster joined with the assignee's display name.
pub fn get_shifts_with_users(
    conn: &mut SqliteConnection,
    target_roster_id: i32,
) -> Result<Vec<ShiftWithUser>, diesel::result::Error> {
    use crate::schema::{shifts, users};

    let rows = shifts::table
        .inner_join(users::table)
        .filter(shifts::roster_id.eq(target_roster_id))
        .order((shifts::date.asc(), shifts::start_time.asc()))
        .select((Shift::as_select(), users::name.nullable()))
        .load::<(Shift, Option<String>)>(conn)?;

    Ok(rows
        .into_iter()
        .map(|(shift, user_name)| ShiftWithUser {
            id: shift.id,
            roster_id: shift.roster_id,
            user_id: shift.user_id,
            user_name: user_name.unwrap_or_else(|| "Unknown User".to_string()),
            shift_type: shift.shift_type,
            date: shift.date,
            start_time: shift.start_time,
            finish_time: shift.finish_time,
            hours: shift.hours,
        })
        .collect())
}

/// Updates a shift's fields for manual correction outside the generation
/// path. All fields are optional; only provided fields change.
pub fn update_shift(
    conn: &mut SqliteConnection,
    shift_id: i32,
    new_shift_type: Option<String>,
    new_start_time: Option<String>,
    new_finish_time: Option<String>,
    new_hours: Option<f64>,
) -> Result<Shift, diesel::result::Error> {
    use crate::schema::shifts::dsl::*;

    if let Some(type_val) = new_shift_type {
        diesel::update(shifts.filter(id.eq(shift_id)))
            .set(shift_type.eq(type_val))
            .execute(conn)?;
    }

    if let Some(start_val) = new_start_time {
        diesel::update(shifts.filter(id.eq(shift_id)))
            .set(start_time.eq(start_val))
            .execute(conn)?;
    }

    if let Some(finish_val) = new_finish_time {
        diesel::update(shifts.filter(id.eq(shift_id)))
            .set(finish_time.eq(finish_val))
            .execute(conn)?;
    }

    if let Some(hours_val) = new_hours {
        diesel::update(shifts.filter(id.eq(shift_id)))
            .set(hours.eq(format!("{:.2}", hours_val)))
            .execute(conn)?;
    }

    shifts.filter(id.eq(shift_id)).first::<Shift>(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::orm::roster::insert_roster;
    use crate::orm::testing::{setup_test_db, setup_test_team};

    fn candidate(roster_id: i32, user_id: i32, day: u32, hours: f64) -> ShiftCandidate {
        ShiftCandidate {
            roster_id,
            user_id,
            shift_type: "AM".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            start_time: "08:00:00".to_string(),
            finish_time: "16:00:00".to_string(),
            hours,
        }
    }

    #[test]
    fn test_batch_insert_normalizes_hours() {
        let mut conn = setup_test_db();
        let (team, owner) = setup_test_team(&mut conn);
        let roster = insert_roster(
            &mut conn,
            team.id,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            owner.id,
        )
        .expect("insert roster");

        let batch = vec![
            candidate(roster.id, owner.id, 4, 8.0),
            candidate(roster.id, owner.id, 5, 7.25),
        ];
        let inserted = insert_shift_batch(&mut conn, &batch).expect("batch insert");
        assert_eq!(inserted.len(), 2);
        assert_eq!(inserted[0].hours, "8.00");
        assert_eq!(inserted[1].hours, "7.25");

        let read_back = get_shifts_by_roster(&mut conn, roster.id).expect("read back");
        assert_eq!(read_back.len(), 2);
        assert_eq!(read_back[0].hours, "8.00");
    }

    #[test]
    fn test_duplicate_generation_rejected() {
        let mut conn = setup_test_db();
        let (team, owner) = setup_test_team(&mut conn);
        let roster = insert_roster(
            &mut conn,
            team.id,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            owner.id,
        )
        .expect("insert roster");

        insert_shift_batch(&mut conn, &[candidate(roster.id, owner.id, 4, 8.0)])
            .expect("first batch");

        let second = insert_shift_batch(&mut conn, &[candidate(roster.id, owner.id, 5, 8.0)]);
        match second {
            Err(ShiftBatchError::RosterAlreadyPopulated(rid)) => assert_eq!(rid, roster.id),
            other => panic!("expected RosterAlreadyPopulated, got {:?}", other),
        }

        // The roster still has only the first batch.
        let rows = get_shifts_by_roster(&mut conn, roster.id).expect("read back");
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_out_of_range_date_rolls_back_batch() {
        let mut conn = setup_test_db();
        let (team, owner) = setup_test_team(&mut conn);
        let roster = insert_roster(
            &mut conn,
            team.id,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
            owner.id,
        )
        .expect("insert roster");

        let batch = vec![
            candidate(roster.id, owner.id, 4, 8.0),
            candidate(roster.id, owner.id, 20, 8.0), // outside the range
        ];
        let result = insert_shift_batch(&mut conn, &batch);
        assert!(matches!(
            result,
            Err(ShiftBatchError::DateOutOfRange { index: 1, .. })
        ));

        let rows = get_shifts_by_roster(&mut conn, roster.id).expect("read back");
        assert!(rows.is_empty(), "nothing may persist from a rejected batch");
    }

    #[test]
    fn test_update_shift_partial_fields() {
        let mut conn = setup_test_db();
        let (team, owner) = setup_test_team(&mut conn);
        let roster = insert_roster(
            &mut conn,
            team.id,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            owner.id,
        )
        .expect("insert roster");

        let inserted = insert_shift_batch(&mut conn, &[candidate(roster.id, owner.id, 4, 8.0)])
            .expect("batch insert");

        let updated = update_shift(
            &mut conn,
            inserted[0].id,
            Some("PM".to_string()),
            None,
            None,
            Some(6.5),
        )
        .expect("update shift");

        assert_eq!(updated.shift_type, "PM");
        assert_eq!(updated.hours, "6.50");
        assert_eq!(updated.start_time, "08:00:00"); // untouched
    }
}
