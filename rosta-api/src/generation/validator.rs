//! Structural and semantic validation of generated shift records.
//!
//! The model's output is adversarial input: every record is checked before
//! anything is written. Validation is all-or-nothing across the batch and
//! accumulates one error string per violated rule per record index, so a
//! caller can report everything wrong in a single pass.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde_json::Value;

use crate::models::ShiftCandidate;

/// The shift labels the validator accepts. Narrower than the model-level
/// enum (which also carries Night); the generation prompt only deals in
/// these three.
pub const ALLOWED_SHIFT_TYPES: [&str; 3] = ["AM", "PM", "NA"];

const REQUIRED_FIELDS: [&str; 7] = [
    "rosterId",
    "userId",
    "shiftType",
    "date",
    "startTime",
    "finishTime",
    "hours",
];

fn date_format() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"))
}

fn time_format() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}:\d{2}:\d{2}$").expect("valid time regex"))
}

fn check_time(errors: &mut Vec<String>, index: usize, field: &str, value: &Value) -> Option<String> {
    let Some(text) = value.as_str() else {
        errors.push(format!("shift {}: {} must be a string", index, field));
        return None;
    };
    if !time_format().is_match(text) {
        errors.push(format!(
            "shift {}: {} must match HH:MM:SS, got '{}'",
            index, field, text
        ));
        return None;
    }
    if NaiveTime::parse_from_str(text, "%H:%M:%S").is_err() {
        errors.push(format!(
            "shift {}: {} is not a valid time of day: '{}'",
            index, field, text
        ));
        return None;
    }
    Some(text.to_string())
}

/// Validates a batch of candidate shift records decoded from generation
/// output (or submitted directly to the shifts endpoint).
///
/// Rules, per record:
/// * every required field present;
/// * `date` matches `YYYY-MM-DD` and is a real calendar date;
/// * `startTime`/`finishTime` match 24-hour `HH:MM:SS`;
/// * `shiftType` is one of AM, PM, NA;
/// * `hours` is a number, greater than 0, at most 24, with at most two
///   decimal digits.
///
/// Returns the decoded candidates only when the whole batch is clean;
/// otherwise the full list of violations. Callers must not persist anything
/// from a batch that produced errors.
pub fn validate_shift_batch(records: &[Value]) -> Result<Vec<ShiftCandidate>, Vec<String>> {
    let mut errors = Vec::new();
    let mut candidates = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let Some(object) = record.as_object() else {
            errors.push(format!("shift {}: not a JSON object", index));
            continue;
        };

        let mut complete = true;
        for field in REQUIRED_FIELDS {
            if !object.contains_key(field) || object[field].is_null() {
                errors.push(format!("shift {}: missing required field '{}'", index, field));
                complete = false;
            }
        }
        if !complete {
            continue;
        }

        let roster_id = match object["rosterId"].as_i64() {
            Some(v) => Some(v as i32),
            None => {
                errors.push(format!("shift {}: rosterId must be an integer", index));
                None
            }
        };

        let user_id = match object["userId"].as_i64() {
            Some(v) => Some(v as i32),
            None => {
                errors.push(format!("shift {}: userId must be an integer", index));
                None
            }
        };

        let shift_type = match object["shiftType"].as_str() {
            Some(s) if ALLOWED_SHIFT_TYPES.contains(&s) => Some(s.to_string()),
            Some(s) => {
                errors.push(format!(
                    "shift {}: shiftType must be one of AM, PM, NA, got '{}'",
                    index, s
                ));
                None
            }
            None => {
                errors.push(format!("shift {}: shiftType must be a string", index));
                None
            }
        };

        let date = match object["date"].as_str() {
            Some(s) if date_format().is_match(s) => {
                match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    Ok(d) => Some(d),
                    Err(_) => {
                        errors.push(format!(
                            "shift {}: date is not a valid calendar date: '{}'",
                            index, s
                        ));
                        None
                    }
                }
            }
            Some(s) => {
                errors.push(format!(
                    "shift {}: date must match YYYY-MM-DD, got '{}'",
                    index, s
                ));
                None
            }
            None => {
                errors.push(format!("shift {}: date must be a string", index));
                None
            }
        };

        let start_time = check_time(&mut errors, index, "startTime", &object["startTime"]);
        let finish_time = check_time(&mut errors, index, "finishTime", &object["finishTime"]);

        let hours = match object["hours"].as_f64() {
            Some(h) if h <= 0.0 => {
                errors.push(format!("shift {}: hours must be greater than 0", index));
                None
            }
            Some(h) if h > 24.0 => {
                errors.push(format!("shift {}: hours must be at most 24", index));
                None
            }
            Some(h) if (h * 100.0 - (h * 100.0).round()).abs() > 1e-9 => {
                errors.push(format!(
                    "shift {}: hours must have at most 2 decimal places, got {}",
                    index, h
                ));
                None
            }
            Some(h) => Some(h),
            None => {
                errors.push(format!("shift {}: hours must be a number", index));
                None
            }
        };

        if let (Some(roster_id), Some(user_id), Some(shift_type), Some(date), Some(start_time), Some(finish_time), Some(hours)) =
            (roster_id, user_id, shift_type, date, start_time, finish_time, hours)
        {
            candidates.push(ShiftCandidate {
                roster_id,
                user_id,
                shift_type,
                date,
                start_time,
                finish_time,
                hours,
            });
        }
    }

    if errors.is_empty() {
        Ok(candidates)
    } else {
        Err(errors)
    }
}
