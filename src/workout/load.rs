//! Total-load maintenance for a workout
//!
//! `total_load` on a workout is derived: the sum of kg*reps over its sets.
//! After an edit or delete the previous contribution of the touched set is
//! unknown to the caller, so the total is always rebuilt from the rows;
//! the incremental path exists only for insert, where the delta is exact.

use rusqlite::Connection;

use crate::db;

/// Rebuild the workout total from its set rows and return it
pub fn recompute(conn: &Connection, user_id: i64, workout_id: i64) -> rusqlite::Result<f64> {
    let total = db::sum_set_loads(conn, user_id, workout_id)?;
    db::set_workout_total(conn, user_id, workout_id, total)?;
    Ok(total)
}

/// Insert-only increment; returns the stored total after the bump
pub fn apply_delta(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
    delta: f64,
) -> rusqlite::Result<f64> {
    db::add_workout_total(conn, user_id, workout_id, delta)?;
    Ok(db::workout_total(conn, user_id, workout_id)?.unwrap_or(0.0))
}
