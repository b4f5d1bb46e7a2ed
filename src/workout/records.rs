//! Personal record recalculation for one (user, exercise) pair
//!
//! The cached `pr_kg` on an exercise and the single `is_pr` flag among its
//! sets are derived data. `recompute` rebuilds both from the set rows and
//! is safe to call after any insert, edit or delete; `promote_if_higher`
//! is the insert-time fast path that avoids a full pass when the new
//! weight simply beats the stored record.

use rusqlite::Connection;

use crate::db;

/// Result of a full PR recomputation
#[derive(Debug, Clone, PartialEq)]
pub struct PrOutcome {
    /// Whether the cached exercise PR changed
    pub changed: bool,
    /// New maximum weight (0 when the exercise has no sets left)
    pub max_kg: f64,
    /// Set now holding the record, if any set exists
    pub record_set_id: Option<i64>,
}

/// Rebuild the exercise PR and the record-holder flag from the set rows.
///
/// The holder is the earliest set (lowest id) among those at the maximum
/// weight. With no sets left the PR drops to 0 and no set is flagged.
pub fn recompute(conn: &Connection, user_id: i64, exercise_id: i64) -> rusqlite::Result<PrOutcome> {
    let previous = db::exercise_pr(conn, user_id, exercise_id)?.unwrap_or(0.0);
    let max = db::max_kg_for_exercise(conn, user_id, exercise_id)?;
    let max_kg = max.unwrap_or(0.0);

    db::set_exercise_pr(conn, user_id, exercise_id, max_kg)?;
    db::clear_pr_flags(conn, user_id, exercise_id)?;

    let record_set_id = match max {
        Some(kg) => db::flag_record_set(conn, user_id, exercise_id, kg)?,
        None => None,
    };

    Ok(PrOutcome {
        changed: previous != max_kg,
        max_kg,
        record_set_id,
    })
}

/// Insert fast path: promote the exercise PR when `kg` strictly beats it.
///
/// The conditional update is evaluated by the store, so two concurrent
/// inserts cannot both observe a stale record. When the promotion wins,
/// the old holder's flag is cleared here and the caller flags the new row
/// at insert time. Ties do not promote: the earlier record keeps the flag.
pub fn promote_if_higher(
    conn: &Connection,
    user_id: i64,
    exercise_id: i64,
    kg: f64,
) -> rusqlite::Result<bool> {
    let promoted = db::promote_pr_if_higher(conn, user_id, exercise_id, kg)?;
    if promoted {
        db::clear_pr_flags(conn, user_id, exercise_id)?;
    }
    Ok(promoted)
}
