//! Set ordering within a workout
//!
//! Positions form a dense 1..N sequence per workout. New sets append at
//! the end; a reorder splices the moved set in and rewrites every
//! position rather than shifting neighbours, so gaps cannot accumulate.

use rusqlite::Connection;
use serde::Serialize;

use crate::db;

/// A set's rank after a reorder
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SetPosition {
    pub set_id: i64,
    pub position: i64,
}

/// Position for a set appended to the workout
pub fn next_position(conn: &Connection, user_id: i64, workout_id: i64) -> rusqlite::Result<i64> {
    Ok(db::max_position(conn, user_id, workout_id)? + 1)
}

/// Move a set to `target_index` (0-based, clamped into range) and rewrite
/// the whole workout's positions to 1..N. Returns the new order, or None
/// when the set is not part of the workout.
pub fn reorder(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
    set_id: i64,
    target_index: i64,
) -> rusqlite::Result<Option<Vec<SetPosition>>> {
    let sets = db::sets_for_workout(conn, user_id, workout_id)?;
    let Some(current) = sets.iter().position(|s| s.set_id == set_id) else {
        return Ok(None);
    };

    let mut ids: Vec<i64> = sets.iter().map(|s| s.set_id).collect();
    let target = target_index.clamp(0, ids.len() as i64 - 1) as usize;

    if target != current {
        let moved = ids.remove(current);
        ids.insert(target, moved);

        for (index, id) in ids.iter().enumerate() {
            db::set_position(conn, user_id, *id, index as i64 + 1)?;
        }
    }

    let order = ids
        .into_iter()
        .enumerate()
        .map(|(index, id)| SetPosition {
            set_id: id,
            position: index as i64 + 1,
        })
        .collect();
    Ok(Some(order))
}

/// Rewrite positions to 1..N in the current display order. Used after a
/// delete leaves a gap in the sequence.
pub fn compact(conn: &Connection, user_id: i64, workout_id: i64) -> rusqlite::Result<()> {
    let sets = db::sets_for_workout(conn, user_id, workout_id)?;
    for (index, set) in sets.iter().enumerate() {
        let position = index as i64 + 1;
        if set.position != position {
            db::set_position(conn, user_id, set.set_id, position)?;
        }
    }
    Ok(())
}
