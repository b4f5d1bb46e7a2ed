//! Workout mutation orchestration
//!
//! Every operation here is one logically-atomic unit: a single SQLite
//! transaction that mutates set rows and then restores the derived state
//! around them - the exercise PR and its record flag, the workout total,
//! and the dense set ordering. The caller holds the database mutex for
//! the whole call, so sequences never interleave between requests.

pub mod load;
pub mod ordering;
pub mod records;

pub use ordering::SetPosition;
pub use records::PrOutcome;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::db::{self, Database};

#[derive(Debug, Error)]
pub enum WorkoutError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Target row does not exist under the caller's user id
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

pub type WorkoutResult<T> = Result<T, WorkoutError>;

/// Outcome of adding or editing a set
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSaved {
    pub set_id: i64,
    /// True when this set now holds the exercise record
    pub new_pr: bool,
    pub total_load: f64,
}

/// Input for adding a set to a workout
#[derive(Debug, Clone)]
pub struct NewSet {
    pub workout_id: i64,
    pub exercise_id: i64,
    pub kg: f64,
    pub reps: i64,
}

/// Input for editing an existing set
#[derive(Debug, Clone)]
pub struct SetUpdate {
    pub exercise_id: i64,
    pub kg: f64,
    pub reps: i64,
}

fn check_measures(kg: f64, reps: i64) -> WorkoutResult<()> {
    if !(kg >= 0.0) {
        return Err(WorkoutError::InvalidInput("kg must be at least 0"));
    }
    if reps < 1 {
        return Err(WorkoutError::InvalidInput("reps must be at least 1"));
    }
    Ok(())
}

/// Add a set at the end of a workout.
///
/// PR handling takes the insert fast path: a store-side conditional
/// update promotes the exercise record only when the new weight strictly
/// beats it, and the inserted row is flagged as the holder in that case.
/// The workout total is bumped incrementally - the delta of a fresh
/// insert is exact.
pub fn add_set(db: &mut Database, user_id: i64, new: &NewSet) -> WorkoutResult<SetSaved> {
    check_measures(new.kg, new.reps)?;
    let now = Utc::now().timestamp();

    let tx = db.transaction()?;
    if db::get_workout(&tx, user_id, new.workout_id)?.is_none() {
        return Err(WorkoutError::NotFound);
    }
    if db::get_exercise(&tx, user_id, new.exercise_id)?.is_none() {
        return Err(WorkoutError::NotFound);
    }

    let new_pr = records::promote_if_higher(&tx, user_id, new.exercise_id, new.kg)?;
    let position = ordering::next_position(&tx, user_id, new.workout_id)?;
    let set_id = db::insert_set(
        &tx,
        user_id,
        new.workout_id,
        new.exercise_id,
        new.kg,
        new.reps,
        new_pr,
        position,
        now,
    )?;
    if !new_pr && db::record_set_id(&tx, user_id, new.exercise_id)?.is_none() {
        // First set at the stored record weight (bodyweight exercises start
        // at 0): the conditional promote does not fire, so the holder flag
        // is restored by a full pass
        records::recompute(&tx, user_id, new.exercise_id)?;
    }
    let total_load = load::apply_delta(&tx, user_id, new.workout_id, new.kg * new.reps as f64)?;
    tx.commit()?;

    Ok(SetSaved {
        set_id,
        new_pr,
        total_load,
    })
}

/// Edit a set's exercise, weight and reps.
///
/// The edited set may have been the record holder, so the PR is fully
/// recomputed; when the set moved to a different exercise the one it left
/// is recomputed as well, since its record may have walked out the door.
/// The workout total is rebuilt from the rows.
pub fn edit_set(
    db: &mut Database,
    user_id: i64,
    set_id: i64,
    update: &SetUpdate,
) -> WorkoutResult<SetSaved> {
    check_measures(update.kg, update.reps)?;

    let tx = db.transaction()?;
    let Some(existing) = db::get_set(&tx, user_id, set_id)? else {
        return Err(WorkoutError::NotFound);
    };
    if db::get_exercise(&tx, user_id, update.exercise_id)?.is_none() {
        return Err(WorkoutError::NotFound);
    }

    db::update_set_row(&tx, user_id, set_id, update.exercise_id, update.kg, update.reps)?;

    let outcome = records::recompute(&tx, user_id, update.exercise_id)?;
    if existing.exercise_id != update.exercise_id {
        records::recompute(&tx, user_id, existing.exercise_id)?;
    }
    let total_load = load::recompute(&tx, user_id, existing.workout_id)?;
    tx.commit()?;

    Ok(SetSaved {
        set_id,
        new_pr: outcome.record_set_id == Some(set_id),
        total_load,
    })
}

/// Delete a set. Returns the workout's new total, or None when no row
/// was deleted (unknown id or another user's set) - a no-op, not an error.
pub fn delete_set(db: &mut Database, user_id: i64, set_id: i64) -> WorkoutResult<Option<f64>> {
    let tx = db.transaction()?;
    let Some(existing) = db::get_set(&tx, user_id, set_id)? else {
        return Ok(None);
    };

    db::delete_set_row(&tx, user_id, set_id)?;
    records::recompute(&tx, user_id, existing.exercise_id)?;
    let total_load = load::recompute(&tx, user_id, existing.workout_id)?;
    ordering::compact(&tx, user_id, existing.workout_id)?;
    tx.commit()?;

    Ok(Some(total_load))
}

/// Delete a workout and all of its sets. Exercises that had sets in the
/// workout get their PR recomputed, since a record holder may be gone.
pub fn delete_workout(db: &mut Database, user_id: i64, workout_id: i64) -> WorkoutResult<()> {
    let tx = db.transaction()?;
    if db::get_workout(&tx, user_id, workout_id)?.is_none() {
        return Err(WorkoutError::NotFound);
    }

    let touched = db::exercises_in_workout(&tx, user_id, workout_id)?;
    db::delete_sets_for_workout(&tx, user_id, workout_id)?;
    for exercise_id in touched {
        records::recompute(&tx, user_id, exercise_id)?;
    }
    db::delete_workout_row(&tx, user_id, workout_id)?;
    tx.commit()?;

    Ok(())
}

/// Move a set within its workout; returns the full new ordering.
pub fn reorder_sets(
    db: &mut Database,
    user_id: i64,
    workout_id: i64,
    set_id: i64,
    target_index: i64,
) -> WorkoutResult<Vec<SetPosition>> {
    let tx = db.transaction()?;
    if db::get_workout(&tx, user_id, workout_id)?.is_none() {
        return Err(WorkoutError::NotFound);
    }
    let Some(order) = ordering::reorder(&tx, user_id, workout_id, set_id, target_index)? else {
        return Err(WorkoutError::NotFound);
    };
    tx.commit()?;
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        db: Database,
        user: i64,
        exercise: i64,
        workout: i64,
    }

    fn setup() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let user = db::insert_user(db.conn(), "t@t.t", "h", 0).unwrap();
        let exercise = db::insert_exercise(db.conn(), user, "Bench Press", &[1, 3]).unwrap();
        let workout = db::insert_workout(db.conn(), user, "Workout #1", "", None, 0).unwrap();
        Fixture {
            db,
            user,
            exercise,
            workout,
        }
    }

    fn new_set(workout_id: i64, exercise_id: i64, kg: f64, reps: i64) -> NewSet {
        NewSet {
            workout_id,
            exercise_id,
            kg,
            reps,
        }
    }

    fn flagged_sets(f: &Fixture) -> Vec<db::WorkoutSet> {
        db::sets_for_workout(f.db.conn(), f.user, f.workout)
            .unwrap()
            .into_iter()
            .filter(|s| s.is_pr)
            .collect()
    }

    #[test]
    fn test_add_set_rejects_bad_measures() {
        let mut f = setup();
        let bad_kg = NewSet { kg: -1.0, ..new_set(f.workout, f.exercise, 0.0, 5) };
        assert!(matches!(
            add_set(&mut f.db, f.user, &bad_kg),
            Err(WorkoutError::InvalidInput(_))
        ));
        let bad_reps = new_set(f.workout, f.exercise, 50.0, 0);
        assert!(matches!(
            add_set(&mut f.db, f.user, &bad_reps),
            Err(WorkoutError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_add_set_to_unknown_workout_is_not_found() {
        let mut f = setup();
        let req = NewSet { workout_id: 999, ..new_set(f.workout, f.exercise, 50.0, 5) };
        assert!(matches!(
            add_set(&mut f.db, f.user, &req),
            Err(WorkoutError::NotFound)
        ));
    }

    #[test]
    fn test_consecutive_adds_promote_record() {
        let mut f = setup();
        // Prior record of 90 from an earlier set
        add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 90.0, 5)).unwrap();

        let first = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 100.0, 5)).unwrap();
        assert!(first.new_pr);

        let second = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 110.0, 3)).unwrap();
        assert!(second.new_pr);
        assert_eq!(
            db::exercise_pr(f.db.conn(), f.user, f.exercise).unwrap(),
            Some(110.0)
        );

        let flagged = flagged_sets(&f);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].set_id, second.set_id);
    }

    #[test]
    fn test_add_equal_weight_keeps_earlier_record() {
        let mut f = setup();
        let first = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 100.0, 5)).unwrap();
        assert!(first.new_pr);

        let tie = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 100.0, 8)).unwrap();
        assert!(!tie.new_pr);

        let flagged = flagged_sets(&f);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].set_id, first.set_id);
    }

    #[test]
    fn test_first_bodyweight_set_still_gets_flagged() {
        let mut f = setup();
        let saved = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 0.0, 15)).unwrap();
        // Not a promotion, but the pair must still have its record holder
        assert!(!saved.new_pr);
        assert_eq!(
            db::record_set_id(f.db.conn(), f.user, f.exercise).unwrap(),
            Some(saved.set_id)
        );
    }

    #[test]
    fn test_delete_record_set_reveals_second_highest() {
        let mut f = setup();
        add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 80.0, 5)).unwrap();
        let top = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 100.0, 5)).unwrap();
        add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 90.0, 5)).unwrap();

        let total = delete_set(&mut f.db, f.user, top.set_id).unwrap();
        assert_eq!(total, Some(80.0 * 5.0 + 90.0 * 5.0));

        assert_eq!(
            db::exercise_pr(f.db.conn(), f.user, f.exercise).unwrap(),
            Some(90.0)
        );
        let flagged = flagged_sets(&f);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].kg, 90.0);
    }

    #[test]
    fn test_delete_keeps_positions_dense() {
        let mut f = setup();
        let a = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 50.0, 5)).unwrap();
        add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 60.0, 5)).unwrap();
        add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 70.0, 5)).unwrap();

        delete_set(&mut f.db, f.user, a.set_id).unwrap();
        let positions: Vec<i64> = db::sets_for_workout(f.db.conn(), f.user, f.workout)
            .unwrap()
            .iter()
            .map(|s| s.position)
            .collect();
        assert_eq!(positions, vec![1, 2]);
    }

    #[test]
    fn test_delete_foreign_set_is_noop() {
        let mut f = setup();
        let saved = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 100.0, 5)).unwrap();

        let stranger = db::insert_user(f.db.conn(), "other@x.y", "h", 0).unwrap();
        let result = delete_set(&mut f.db, stranger, saved.set_id).unwrap();
        assert_eq!(result, None);

        // Nothing changed for the owner
        let sets = db::sets_for_workout(f.db.conn(), f.user, f.workout).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(
            db::exercise_pr(f.db.conn(), f.user, f.exercise).unwrap(),
            Some(100.0)
        );
    }

    #[test]
    fn test_edit_set_recomputes_load_exactly() {
        let mut f = setup();
        add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 50.0, 10)).unwrap();
        let second = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 60.0, 5)).unwrap();
        assert_eq!(second.total_load, 800.0);

        let update = SetUpdate {
            exercise_id: f.exercise,
            kg: 60.0,
            reps: 8,
        };
        let edited = edit_set(&mut f.db, f.user, second.set_id, &update).unwrap();
        assert_eq!(edited.total_load, 980.0);
    }

    #[test]
    fn test_edit_reports_record_only_for_holder() {
        let mut f = setup();
        let first = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 100.0, 5)).unwrap();
        let second = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 80.0, 5)).unwrap();

        // Raising the second set above the record makes it the holder
        let up = SetUpdate {
            exercise_id: f.exercise,
            kg: 120.0,
            reps: 5,
        };
        let edited = edit_set(&mut f.db, f.user, second.set_id, &up).unwrap();
        assert!(edited.new_pr);

        // Lowering it again hands the record back to the first set
        let down = SetUpdate {
            exercise_id: f.exercise,
            kg: 70.0,
            reps: 5,
        };
        let edited = edit_set(&mut f.db, f.user, second.set_id, &down).unwrap();
        assert!(!edited.new_pr);
        let flagged = flagged_sets(&f);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].set_id, first.set_id);
    }

    #[test]
    fn test_edit_across_exercises_recomputes_both() {
        let mut f = setup();
        let other = db::insert_exercise(f.db.conn(), f.user, "Incline Press", &[1]).unwrap();
        let moved = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 100.0, 5)).unwrap();
        add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 80.0, 5)).unwrap();

        let update = SetUpdate {
            exercise_id: other,
            kg: 100.0,
            reps: 5,
        };
        let edited = edit_set(&mut f.db, f.user, moved.set_id, &update).unwrap();
        assert!(edited.new_pr);

        // Old exercise falls back to its remaining max, new one takes 100
        assert_eq!(
            db::exercise_pr(f.db.conn(), f.user, f.exercise).unwrap(),
            Some(80.0)
        );
        assert_eq!(db::exercise_pr(f.db.conn(), f.user, other).unwrap(), Some(100.0));
        assert_eq!(
            db::record_set_id(f.db.conn(), f.user, other).unwrap(),
            Some(moved.set_id)
        );
    }

    #[test]
    fn test_edit_unknown_set_is_not_found() {
        let mut f = setup();
        let update = SetUpdate {
            exercise_id: f.exercise,
            kg: 50.0,
            reps: 5,
        };
        assert!(matches!(
            edit_set(&mut f.db, f.user, 42, &update),
            Err(WorkoutError::NotFound)
        ));
    }

    #[test]
    fn test_delete_workout_cascades_and_recomputes() {
        let mut f = setup();
        add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 100.0, 5)).unwrap();
        add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 80.0, 5)).unwrap();

        delete_workout(&mut f.db, f.user, f.workout).unwrap();

        assert!(db::get_workout(f.db.conn(), f.user, f.workout).unwrap().is_none());
        assert!(db::sets_for_workout(f.db.conn(), f.user, f.workout)
            .unwrap()
            .is_empty());
        // The exercise record fell with its only sets
        assert_eq!(
            db::exercise_pr(f.db.conn(), f.user, f.exercise).unwrap(),
            Some(0.0)
        );
    }

    #[test]
    fn test_delete_foreign_workout_is_not_found() {
        let mut f = setup();
        let stranger = db::insert_user(f.db.conn(), "other@x.y", "h", 0).unwrap();
        assert!(matches!(
            delete_workout(&mut f.db, stranger, f.workout),
            Err(WorkoutError::NotFound)
        ));
        assert!(db::get_workout(f.db.conn(), f.user, f.workout).unwrap().is_some());
    }

    #[test]
    fn test_reorder_through_orchestrator() {
        let mut f = setup();
        let a = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 50.0, 5)).unwrap();
        let b = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 60.0, 5)).unwrap();
        let c = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 70.0, 5)).unwrap();

        let order = reorder_sets(&mut f.db, f.user, f.workout, c.set_id, 0).unwrap();
        let ids: Vec<i64> = order.iter().map(|p| p.set_id).collect();
        assert_eq!(ids, vec![c.set_id, a.set_id, b.set_id]);

        assert!(matches!(
            reorder_sets(&mut f.db, f.user, f.workout, 999, 0),
            Err(WorkoutError::NotFound)
        ));
    }

    #[test]
    fn test_pr_invariant_over_mixed_sequence() {
        let mut f = setup();
        let s1 = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 60.0, 5)).unwrap();
        let s2 = add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 90.0, 3)).unwrap();
        add_set(&mut f.db, f.user, &new_set(f.workout, f.exercise, 75.0, 8)).unwrap();
        edit_set(
            &mut f.db,
            f.user,
            s1.set_id,
            &SetUpdate {
                exercise_id: f.exercise,
                kg: 95.0,
                reps: 2,
            },
        )
        .unwrap();
        delete_set(&mut f.db, f.user, s2.set_id).unwrap();

        let sets = db::sets_for_workout(f.db.conn(), f.user, f.workout).unwrap();
        let max = sets.iter().map(|s| s.kg).fold(0.0_f64, f64::max);
        assert_eq!(
            db::exercise_pr(f.db.conn(), f.user, f.exercise).unwrap(),
            Some(max)
        );
        let flagged: Vec<_> = sets.iter().filter(|s| s.is_pr).collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].kg, max);

        let total: f64 = sets.iter().map(|s| s.kg * s.reps as f64).sum();
        assert_eq!(
            db::workout_total(f.db.conn(), f.user, f.workout).unwrap(),
            Some(total)
        );
    }
}
