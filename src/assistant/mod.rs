//! Coach assistant bridge
//!
//! Glue between the hosted model and the workout core: assembles the
//! read-only training context for the model, sends the running
//! conversation, then replays any add-sets directive from the reply
//! through the set mutation path. The model call itself never holds the
//! database lock, and a failed call mutates nothing.

pub mod directive;
pub mod gemini;

pub use gemini::{CoachError, GeminiClient};

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{info, warn};

use crate::db::{self, Database};
use crate::workout::{self, NewSet, WorkoutError};

/// Workouts summarized for the model context
const RECENT_WORKOUT_LIMIT: i64 = 5;

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One turn of the running conversation, carried by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

/// Result of applying a model reply to the live workout
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Reply text with any directive block stripped
    pub text: String,
    /// True when at least one set was inserted
    pub sets_added: bool,
}

fn format_date(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Assemble the system prompt for a coach turn: behaviour rules, the
/// directive protocol, and a snapshot of the user's records, recent
/// workouts and the live session.
pub fn build_system_prompt(
    db: &Database,
    user_id: i64,
    workout_id: i64,
) -> Result<String, WorkoutError> {
    let conn = db.conn();
    let Some(workout) = db::get_workout(conn, user_id, workout_id)? else {
        return Err(WorkoutError::NotFound);
    };

    let exercises = db::list_exercises(conn, user_id)?;
    let prs = db::pr_list(conn, user_id)?;
    let recent = db::recent_workouts(conn, user_id, RECENT_WORKOUT_LIMIT)?;
    let sets = db::sets_for_workout(conn, user_id, workout_id)?;

    let mut prompt = String::from(
        r#"You are a personal strength coach inside a workout tracking app.
Be concise and practical. Discuss training plans in plain language.
Only after the user explicitly confirms a plan, append ONE fenced block
tagged add-sets containing a JSON array with one record per set to log:

```add-sets
[{"exerciseId": 3, "kg": 80, "reps": 8}]
```

Repeated sets appear as repeated records. Use only the exercise ids
listed below and never emit the block before the user confirms.
"#,
    );

    if prs.is_empty() {
        prompt.push_str("\nThe user has no personal records yet.\n");
    } else {
        prompt.push_str("\nPersonal records:\n");
        for (name, kg) in &prs {
            let _ = writeln!(prompt, "- {name}: {kg} kg");
        }
    }

    if !recent.is_empty() {
        prompt.push_str("\nRecent workouts:\n");
        for w in &recent {
            let _ = writeln!(
                prompt,
                "- {} ({}): total load {}",
                w.name,
                format_date(w.created_at),
                w.total_load
            );
        }
    }

    prompt.push_str("\nExercises available (id - name, current PR):\n");
    for exercise in &exercises {
        let _ = writeln!(
            prompt,
            "- {} - {}, PR {} kg",
            exercise.exercise_id, exercise.name, exercise.pr_kg
        );
    }

    let _ = writeln!(
        prompt,
        "\nCurrent workout: {} ({})",
        workout.name,
        format_date(workout.created_at)
    );
    if sets.is_empty() {
        prompt.push_str("No sets logged yet in this workout.\n");
    } else {
        prompt.push_str("Sets already logged:\n");
        for set in &sets {
            let name = exercises
                .iter()
                .find(|e| e.exercise_id == set.exercise_id)
                .map(|e| e.name.as_str())
                .unwrap_or("unknown");
            let _ = writeln!(
                prompt,
                "{}. {} {} kg x {}",
                set.position, name, set.kg, set.reps
            );
        }
    }

    Ok(prompt)
}

/// Apply a model reply to the live workout: strip the directive block
/// and insert every valid record through the normal set mutation path.
///
/// Records the orchestrator rejects (unknown exercise, bad measures) are
/// skipped; a broken directive never fails the conversational turn.
pub fn apply_reply(
    db: &mut Database,
    user_id: i64,
    workout_id: i64,
    reply: &str,
) -> TurnOutcome {
    let plan = directive::extract(reply);
    let mut sets_added = false;

    for planned in &plan.sets {
        let new = NewSet {
            workout_id,
            exercise_id: planned.exercise_id,
            kg: planned.kg,
            reps: planned.reps,
        };
        match workout::add_set(db, user_id, &new) {
            Ok(saved) => {
                info!(set_id = saved.set_id, exercise_id = planned.exercise_id,
                      "coach directive inserted set");
                sets_added = true;
            }
            Err(err) => {
                warn!(exercise_id = planned.exercise_id, %err,
                      "skipping coach directive record");
            }
        }
    }

    TurnOutcome {
        text: plan.text,
        sets_added,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Database, i64, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        let user = db::insert_user(db.conn(), "t@t.t", "h", 0).unwrap();
        let exercise = db::insert_exercise(db.conn(), user, "Bench Press", &[1]).unwrap();
        let workout = db::insert_workout(db.conn(), user, "Workout #1", "", None, 0).unwrap();
        (db, user, exercise, workout)
    }

    #[test]
    fn test_prompt_lists_exercises_and_session() {
        let (mut db, user, exercise, workout) = setup();
        workout::add_set(
            &mut db,
            user,
            &NewSet {
                workout_id: workout,
                exercise_id: exercise,
                kg: 80.0,
                reps: 8,
            },
        )
        .unwrap();

        let prompt = build_system_prompt(&db, user, workout).unwrap();
        assert!(prompt.contains(&format!("{exercise} - Bench Press")));
        assert!(prompt.contains("Bench Press: 80 kg"));
        assert!(prompt.contains("1. Bench Press 80 kg x 8"));
        assert!(prompt.contains("add-sets"));
    }

    #[test]
    fn test_prompt_for_unknown_workout_is_not_found() {
        let (db, user, _, _) = setup();
        assert!(matches!(
            build_system_prompt(&db, user, 999),
            Err(WorkoutError::NotFound)
        ));
    }

    #[test]
    fn test_reply_directive_inserts_sets_in_order() {
        let (mut db, user, exercise, workout) = setup();
        let reply = format!(
            "On it!\n```add-sets\n\
             [{{\"exerciseId\": {exercise}, \"kg\": 80, \"reps\": 8}},\n\
              {{\"exerciseId\": {exercise}, \"kg\": 80, \"reps\": 8}},\n\
              {{\"exerciseId\": {exercise}, \"kg\": 85, \"reps\": 5}}]\n```\nGood luck!"
        );

        let outcome = apply_reply(&mut db, user, workout, &reply);
        assert!(outcome.sets_added);
        assert_eq!(outcome.text, "On it!\n\nGood luck!");

        let sets = db::sets_for_workout(db.conn(), user, workout).unwrap();
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[0].kg, 80.0);
        assert_eq!(sets[2].kg, 85.0);
        assert_eq!(
            sets.iter().map(|s| s.position).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        // The heaviest inserted set took the record
        assert_eq!(db::exercise_pr(db.conn(), user, exercise).unwrap(), Some(85.0));
    }

    #[test]
    fn test_malformed_directive_inserts_nothing() {
        let (mut db, user, _, workout) = setup();
        let reply = "Try this.\n```add-sets\nnot json at all\n```";

        let outcome = apply_reply(&mut db, user, workout, reply);
        assert!(!outcome.sets_added);
        assert_eq!(outcome.text, "Try this.");
        assert!(db::sets_for_workout(db.conn(), user, workout).unwrap().is_empty());
    }

    #[test]
    fn test_directive_for_foreign_exercise_is_skipped() {
        let (mut db, user, exercise, workout) = setup();
        let stranger = db::insert_user(db.conn(), "other@x.y", "h", 0).unwrap();
        let foreign = db::insert_exercise(db.conn(), stranger, "Curl", &[5]).unwrap();

        let reply = format!(
            "Done.\n```add-sets\n\
             [{{\"exerciseId\": {foreign}, \"kg\": 20, \"reps\": 10}},\n\
              {{\"exerciseId\": {exercise}, \"kg\": 60, \"reps\": 10}}]\n```"
        );
        let outcome = apply_reply(&mut db, user, workout, &reply);

        // The foreign record is skipped, the valid one still lands
        assert!(outcome.sets_added);
        let sets = db::sets_for_workout(db.conn(), user, workout).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].exercise_id, exercise);
    }

    #[test]
    fn test_plain_reply_mutates_nothing() {
        let (mut db, user, _, workout) = setup();
        let outcome = apply_reply(&mut db, user, workout, "Rest today, you earned it.");
        assert!(!outcome.sets_added);
        assert_eq!(outcome.text, "Rest today, you earned it.");
        assert!(db::sets_for_workout(db.conn(), user, workout).unwrap().is_empty());
    }
}
