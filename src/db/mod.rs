//! Database module - SQLite storage for users, exercises, workouts and sets
//!
//! The `Database` struct owns the connection and the schema; the free
//! functions below are thin parameterized statements on `&Connection` so
//! they compose inside a `rusqlite::Transaction`. Every statement that
//! touches user-owned rows carries the owning `user_id` in its predicate.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::Serialize;

/// Registered account
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: i64,
    pub email: String,
    pub password_hash: String,
}

/// Exercise owned by a user, with its cached personal record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub exercise_id: i64,
    pub name: String,
    /// Heaviest weight ever logged for this exercise (0 when no sets)
    pub pr_kg: f64,
    pub muscle_groups: Vec<i64>,
}

/// A training session with its cached total load
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub workout_id: i64,
    pub name: String,
    pub description: String,
    pub rating: Option<i64>,
    /// Sum of kg*reps over the workout's sets
    pub total_load: f64,
    pub created_at: i64,
}

/// One logged set: weight x reps within a workout
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSet {
    pub set_id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub kg: f64,
    pub reps: i64,
    pub load: f64,
    pub is_pr: bool,
    /// Dense 1-based rank within the workout
    pub position: i64,
    pub created_at: i64,
}

/// Muscle group lookup row (shared by all users)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MuscleGroup {
    pub group_id: i64,
    pub name: String,
}

/// Per-workout weight maximum for an exercise
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightPoint {
    pub date: i64,
    pub max_kg: f64,
}

/// Per-workout accumulated load for an exercise
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPoint {
    pub date: i64,
    pub total_load: f64,
}

/// Seeded muscle group names, in id order starting at 1
const MUSCLE_GROUP_NAMES: &[&str] = &[
    "Chest",
    "Shoulders",
    "Triceps",
    "Back",
    "Biceps",
    "Forearms",
    "Core",
    "Glutes",
    "Quads",
    "Hamstrings",
    "Calves",
];

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// In-memory database for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema and seed lookup data
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS muscle_groups (
                group_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS exercises (
                exercise_id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                pr_kg REAL NOT NULL DEFAULT 0,
                muscle_group1 INTEGER,
                muscle_group2 INTEGER,
                muscle_group3 INTEGER,
                muscle_group4 INTEGER,
                muscle_group5 INTEGER
            );
            CREATE TABLE IF NOT EXISTS workouts (
                workout_id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                rating INTEGER,
                total_load REAL NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS sets (
                set_id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                workout_id INTEGER NOT NULL,
                exercise_id INTEGER NOT NULL,
                kg REAL NOT NULL,
                reps INTEGER NOT NULL,
                load REAL NOT NULL,
                is_pr INTEGER NOT NULL DEFAULT 0,
                position INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sets_workout ON sets (user_id, workout_id);
            CREATE INDEX IF NOT EXISTS idx_sets_exercise ON sets (user_id, exercise_id);",
        )?;

        for (i, name) in MUSCLE_GROUP_NAMES.iter().enumerate() {
            self.conn.execute(
                "INSERT OR IGNORE INTO muscle_groups (group_id, name) VALUES (?1, ?2)",
                params![i as i64 + 1, name],
            )?;
        }

        Ok(())
    }

    /// Read-only access to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction covering a multi-statement mutation
    pub fn transaction(&mut self) -> rusqlite::Result<Transaction<'_>> {
        self.conn.transaction()
    }
}

// ---------------------------------------------------------------------------
// Users

pub fn insert_user(
    conn: &Connection,
    email: &str,
    password_hash: &str,
    created_at: i64,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users (email, password_hash, created_at) VALUES (?1, ?2, ?3)",
        params![email, password_hash, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT user_id, email, password_hash FROM users WHERE email = ?1",
        params![email],
        |row| {
            Ok(User {
                user_id: row.get(0)?,
                email: row.get(1)?,
                password_hash: row.get(2)?,
            })
        },
    )
    .optional()
}

// ---------------------------------------------------------------------------
// Muscle groups

pub fn list_muscle_groups(conn: &Connection) -> rusqlite::Result<Vec<MuscleGroup>> {
    let mut stmt = conn.prepare("SELECT group_id, name FROM muscle_groups ORDER BY group_id")?;
    let rows = stmt.query_map([], |row| {
        Ok(MuscleGroup {
            group_id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    rows.collect()
}

// ---------------------------------------------------------------------------
// Exercises

const EXERCISE_COLS: &str = "exercise_id, name, pr_kg, \
     muscle_group1, muscle_group2, muscle_group3, muscle_group4, muscle_group5";

fn map_exercise(row: &Row<'_>) -> rusqlite::Result<Exercise> {
    let mut muscle_groups = Vec::new();
    for idx in 3..8usize {
        if let Some(group) = row.get::<_, Option<i64>>(idx)? {
            muscle_groups.push(group);
        }
    }
    Ok(Exercise {
        exercise_id: row.get(0)?,
        name: row.get(1)?,
        pr_kg: row.get(2)?,
        muscle_groups,
    })
}

/// Spread up to five muscle group ids over the five nullable columns
fn group_slots(groups: &[i64]) -> [Option<i64>; 5] {
    let mut slots = [None; 5];
    for (slot, group) in slots.iter_mut().zip(groups.iter()) {
        *slot = Some(*group);
    }
    slots
}

pub fn insert_exercise(
    conn: &Connection,
    user_id: i64,
    name: &str,
    muscle_groups: &[i64],
) -> rusqlite::Result<i64> {
    let g = group_slots(muscle_groups);
    conn.execute(
        "INSERT INTO exercises (user_id, name, pr_kg, \
         muscle_group1, muscle_group2, muscle_group3, muscle_group4, muscle_group5) \
         VALUES (?1, ?2, 0, ?3, ?4, ?5, ?6, ?7)",
        params![user_id, name, g[0], g[1], g[2], g[3], g[4]],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_exercise(
    conn: &Connection,
    user_id: i64,
    exercise_id: i64,
    name: &str,
    muscle_groups: &[i64],
) -> rusqlite::Result<usize> {
    let g = group_slots(muscle_groups);
    conn.execute(
        "UPDATE exercises SET name = ?1, \
         muscle_group1 = ?2, muscle_group2 = ?3, muscle_group3 = ?4, \
         muscle_group4 = ?5, muscle_group5 = ?6 \
         WHERE exercise_id = ?7 AND user_id = ?8",
        params![name, g[0], g[1], g[2], g[3], g[4], exercise_id, user_id],
    )
}

pub fn get_exercise(
    conn: &Connection,
    user_id: i64,
    exercise_id: i64,
) -> rusqlite::Result<Option<Exercise>> {
    conn.query_row(
        &format!("SELECT {EXERCISE_COLS} FROM exercises WHERE exercise_id = ?1 AND user_id = ?2"),
        params![exercise_id, user_id],
        map_exercise,
    )
    .optional()
}

pub fn list_exercises(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Exercise>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EXERCISE_COLS} FROM exercises WHERE user_id = ?1 ORDER BY name ASC"
    ))?;
    let rows = stmt.query_map(params![user_id], map_exercise)?;
    rows.collect()
}

pub fn exercise_pr(
    conn: &Connection,
    user_id: i64,
    exercise_id: i64,
) -> rusqlite::Result<Option<f64>> {
    conn.query_row(
        "SELECT pr_kg FROM exercises WHERE exercise_id = ?1 AND user_id = ?2",
        params![exercise_id, user_id],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_exercise_pr(
    conn: &Connection,
    user_id: i64,
    exercise_id: i64,
    pr_kg: f64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE exercises SET pr_kg = ?1 WHERE exercise_id = ?2 AND user_id = ?3",
        params![pr_kg, exercise_id, user_id],
    )
}

/// Atomic conditional promote: only writes when `kg` beats the stored PR.
/// Returns true when the row was written.
pub fn promote_pr_if_higher(
    conn: &Connection,
    user_id: i64,
    exercise_id: i64,
    kg: f64,
) -> rusqlite::Result<bool> {
    let written = conn.execute(
        "UPDATE exercises SET pr_kg = ?1 \
         WHERE exercise_id = ?2 AND user_id = ?3 AND ?1 > pr_kg",
        params![kg, exercise_id, user_id],
    )?;
    Ok(written > 0)
}

/// The workout containing the PR-flagged set for an exercise
pub fn pr_workout_for_exercise(
    conn: &Connection,
    user_id: i64,
    exercise_id: i64,
) -> rusqlite::Result<Option<Workout>> {
    conn.query_row(
        "SELECT workout_id, name, description, rating, total_load, created_at \
         FROM workouts \
         WHERE user_id = ?1 AND workout_id IN \
           (SELECT workout_id FROM sets \
            WHERE user_id = ?1 AND exercise_id = ?2 AND is_pr = 1)",
        params![user_id, exercise_id],
        map_workout,
    )
    .optional()
}

// ---------------------------------------------------------------------------
// Workouts

const WORKOUT_COLS: &str = "workout_id, name, description, rating, total_load, created_at";

fn map_workout(row: &Row<'_>) -> rusqlite::Result<Workout> {
    Ok(Workout {
        workout_id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        rating: row.get(3)?,
        total_load: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn insert_workout(
    conn: &Connection,
    user_id: i64,
    name: &str,
    description: &str,
    rating: Option<i64>,
    created_at: i64,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO workouts (user_id, name, description, rating, total_load, created_at) \
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![user_id, name, description, rating, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn count_workouts(conn: &Connection, user_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM workouts WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )
}

pub fn get_workout(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
) -> rusqlite::Result<Option<Workout>> {
    conn.query_row(
        &format!("SELECT {WORKOUT_COLS} FROM workouts WHERE workout_id = ?1 AND user_id = ?2"),
        params![workout_id, user_id],
        map_workout,
    )
    .optional()
}

pub fn update_workout_meta(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
    name: &str,
    description: &str,
    rating: Option<i64>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE workouts SET name = ?1, description = ?2, rating = ?3 \
         WHERE workout_id = ?4 AND user_id = ?5",
        params![name, description, rating, workout_id, user_id],
    )
}

pub fn list_workouts_between(
    conn: &Connection,
    user_id: i64,
    from: i64,
    to: i64,
) -> rusqlite::Result<Vec<Workout>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {WORKOUT_COLS} FROM workouts \
         WHERE user_id = ?1 AND created_at > ?2 AND created_at < ?3 \
         ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![user_id, from, to], map_workout)?;
    rows.collect()
}

pub fn recent_workouts(
    conn: &Connection,
    user_id: i64,
    limit: i64,
) -> rusqlite::Result<Vec<Workout>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {WORKOUT_COLS} FROM workouts WHERE user_id = ?1 \
         ORDER BY created_at DESC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![user_id, limit], map_workout)?;
    rows.collect()
}

pub fn delete_workout_row(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM workouts WHERE workout_id = ?1 AND user_id = ?2",
        params![workout_id, user_id],
    )
}

pub fn workout_total(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
) -> rusqlite::Result<Option<f64>> {
    conn.query_row(
        "SELECT total_load FROM workouts WHERE workout_id = ?1 AND user_id = ?2",
        params![workout_id, user_id],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_workout_total(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
    total_load: f64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE workouts SET total_load = ?1 WHERE workout_id = ?2 AND user_id = ?3",
        params![total_load, workout_id, user_id],
    )
}

/// Atomic in-store increment, used only when the delta is known exact
pub fn add_workout_total(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
    delta: f64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE workouts SET total_load = total_load + ?1 \
         WHERE workout_id = ?2 AND user_id = ?3",
        params![delta, workout_id, user_id],
    )
}

pub fn sum_set_loads(conn: &Connection, user_id: i64, workout_id: i64) -> rusqlite::Result<f64> {
    conn.query_row(
        "SELECT COALESCE(SUM(kg * reps), 0) FROM sets \
         WHERE workout_id = ?1 AND user_id = ?2",
        params![workout_id, user_id],
        |row| row.get(0),
    )
}

// ---------------------------------------------------------------------------
// Sets

const SET_COLS: &str =
    "set_id, workout_id, exercise_id, kg, reps, load, is_pr, position, created_at";

fn map_set(row: &Row<'_>) -> rusqlite::Result<WorkoutSet> {
    Ok(WorkoutSet {
        set_id: row.get(0)?,
        workout_id: row.get(1)?,
        exercise_id: row.get(2)?,
        kg: row.get(3)?,
        reps: row.get(4)?,
        load: row.get(5)?,
        is_pr: row.get(6)?,
        position: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[allow(clippy::too_many_arguments)]
pub fn insert_set(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
    exercise_id: i64,
    kg: f64,
    reps: i64,
    is_pr: bool,
    position: i64,
    created_at: i64,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO sets \
         (user_id, workout_id, exercise_id, kg, reps, load, is_pr, position, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user_id,
            workout_id,
            exercise_id,
            kg,
            reps,
            kg * reps as f64,
            is_pr,
            position,
            created_at
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_set(conn: &Connection, user_id: i64, set_id: i64) -> rusqlite::Result<Option<WorkoutSet>> {
    conn.query_row(
        &format!("SELECT {SET_COLS} FROM sets WHERE set_id = ?1 AND user_id = ?2"),
        params![set_id, user_id],
        map_set,
    )
    .optional()
}

pub fn update_set_row(
    conn: &Connection,
    user_id: i64,
    set_id: i64,
    exercise_id: i64,
    kg: f64,
    reps: i64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE sets SET exercise_id = ?1, kg = ?2, reps = ?3, load = ?4 \
         WHERE set_id = ?5 AND user_id = ?6",
        params![exercise_id, kg, reps, kg * reps as f64, set_id, user_id],
    )
}

pub fn delete_set_row(conn: &Connection, user_id: i64, set_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM sets WHERE set_id = ?1 AND user_id = ?2",
        params![set_id, user_id],
    )
}

pub fn delete_sets_for_workout(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM sets WHERE workout_id = ?1 AND user_id = ?2",
        params![workout_id, user_id],
    )
}

/// Distinct exercises that have sets in a workout
pub fn exercises_in_workout(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT exercise_id FROM sets WHERE workout_id = ?1 AND user_id = ?2",
    )?;
    let rows = stmt.query_map(params![workout_id, user_id], |row| row.get(0))?;
    rows.collect()
}

/// Sets of a workout in display order
pub fn sets_for_workout(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
) -> rusqlite::Result<Vec<WorkoutSet>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SET_COLS} FROM sets WHERE workout_id = ?1 AND user_id = ?2 \
         ORDER BY position ASC, set_id ASC"
    ))?;
    let rows = stmt.query_map(params![workout_id, user_id], map_set)?;
    rows.collect()
}

pub fn max_position(conn: &Connection, user_id: i64, workout_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(position), 0) FROM sets \
         WHERE workout_id = ?1 AND user_id = ?2",
        params![workout_id, user_id],
        |row| row.get(0),
    )
}

pub fn set_position(
    conn: &Connection,
    user_id: i64,
    set_id: i64,
    position: i64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE sets SET position = ?1 WHERE set_id = ?2 AND user_id = ?3",
        params![position, set_id, user_id],
    )
}

pub fn max_kg_for_exercise(
    conn: &Connection,
    user_id: i64,
    exercise_id: i64,
) -> rusqlite::Result<Option<f64>> {
    conn.query_row(
        "SELECT MAX(kg) FROM sets WHERE exercise_id = ?1 AND user_id = ?2",
        params![exercise_id, user_id],
        |row| row.get(0),
    )
}

pub fn clear_pr_flags(
    conn: &Connection,
    user_id: i64,
    exercise_id: i64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE sets SET is_pr = 0 WHERE exercise_id = ?1 AND user_id = ?2 AND is_pr = 1",
        params![exercise_id, user_id],
    )
}

/// Flag the record holder at `max_kg`: the earliest set (lowest id) among
/// ties. Returns the flagged set id when one exists.
pub fn flag_record_set(
    conn: &Connection,
    user_id: i64,
    exercise_id: i64,
    max_kg: f64,
) -> rusqlite::Result<Option<i64>> {
    let holder: Option<i64> = conn
        .query_row(
            "SELECT MIN(set_id) FROM sets \
             WHERE exercise_id = ?1 AND user_id = ?2 AND kg = ?3",
            params![exercise_id, user_id, max_kg],
            |row| row.get(0),
        )
        .optional()?
        .flatten();

    if let Some(set_id) = holder {
        conn.execute(
            "UPDATE sets SET is_pr = 1 WHERE set_id = ?1 AND user_id = ?2",
            params![set_id, user_id],
        )?;
    }
    Ok(holder)
}

pub fn record_set_id(
    conn: &Connection,
    user_id: i64,
    exercise_id: i64,
) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT set_id FROM sets \
         WHERE exercise_id = ?1 AND user_id = ?2 AND is_pr = 1",
        params![exercise_id, user_id],
        |row| row.get(0),
    )
    .optional()
}

// ---------------------------------------------------------------------------
// Exercise history

pub fn weight_history(
    conn: &Connection,
    user_id: i64,
    exercise_id: i64,
) -> rusqlite::Result<Vec<WeightPoint>> {
    let mut stmt = conn.prepare(
        "SELECT w.created_at, MAX(s.kg) FROM workouts w \
         JOIN sets s ON w.workout_id = s.workout_id \
         WHERE s.exercise_id = ?1 AND w.user_id = ?2 \
         GROUP BY w.workout_id \
         ORDER BY w.created_at DESC",
    )?;
    let rows = stmt.query_map(params![exercise_id, user_id], |row| {
        Ok(WeightPoint {
            date: row.get(0)?,
            max_kg: row.get(1)?,
        })
    })?;
    rows.collect()
}

pub fn load_history(
    conn: &Connection,
    user_id: i64,
    exercise_id: i64,
) -> rusqlite::Result<Vec<LoadPoint>> {
    let mut stmt = conn.prepare(
        "SELECT w.created_at, COALESCE(SUM(s.kg * s.reps), 0) FROM workouts w \
         JOIN sets s ON w.workout_id = s.workout_id \
         WHERE s.exercise_id = ?1 AND w.user_id = ?2 \
         GROUP BY w.workout_id \
         ORDER BY w.created_at DESC",
    )?;
    let rows = stmt.query_map(params![exercise_id, user_id], |row| {
        Ok(LoadPoint {
            date: row.get(0)?,
            total_load: row.get(1)?,
        })
    })?;
    rows.collect()
}

/// Exercises that hold a personal record, for the coach context
pub fn pr_list(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<(String, f64)>> {
    let mut stmt = conn.prepare(
        "SELECT name, pr_kg FROM exercises \
         WHERE user_id = ?1 AND pr_kg > 0 ORDER BY name ASC",
    )?;
    let rows = stmt.query_map(params![user_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}
