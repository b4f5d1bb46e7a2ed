//! HTTP endpoint handlers
//!
//! Request bodies are camelCase JSON. Each handler validates its input,
//! takes the database lock, and delegates to the store gateway or the
//! workout core; responses reuse the core's serializable types.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::ApiError;
use super::{AppState, AuthUser};
use crate::assistant::{self, Role, Turn};
use crate::auth;
use crate::db::{self, Exercise, LoadPoint, MuscleGroup, WeightPoint, Workout, WorkoutSet};
use crate::workout::{self, NewSet, SetPosition, SetSaved, SetUpdate};

// ---------------------------------------------------------------------------
// Shared response shapes

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ---------------------------------------------------------------------------
// Accounts

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Minimum eight characters, at least one letter and one number
fn validate_credentials(req: &Credentials) -> Result<(), ApiError> {
    let email = req.email.trim();
    if !email.contains('@') || !email.contains('.') || email.len() < 5 {
        return Err(ApiError::Validation("invalid email".to_string()));
    }
    let password = &req.password;
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if password.len() < 8 || !has_letter || !has_digit {
        return Err(ApiError::Validation(
            "password needs at least 8 characters with a letter and a number".to_string(),
        ));
    }
    Ok(())
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<Json<TokenResponse>, ApiError> {
    validate_credentials(&req)?;
    let email = req.email.trim().to_string();
    let hash = auth::hash_password(&req.password);
    let now = Utc::now().timestamp();

    let user_id = {
        let db = state.db.lock().await;
        match db::insert_user(db.conn(), &email, &hash, now) {
            Ok(id) => id,
            Err(err) if is_unique_violation(&err) => {
                return Err(ApiError::Conflict("email already registered"));
            }
            Err(err) => return Err(err.into()),
        }
    };

    let token = state
        .tokens
        .issue(user_id, &email)
        .map_err(|_| ApiError::Internal)?;
    Ok(Json(TokenResponse { token }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = {
        let db = state.db.lock().await;
        db::find_user_by_email(db.conn(), req.email.trim())?
    };
    let Some(user) = user else {
        return Err(ApiError::Unauthorized);
    };
    if !auth::verify_password(&user.password_hash, &req.password) {
        return Err(ApiError::Unauthorized);
    }

    let token = state
        .tokens
        .issue(user.user_id, &user.email)
        .map_err(|_| ApiError::Internal)?;
    Ok(Json(TokenResponse { token }))
}

// ---------------------------------------------------------------------------
// Muscle groups

pub async fn list_muscle_groups(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<MuscleGroup>>, ApiError> {
    let db = state.db.lock().await;
    Ok(Json(db::list_muscle_groups(db.conn())?))
}

// ---------------------------------------------------------------------------
// Exercises

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRequest {
    pub name: String,
    pub muscle_groups: Vec<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseCreated {
    pub exercise_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDetail {
    #[serde(flatten)]
    pub exercise: Exercise,
    /// Workout containing the record-holding set, when one exists
    pub pr_workout: Option<Workout>,
}

fn validate_exercise(req: &ExerciseRequest) -> Result<(), ApiError> {
    if req.name.trim().len() < 3 {
        return Err(ApiError::Validation(
            "exercise name needs at least 3 characters".to_string(),
        ));
    }
    if req.muscle_groups.is_empty() || req.muscle_groups.len() > 5 {
        return Err(ApiError::Validation(
            "pick between 1 and 5 muscle groups".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_exercise(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ExerciseRequest>,
) -> Result<Json<ExerciseCreated>, ApiError> {
    validate_exercise(&req)?;
    let db = state.db.lock().await;
    let exercise_id = db::insert_exercise(
        db.conn(),
        user.user_id,
        req.name.trim(),
        &req.muscle_groups,
    )?;
    Ok(Json(ExerciseCreated { exercise_id }))
}

pub async fn edit_exercise(
    State(state): State<AppState>,
    user: AuthUser,
    Path(exercise_id): Path<i64>,
    Json(req): Json<ExerciseRequest>,
) -> Result<Json<Message>, ApiError> {
    validate_exercise(&req)?;
    let db = state.db.lock().await;
    let updated = db::update_exercise(
        db.conn(),
        user.user_id,
        exercise_id,
        req.name.trim(),
        &req.muscle_groups,
    )?;
    if updated == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(Message {
        message: "exercise updated",
    }))
}

pub async fn list_exercises(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Exercise>>, ApiError> {
    let db = state.db.lock().await;
    Ok(Json(db::list_exercises(db.conn(), user.user_id)?))
}

pub async fn get_exercise(
    State(state): State<AppState>,
    user: AuthUser,
    Path(exercise_id): Path<i64>,
) -> Result<Json<ExerciseDetail>, ApiError> {
    let db = state.db.lock().await;
    let Some(exercise) = db::get_exercise(db.conn(), user.user_id, exercise_id)? else {
        return Err(ApiError::NotFound);
    };
    let pr_workout = db::pr_workout_for_exercise(db.conn(), user.user_id, exercise_id)?;
    Ok(Json(ExerciseDetail {
        exercise,
        pr_workout,
    }))
}

pub async fn weight_history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(exercise_id): Path<i64>,
) -> Result<Json<Vec<WeightPoint>>, ApiError> {
    let db = state.db.lock().await;
    if db::get_exercise(db.conn(), user.user_id, exercise_id)?.is_none() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(db::weight_history(db.conn(), user.user_id, exercise_id)?))
}

pub async fn load_history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(exercise_id): Path<i64>,
) -> Result<Json<Vec<LoadPoint>>, ApiError> {
    let db = state.db.lock().await;
    if db::get_exercise(db.conn(), user.user_id, exercise_id)?.is_none() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(db::load_history(db.conn(), user.user_id, exercise_id)?))
}

// ---------------------------------------------------------------------------
// Workouts

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkoutRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutCreated {
    pub workout_id: i64,
    pub name: String,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditWorkoutRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: i64,
    pub to: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDetail {
    pub workout: Workout,
    pub sets: Vec<WorkoutSet>,
}

fn validate_rating(rating: Option<i64>) -> Result<(), ApiError> {
    if let Some(r) = rating {
        if !(1..=5).contains(&r) {
            return Err(ApiError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }
    }
    Ok(())
}

pub async fn create_workout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<NewWorkoutRequest>,
) -> Result<Json<WorkoutCreated>, ApiError> {
    validate_rating(req.rating)?;
    let created_at = Utc::now().timestamp();

    let db = state.db.lock().await;
    let name = match req.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("Workout #{}", db::count_workouts(db.conn(), user.user_id)? + 1),
    };
    let workout_id = db::insert_workout(
        db.conn(),
        user.user_id,
        &name,
        req.description.as_deref().unwrap_or(""),
        Some(req.rating.unwrap_or(3)),
        created_at,
    )?;

    Ok(Json(WorkoutCreated {
        workout_id,
        name,
        created_at,
    }))
}

pub async fn edit_workout(
    State(state): State<AppState>,
    user: AuthUser,
    Path(workout_id): Path<i64>,
    Json(req): Json<EditWorkoutRequest>,
) -> Result<Json<Workout>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("workout name must not be empty".to_string()));
    }
    validate_rating(req.rating)?;

    let db = state.db.lock().await;
    let updated = db::update_workout_meta(
        db.conn(),
        user.user_id,
        workout_id,
        req.name.trim(),
        req.description.as_deref().unwrap_or(""),
        req.rating,
    )?;
    if updated == 0 {
        return Err(ApiError::NotFound);
    }
    let workout = db::get_workout(db.conn(), user.user_id, workout_id)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(workout))
}

pub async fn list_workouts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<Workout>>, ApiError> {
    if range.from >= range.to {
        return Err(ApiError::Validation(
            "range start must come before range end".to_string(),
        ));
    }
    let db = state.db.lock().await;
    Ok(Json(db::list_workouts_between(
        db.conn(),
        user.user_id,
        range.from,
        range.to,
    )?))
}

pub async fn get_workout(
    State(state): State<AppState>,
    user: AuthUser,
    Path(workout_id): Path<i64>,
) -> Result<Json<WorkoutDetail>, ApiError> {
    let db = state.db.lock().await;
    let Some(workout) = db::get_workout(db.conn(), user.user_id, workout_id)? else {
        return Err(ApiError::NotFound);
    };
    let sets = db::sets_for_workout(db.conn(), user.user_id, workout_id)?;
    Ok(Json(WorkoutDetail { workout, sets }))
}

pub async fn delete_workout(
    State(state): State<AppState>,
    user: AuthUser,
    Path(workout_id): Path<i64>,
) -> Result<Json<Message>, ApiError> {
    let mut db = state.db.lock().await;
    workout::delete_workout(&mut db, user.user_id, workout_id)?;
    Ok(Json(Message {
        message: "workout deleted",
    }))
}

// ---------------------------------------------------------------------------
// Sets

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSetRequest {
    pub workout_id: i64,
    pub exercise_id: i64,
    pub kg: f64,
    pub reps: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSetRequest {
    pub exercise_id: i64,
    pub kg: f64,
    pub reps: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSetResponse {
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_load: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub set_id: i64,
    pub target_index: i64,
}

#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    pub order: Vec<SetPosition>,
}

fn validate_measures(kg: f64, reps: i64) -> Result<(), ApiError> {
    if !(kg >= 0.0) {
        return Err(ApiError::Validation("kg must be at least 0".to_string()));
    }
    if reps < 1 {
        return Err(ApiError::Validation("reps must be at least 1".to_string()));
    }
    Ok(())
}

pub async fn add_set(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AddSetRequest>,
) -> Result<Json<SetSaved>, ApiError> {
    validate_measures(req.kg, req.reps)?;
    let mut db = state.db.lock().await;
    let saved = workout::add_set(
        &mut db,
        user.user_id,
        &NewSet {
            workout_id: req.workout_id,
            exercise_id: req.exercise_id,
            kg: req.kg,
            reps: req.reps,
        },
    )?;
    Ok(Json(saved))
}

pub async fn edit_set(
    State(state): State<AppState>,
    user: AuthUser,
    Path(set_id): Path<i64>,
    Json(req): Json<EditSetRequest>,
) -> Result<Json<SetSaved>, ApiError> {
    validate_measures(req.kg, req.reps)?;
    let mut db = state.db.lock().await;
    let saved = workout::edit_set(
        &mut db,
        user.user_id,
        set_id,
        &SetUpdate {
            exercise_id: req.exercise_id,
            kg: req.kg,
            reps: req.reps,
        },
    )?;
    Ok(Json(saved))
}

pub async fn delete_set(
    State(state): State<AppState>,
    user: AuthUser,
    Path(set_id): Path<i64>,
) -> Result<Json<DeleteSetResponse>, ApiError> {
    let mut db = state.db.lock().await;
    let response = match workout::delete_set(&mut db, user.user_id, set_id)? {
        Some(total_load) => DeleteSetResponse {
            deleted: true,
            total_load: Some(total_load),
        },
        None => DeleteSetResponse {
            deleted: false,
            total_load: None,
        },
    };
    Ok(Json(response))
}

pub async fn reorder_sets(
    State(state): State<AppState>,
    user: AuthUser,
    Path(workout_id): Path<i64>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>, ApiError> {
    let mut db = state.db.lock().await;
    let order = workout::reorder_sets(
        &mut db,
        user.user_id,
        workout_id,
        req.set_id,
        req.target_index,
    )?;
    Ok(Json(ReorderResponse { order }))
}

// ---------------------------------------------------------------------------
// Coach

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachRequest {
    pub workout_id: i64,
    pub message: String,
    #[serde(default)]
    pub history: Vec<Turn>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachResponse {
    pub response: String,
    /// Updated transcript for the client to carry into the next turn
    pub history: Vec<Turn>,
    pub sets_added: bool,
}

pub async fn coach_turn(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CoachRequest>,
) -> Result<Json<CoachResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::Validation("message must not be empty".to_string()));
    }
    let Some(client) = state.coach.clone() else {
        warn!("coach endpoint called without a configured model");
        return Err(ApiError::Assistant);
    };

    // Gather context under the lock, then release it for the model call
    let system = {
        let db = state.db.lock().await;
        assistant::build_system_prompt(&db, user.user_id, req.workout_id)?
    };

    let mut history = req.history;
    history.push(Turn {
        role: Role::User,
        text: req.message,
    });

    // Side effects happen only after a successful reply
    let reply = client.generate(&system, &history).await?;

    let outcome = {
        let mut db = state.db.lock().await;
        assistant::apply_reply(&mut db, user.user_id, req.workout_id, &reply)
    };

    history.push(Turn {
        role: Role::Model,
        text: outcome.text.clone(),
    });

    Ok(Json(CoachResponse {
        response: outcome.text,
        history,
        sets_added: outcome.sets_added,
    }))
}
