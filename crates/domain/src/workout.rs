use chrono::{DateTime, Duration, Utc};

use crate::{
    CreateError, Exercise, ExerciseID, ExerciseTree, Name, ReadError, RepsConfig, Score, SetKey,
    UserID, WeightConfig, WeightUnit,
};

#[allow(async_fn_in_trait)]
pub trait WorkoutService {
    async fn get_workouts(&self) -> Result<Vec<WorkoutRecord>, ReadError>;
    async fn create_workout(&self, workout: WorkoutRecord) -> Result<WorkoutRecord, CreateError>;
}

#[allow(async_fn_in_trait)]
pub trait WorkoutRepository {
    async fn read_workouts(&self) -> Result<Vec<WorkoutRecord>, ReadError>;
    async fn create_workout(&self, workout: WorkoutRecord) -> Result<WorkoutRecord, CreateError>;
}

/// A saved workout, restricted to the sets that were actually logged.
///
/// Exercises without logged sets are left out and their superset chains are spliced.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutRecord {
    pub owner: UserID,
    pub exercises: Vec<LoggedExercise>,
    pub created_at: DateTime<Utc>,
    pub total_workout_time: Duration,
    pub title: String,
    pub description: String,
    pub media_urls: Vec<String>,
    pub visibility: Visibility,
    pub added_exp: u64,
}

impl WorkoutRecord {
    #[must_use]
    pub fn new(
        owner: UserID,
        tree: &ExerciseTree,
        score: &Score,
        details: &WorkoutDetails,
        created_at: DateTime<Utc>,
        total_workout_time: Duration,
    ) -> Self {
        let exercises = tree
            .exercises()
            .filter(|e| e.has_loggable_sets())
            .map(|e| LoggedExercise::new(e, score.one_rep_maxes.get(&e.id).copied()))
            .collect::<Vec<_>>();
        let logged = exercises.iter().map(|e| e.id).collect::<Vec<_>>();
        let exercises = exercises
            .into_iter()
            .map(|mut e| {
                e.superset_exercise = tree
                    .chain(&e.id)
                    .into_iter()
                    .skip(1)
                    .find(|successor| logged.contains(successor));
                e
            })
            .collect();
        Self {
            owner,
            exercises,
            created_at,
            total_workout_time,
            title: details.title.trim().to_string(),
            description: details.description.clone(),
            media_urls: details.media_urls.clone(),
            visibility: details.visibility,
            added_exp: score.added_exp,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggedExercise {
    pub id: ExerciseID,
    pub name: Name,
    pub weight_config: WeightConfig,
    pub reps_config: RepsConfig,
    pub weight_unit: WeightUnit,
    pub sets: Vec<LoggedSet>,
    pub superset_exercise: Option<ExerciseID>,
    pub completed: bool,
    pub one_rep_max: Option<f64>,
}

impl LoggedExercise {
    fn new(exercise: &Exercise, one_rep_max: Option<f64>) -> Self {
        Self {
            id: exercise.id,
            name: exercise.name.clone(),
            weight_config: exercise.weight_config,
            reps_config: exercise.reps_config,
            weight_unit: exercise.weight_unit,
            sets: exercise
                .loggable_entries()
                .filter_map(|entry| {
                    Some(LoggedSet {
                        key: *entry.key,
                        load: exercise
                            .weight_config
                            .display_load(entry.weight, exercise.weight_unit),
                        unit: exercise.weight_unit,
                        reps: exercise.reps_config.to_record_value(entry.reps?),
                    })
                })
                .collect(),
            superset_exercise: None,
            completed: exercise.completed,
            one_rep_max,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggedSet {
    pub key: SetKey,
    /// Total load as displayed, e.g. `135`, `BW` or `BW + 25`.
    pub load: Option<String>,
    pub unit: WeightUnit,
    /// Count, or milliseconds for timed configurations.
    pub reps: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Public,
    Friends,
    Private,
}

/// User input collected when saving a finished workout.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WorkoutDetails {
    pub title: String,
    pub description: String,
    pub media_urls: Vec<String>,
    pub visibility: Visibility,
    pub allow_incomplete: bool,
    pub template_name: Option<String>,
}
