use chrono::{DateTime, Duration, Utc};
use liftlog_domain::{self as domain, CacheError, SessionCacheRepository, SettingsRepository};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use strum::AsRefStr;
use uuid::Uuid;

use crate::KeyValueStore;

#[derive(AsRefStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey {
    #[strum(serialize = "currentWorkout")]
    CurrentWorkout,
    #[strum(serialize = "startTime")]
    StartTime,
    #[strum(serialize = "elapsedTime")]
    ElapsedTime,
    #[strum(serialize = "pauseState")]
    PauseState,
    #[strum(serialize = "sessionOwner")]
    SessionOwner,
    #[strum(serialize = "settings")]
    Settings,
}

const SESSION_KEYS: [CacheKey; 5] = [
    CacheKey::CurrentWorkout,
    CacheKey::StartTime,
    CacheKey::ElapsedTime,
    CacheKey::PauseState,
    CacheKey::SessionOwner,
];

/// JSON encoding of the session cache and the settings on top of a [`KeyValueStore`].
pub struct Cache<S> {
    store: S,
}

impl<S: KeyValueStore> Cache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read<T: DeserializeOwned>(&self, key: CacheKey) -> Result<Option<T>, CacheError> {
        self.store
            .get(key.as_ref())?
            .map(|value| serde_json::from_str(&value).map_err(|err| corrupt(key, err)))
            .transpose()
    }

    fn write<T: Serialize>(&self, key: CacheKey, value: &T) -> Result<(), CacheError> {
        let value = serde_json::to_string(value).map_err(|err| corrupt(key, err))?;
        self.store.set(key.as_ref(), &value)
    }
}

fn corrupt(key: CacheKey, reason: impl ToString) -> CacheError {
    CacheError::Corrupt {
        key: key.as_ref().to_string(),
        reason: reason.to_string(),
    }
}

impl<S: KeyValueStore> SessionCacheRepository for Cache<S> {
    fn read_current_workout(&self) -> Result<Option<domain::ExerciseTree>, CacheError> {
        self.read::<CurrentWorkout>(CacheKey::CurrentWorkout)?
            .map(|workout| {
                domain::ExerciseTree::try_from(workout)
                    .map_err(|err| corrupt(CacheKey::CurrentWorkout, err))
            })
            .transpose()
    }

    fn write_current_workout(&self, tree: &domain::ExerciseTree) -> Result<(), CacheError> {
        self.write(CacheKey::CurrentWorkout, &CurrentWorkout::from(tree))
    }

    fn read_start_time(&self) -> Result<Option<DateTime<Utc>>, CacheError> {
        self.read::<i64>(CacheKey::StartTime)?
            .map(|millis| timestamp(millis).map_err(|err| corrupt(CacheKey::StartTime, err)))
            .transpose()
    }

    fn write_start_time(&self, start_time: Option<DateTime<Utc>>) -> Result<(), CacheError> {
        match start_time {
            Some(start_time) => self.write(CacheKey::StartTime, &start_time.timestamp_millis()),
            None => self.store.remove(CacheKey::StartTime.as_ref()),
        }
    }

    fn read_elapsed_time(&self) -> Result<Option<Duration>, CacheError> {
        self.read::<u64>(CacheKey::ElapsedTime)?
            .map(|seconds| {
                i64::try_from(seconds)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .ok_or_else(|| {
                        corrupt(CacheKey::ElapsedTime, CacheDataError::Duration(seconds))
                    })
            })
            .transpose()
    }

    fn write_elapsed_time(&self, elapsed: Duration) -> Result<(), CacheError> {
        let seconds = u64::try_from(elapsed.num_seconds()).unwrap_or(0);
        self.write(CacheKey::ElapsedTime, &seconds)
    }

    fn read_pause_state(&self) -> Result<Option<domain::PauseState>, CacheError> {
        self.read::<PauseState>(CacheKey::PauseState)?
            .map(|pause_state| {
                domain::PauseState::try_from(pause_state)
                    .map_err(|err| corrupt(CacheKey::PauseState, err))
            })
            .transpose()
    }

    fn write_pause_state(&self, pause_state: &domain::PauseState) -> Result<(), CacheError> {
        self.write(CacheKey::PauseState, &PauseState::from(pause_state))
    }

    fn read_session_owner(&self) -> Result<Option<domain::UserID>, CacheError> {
        Ok(self
            .read::<Uuid>(CacheKey::SessionOwner)?
            .map(domain::UserID::from))
    }

    fn write_session_owner(&self, owner: domain::UserID) -> Result<(), CacheError> {
        self.write(CacheKey::SessionOwner, &*owner)
    }

    /// Removes every session entry, even if removing one of them fails.
    fn clear_session(&self) -> Result<(), CacheError> {
        let mut result = Ok(());
        for key in SESSION_KEYS {
            if let Err(err) = self.store.remove(key.as_ref()) {
                result = result.and(Err(err));
            }
        }
        result
    }
}

impl<S: KeyValueStore> SettingsRepository for Cache<S> {
    fn read_settings(&self) -> Result<Option<domain::Settings>, CacheError> {
        Ok(self
            .read::<Settings>(CacheKey::Settings)?
            .map(domain::Settings::from))
    }

    fn write_settings(&self, settings: &domain::Settings) -> Result<(), CacheError> {
        self.write(CacheKey::Settings, &Settings::from(*settings))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CacheDataError {
    #[error(transparent)]
    InvalidName(#[from] domain::NameError),
    #[error(transparent)]
    InvalidWeight(#[from] domain::WeightError),
    #[error(transparent)]
    InvalidReps(#[from] domain::RepsError),
    #[error(transparent)]
    InvalidSetKey(#[from] domain::SetKeyError),
    #[error("expected {expected}, found {found}")]
    MisplacedSet {
        expected: domain::SetKey,
        found: domain::SetKey,
    },
    #[error(transparent)]
    InvalidTree(#[from] domain::TreeError),
    #[error("timestamp out of range: {0}")]
    Timestamp(i64),
    #[error("duration out of range: {0}")]
    Duration(u64),
}

/// `{"exercises": [...]}`, an object without `exercises` is an empty workout.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CurrentWorkout {
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl From<&domain::ExerciseTree> for CurrentWorkout {
    fn from(value: &domain::ExerciseTree) -> Self {
        Self {
            exercises: value
                .exercises()
                .map(|exercise| Exercise {
                    superset_exercise: value.superset_of(&exercise.id).map(|id| *id),
                    ..exercise.into()
                })
                .collect(),
        }
    }
}

impl TryFrom<CurrentWorkout> for domain::ExerciseTree {
    type Error = CacheDataError;

    fn try_from(value: CurrentWorkout) -> Result<Self, Self::Error> {
        let supersets = value
            .exercises
            .iter()
            .filter_map(|e| Some((e.id.into(), e.superset_exercise?.into())))
            .collect::<Vec<(domain::ExerciseID, domain::ExerciseID)>>();
        let exercises = value
            .exercises
            .into_iter()
            .map(domain::Exercise::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(domain::ExerciseTree::from_parts(exercises, supersets)?)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub weight_config: WeightConfig,
    pub reps_config: RepsConfig,
    pub weight_unit: WeightUnit,
    #[serde(default)]
    pub sets: Vec<Set>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superset_exercise: Option<Uuid>,
    #[serde(default)]
    pub completed: bool,
}

impl From<&domain::Exercise> for Exercise {
    fn from(value: &domain::Exercise) -> Self {
        Self {
            id: *value.id,
            name: value.name.to_string(),
            weight_config: value.weight_config.into(),
            reps_config: value.reps_config.into(),
            weight_unit: value.weight_unit.into(),
            sets: value.sets.iter().map(Set::from).collect(),
            superset_exercise: None,
            completed: value.completed,
        }
    }
}

impl TryFrom<Exercise> for domain::Exercise {
    type Error = CacheDataError;

    fn try_from(value: Exercise) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            name: domain::Name::new(&value.name)?,
            weight_config: value.weight_config.into(),
            reps_config: value.reps_config.into(),
            weight_unit: value.weight_unit.into(),
            sets: value
                .sets
                .into_iter()
                .enumerate()
                .map(|(idx, set)| set.into_domain(ordinal(idx)))
                .collect::<Result<Vec<_>, _>>()?,
            completed: value.completed,
        })
    }
}

/// Loads and reps are kept as the numeric strings the user entered.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Set {
    pub key: String,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub reps: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drop_sets: Vec<DropSet>,
}

impl From<&domain::Set> for Set {
    fn from(value: &domain::Set) -> Self {
        Self {
            key: value.key.to_string(),
            weight: value.weight.map(|weight| weight.to_string()),
            reps: value.reps.map(|reps| reps.to_string()),
            drop_sets: value.drop_sets.iter().map(DropSet::from).collect(),
        }
    }
}

impl Set {
    fn into_domain(self, number: u32) -> Result<domain::Set, CacheDataError> {
        Ok(domain::Set {
            key: expect_key(&self.key, domain::SetKey::set(number))?,
            weight: self.weight.as_deref().map(parse_weight).transpose()?,
            reps: self.reps.as_deref().map(parse_reps).transpose()?,
            drop_sets: self
                .drop_sets
                .into_iter()
                .enumerate()
                .map(|(idx, drop_set)| drop_set.into_domain(number, ordinal(idx)))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DropSet {
    pub key: String,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub reps: Option<String>,
}

impl From<&domain::DropSet> for DropSet {
    fn from(value: &domain::DropSet) -> Self {
        Self {
            key: value.key.to_string(),
            weight: value.weight.map(|weight| weight.to_string()),
            reps: value.reps.map(|reps| reps.to_string()),
        }
    }
}

impl DropSet {
    fn into_domain(self, set: u32, number: u32) -> Result<domain::DropSet, CacheDataError> {
        Ok(domain::DropSet {
            key: expect_key(&self.key, domain::SetKey::drop_set(set, number))?,
            weight: self.weight.as_deref().map(parse_weight).transpose()?,
            reps: self.reps.as_deref().map(parse_reps).transpose()?,
        })
    }
}

fn ordinal(idx: usize) -> u32 {
    u32::try_from(idx + 1).unwrap_or(u32::MAX)
}

fn expect_key(key: &str, expected: domain::SetKey) -> Result<domain::SetKey, CacheDataError> {
    let found = key.parse::<domain::SetKey>()?;
    if found == expected {
        Ok(found)
    } else {
        Err(CacheDataError::MisplacedSet { expected, found })
    }
}

fn parse_weight(weight: &str) -> Result<domain::Weight, domain::WeightError> {
    domain::Weight::try_from(weight)
}

fn parse_reps(reps: &str) -> Result<domain::Reps, domain::RepsError> {
    reps.trim()
        .parse::<u32>()
        .map_err(|_| domain::RepsError::ParseError)
        .and_then(domain::Reps::new)
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum WeightConfig {
    TotalWeight,
    PerSide,
    PerSidePlusBar,
    Bodyweight,
    BodyweightPlusExtra,
}

impl From<domain::WeightConfig> for WeightConfig {
    fn from(value: domain::WeightConfig) -> Self {
        match value {
            domain::WeightConfig::TotalWeight => Self::TotalWeight,
            domain::WeightConfig::PerSide => Self::PerSide,
            domain::WeightConfig::PerSidePlusBar => Self::PerSidePlusBar,
            domain::WeightConfig::Bodyweight => Self::Bodyweight,
            domain::WeightConfig::BodyweightPlusExtra => Self::BodyweightPlusExtra,
        }
    }
}

impl From<WeightConfig> for domain::WeightConfig {
    fn from(value: WeightConfig) -> Self {
        match value {
            WeightConfig::TotalWeight => Self::TotalWeight,
            WeightConfig::PerSide => Self::PerSide,
            WeightConfig::PerSidePlusBar => Self::PerSidePlusBar,
            WeightConfig::Bodyweight => Self::Bodyweight,
            WeightConfig::BodyweightPlusExtra => Self::BodyweightPlusExtra,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RepsConfig {
    Repetitions,
    Time,
    CardioDuration,
}

impl From<domain::RepsConfig> for RepsConfig {
    fn from(value: domain::RepsConfig) -> Self {
        match value {
            domain::RepsConfig::Repetitions => Self::Repetitions,
            domain::RepsConfig::Time => Self::Time,
            domain::RepsConfig::CardioDuration => Self::CardioDuration,
        }
    }
}

impl From<RepsConfig> for domain::RepsConfig {
    fn from(value: RepsConfig) -> Self {
        match value {
            RepsConfig::Repetitions => Self::Repetitions,
            RepsConfig::Time => Self::Time,
            RepsConfig::CardioDuration => Self::CardioDuration,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightUnit {
    #[serde(rename = "lb")]
    Pounds,
    #[serde(rename = "kg")]
    Kilograms,
}

impl From<domain::WeightUnit> for WeightUnit {
    fn from(value: domain::WeightUnit) -> Self {
        match value {
            domain::WeightUnit::Pounds => Self::Pounds,
            domain::WeightUnit::Kilograms => Self::Kilograms,
        }
    }
}

impl From<WeightUnit> for domain::WeightUnit {
    fn from(value: WeightUnit) -> Self {
        match value {
            WeightUnit::Pounds => Self::Pounds,
            WeightUnit::Kilograms => Self::Kilograms,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PauseState {
    pub accumulated_ms: u64,
    pub started_at: Option<i64>,
}

impl From<&domain::PauseState> for PauseState {
    fn from(value: &domain::PauseState) -> Self {
        Self {
            accumulated_ms: u64::try_from(value.accumulated.num_milliseconds()).unwrap_or(0),
            started_at: value.started_at.map(|started_at| started_at.timestamp_millis()),
        }
    }
}

impl TryFrom<PauseState> for domain::PauseState {
    type Error = CacheDataError;

    fn try_from(value: PauseState) -> Result<Self, Self::Error> {
        Ok(Self {
            accumulated: i64::try_from(value.accumulated_ms)
                .ok()
                .and_then(Duration::try_milliseconds)
                .ok_or(CacheDataError::Duration(value.accumulated_ms))?,
            started_at: value.started_at.map(timestamp).transpose()?,
        })
    }
}

fn timestamp(millis: i64) -> Result<DateTime<Utc>, CacheDataError> {
    DateTime::from_timestamp_millis(millis).ok_or(CacheDataError::Timestamp(millis))
}

/// Missing fields take their default values.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub default_weight_unit: WeightUnit,
    pub tick_interval_ms: u32,
    pub discard_foreign_sessions: bool,
}

impl Default for Settings {
    fn default() -> Self {
        domain::Settings::default().into()
    }
}

impl From<domain::Settings> for Settings {
    fn from(value: domain::Settings) -> Self {
        Self {
            default_weight_unit: value.default_weight_unit.into(),
            tick_interval_ms: value.tick_interval_ms,
            discard_foreign_sessions: value.discard_foreign_sessions,
        }
    }
}

impl From<Settings> for domain::Settings {
    fn from(value: Settings) -> Self {
        Self {
            default_weight_unit: value.default_weight_unit.into(),
            tick_interval_ms: value.tick_interval_ms,
            discard_foreign_sessions: value.discard_foreign_sessions,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use liftlog_domain::{ManualClock, Phase, PersistenceCache, Session, SessionController};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use crate::{
        file::FileStore,
        memory::MemoryStore,
        tests::data::{BENCH_PRESS, PLANK, PULL_UP, SETTINGS, STARTED_AT, TREE, USER, USER_2},
    };

    use super::*;

    fn cache() -> Cache<MemoryStore> {
        Cache::new(MemoryStore::new())
    }

    fn stored(cache: &Cache<MemoryStore>, key: CacheKey) -> Option<serde_json::Value> {
        cache
            .store()
            .get(key.as_ref())
            .unwrap()
            .map(|value| serde_json::from_str(&value).unwrap())
    }

    #[test]
    fn test_current_workout_round_trip() {
        let cache = cache();
        assert_eq!(cache.read_current_workout(), Ok(None));
        cache.write_current_workout(&TREE).unwrap();
        assert_eq!(cache.read_current_workout(), Ok(Some(TREE.clone())));
    }

    #[test]
    fn test_current_workout_schema() {
        let cache = cache();
        cache.write_current_workout(&TREE).unwrap();
        assert_eq!(
            stored(&cache, CacheKey::CurrentWorkout),
            Some(json!({
                "exercises": [
                    {
                        "id": BENCH_PRESS.id.to_string(),
                        "name": "Bench Press",
                        "weightConfig": "perSidePlusBar",
                        "repsConfig": "repetitions",
                        "weightUnit": "lb",
                        "sets": [
                            {
                                "key": "set1",
                                "weight": "45",
                                "reps": "10",
                                "dropSets": [{ "key": "set1_dropset1", "weight": "25", "reps": "8" }]
                            },
                            { "key": "set2", "weight": null, "reps": null }
                        ],
                        "supersetExercise": PULL_UP.id.to_string(),
                        "completed": true
                    },
                    {
                        "id": PULL_UP.id.to_string(),
                        "name": "Pull Up",
                        "weightConfig": "bodyweight",
                        "repsConfig": "repetitions",
                        "weightUnit": "kg",
                        "sets": [{ "key": "set1", "weight": "0", "reps": "12" }],
                        "completed": false
                    },
                    {
                        "id": PLANK.id.to_string(),
                        "name": "Plank",
                        "weightConfig": "totalWeight",
                        "repsConfig": "time",
                        "weightUnit": "lb",
                        "sets": [{ "key": "set1", "weight": null, "reps": "90" }],
                        "completed": false
                    }
                ]
            }))
        );
    }

    #[rstest]
    #[case::empty_object("{}")]
    #[case::empty_list(r#"{"exercises":[]}"#)]
    fn test_current_workout_without_exercises(#[case] value: &str) {
        let cache = cache();
        cache
            .store()
            .set(CacheKey::CurrentWorkout.as_ref(), value)
            .unwrap();
        assert_eq!(
            cache.read_current_workout(),
            Ok(Some(domain::ExerciseTree::new()))
        );
    }

    fn exercise_json(name: &str, sets: &serde_json::Value) -> serde_json::Value {
        json!({
            "id": Uuid::from_u128(1),
            "name": name,
            "weightConfig": "totalWeight",
            "repsConfig": "repetitions",
            "weightUnit": "lb",
            "sets": sets
        })
    }

    #[rstest]
    #[case::not_json("{".to_string())]
    #[case::wrong_type(r#"{"exercises":5}"#.to_string())]
    #[case::empty_name(
        json!({ "exercises": [exercise_json(" ", &json!([]))] }).to_string()
    )]
    #[case::invalid_weight(
        json!({ "exercises": [exercise_json("Squat", &json!([{ "key": "set1", "weight": "heavy" }]))] })
            .to_string()
    )]
    #[case::misplaced_set(
        json!({ "exercises": [exercise_json("Squat", &json!([{ "key": "set2" }]))] }).to_string()
    )]
    #[case::dangling_superset(
        json!({ "exercises": [{
            "id": Uuid::from_u128(1),
            "name": "Squat",
            "weightConfig": "totalWeight",
            "repsConfig": "repetitions",
            "weightUnit": "lb",
            "supersetExercise": Uuid::from_u128(2)
        }] })
        .to_string()
    )]
    fn test_current_workout_corrupt(#[case] value: String) {
        let cache = cache();
        cache
            .store()
            .set(CacheKey::CurrentWorkout.as_ref(), &value)
            .unwrap();
        assert!(matches!(
            cache.read_current_workout(),
            Err(CacheError::Corrupt { key, .. }) if key == "currentWorkout"
        ));
    }

    #[test]
    fn test_misplaced_set_message() {
        assert_eq!(
            expect_key("set2_dropset1", domain::SetKey::drop_set(1, 1))
                .unwrap_err()
                .to_string(),
            "expected set1_dropset1, found set2_dropset1"
        );
    }

    #[test]
    fn test_start_time() {
        let cache = cache();
        cache.write_start_time(Some(*STARTED_AT)).unwrap();
        assert_eq!(
            stored(&cache, CacheKey::StartTime),
            Some(json!(1_700_000_000_000_i64))
        );
        assert_eq!(cache.read_start_time(), Ok(Some(*STARTED_AT)));

        cache.write_start_time(None).unwrap();
        assert_eq!(stored(&cache, CacheKey::StartTime), None);
        assert_eq!(cache.read_start_time(), Ok(None));
    }

    #[rstest]
    #[case::not_a_number("\"yesterday\"")]
    #[case::out_of_range("9223372036854775807")]
    fn test_start_time_corrupt(#[case] value: &str) {
        let cache = cache();
        cache.store().set(CacheKey::StartTime.as_ref(), value).unwrap();
        assert!(matches!(
            cache.read_start_time(),
            Err(CacheError::Corrupt { key, .. }) if key == "startTime"
        ));
    }

    #[rstest]
    #[case(Duration::seconds(95), Duration::seconds(95), json!(95))]
    #[case(Duration::milliseconds(95_900), Duration::seconds(95), json!(95))]
    #[case(Duration::seconds(-3), Duration::zero(), json!(0))]
    fn test_elapsed_time(
        #[case] elapsed: Duration,
        #[case] expected: Duration,
        #[case] expected_json: serde_json::Value,
    ) {
        let cache = cache();
        cache.write_elapsed_time(elapsed).unwrap();
        assert_eq!(stored(&cache, CacheKey::ElapsedTime), Some(expected_json));
        assert_eq!(cache.read_elapsed_time(), Ok(Some(expected)));
    }

    #[rstest]
    #[case::running(domain::PauseState {
        accumulated: Duration::seconds(30),
        started_at: None,
    })]
    #[case::paused(domain::PauseState {
        accumulated: Duration::milliseconds(1500),
        started_at: Some(DateTime::from_timestamp_millis(1_700_000_060_000).unwrap()),
    })]
    fn test_pause_state(#[case] pause_state: domain::PauseState) {
        let cache = cache();
        assert_eq!(cache.read_pause_state(), Ok(None));
        cache.write_pause_state(&pause_state).unwrap();
        assert_eq!(cache.read_pause_state(), Ok(Some(pause_state)));
    }

    #[test]
    fn test_pause_state_schema() {
        let cache = cache();
        cache
            .write_pause_state(&domain::PauseState {
                accumulated: Duration::seconds(30),
                started_at: Some(*STARTED_AT),
            })
            .unwrap();
        assert_eq!(
            stored(&cache, CacheKey::PauseState),
            Some(json!({ "accumulatedMs": 30_000, "startedAt": 1_700_000_000_000_i64 }))
        );
    }

    #[test]
    fn test_session_owner() {
        let cache = cache();
        assert_eq!(cache.read_session_owner(), Ok(None));
        cache.write_session_owner(*USER_2).unwrap();
        assert_eq!(
            stored(&cache, CacheKey::SessionOwner),
            Some(json!("00000000-0000-0000-0000-000000000002"))
        );
        assert_eq!(cache.read_session_owner(), Ok(Some(*USER_2)));
    }

    #[test]
    fn test_clear_session_keeps_settings() {
        let cache = cache();
        cache.write_current_workout(&TREE).unwrap();
        cache.write_start_time(Some(*STARTED_AT)).unwrap();
        cache.write_elapsed_time(Duration::seconds(1)).unwrap();
        cache
            .write_pause_state(&domain::PauseState {
                accumulated: Duration::zero(),
                started_at: None,
            })
            .unwrap();
        cache.write_session_owner(*USER).unwrap();
        cache.write_settings(&SETTINGS).unwrap();

        cache.clear_session().unwrap();

        assert_eq!(cache.store().keys(), vec!["settings".to_string()]);
        assert_eq!(cache.read_current_workout(), Ok(None));
        assert_eq!(cache.read_settings(), Ok(Some(SETTINGS)));
    }

    #[test]
    fn test_settings() {
        let cache = cache();
        assert_eq!(domain::Settings::load(&cache), domain::Settings::default());
        cache.write_settings(&SETTINGS).unwrap();
        assert_eq!(
            stored(&cache, CacheKey::Settings),
            Some(json!({
                "defaultWeightUnit": "kg",
                "tickIntervalMs": 500,
                "discardForeignSessions": false
            }))
        );
        assert_eq!(domain::Settings::load(&cache), SETTINGS);
    }

    #[test]
    fn test_settings_partial() {
        let cache = cache();
        cache
            .store()
            .set(CacheKey::Settings.as_ref(), r#"{"defaultWeightUnit":"kg"}"#)
            .unwrap();
        assert_eq!(
            cache.read_settings(),
            Ok(Some(domain::Settings {
                default_weight_unit: domain::WeightUnit::Kilograms,
                ..domain::Settings::default()
            }))
        );
    }

    #[test]
    fn test_mirror_and_load() {
        let mut cache = PersistenceCache::new(cache());
        let mut session = Session::new(*USER, TREE.clone());
        session.start(*STARTED_AT);
        session.pause(*STARTED_AT + Duration::seconds(40));

        cache.mirror(&session, Duration::seconds(40));
        let recovered = cache.load(*USER, true).unwrap();

        assert_eq!(recovered.session, session);
        assert_eq!(recovered.last_elapsed, Some(Duration::seconds(40)));
        assert_eq!(cache.take_failures(), vec![]);
    }

    #[test]
    fn test_corrupt_cache_is_no_session() {
        let mut cache = PersistenceCache::new(cache());
        cache
            .repository()
            .store()
            .set(CacheKey::CurrentWorkout.as_ref(), "[")
            .unwrap();
        assert_eq!(cache.load(*USER, true), None);
        assert_eq!(cache.take_failures().len(), 1);
    }

    #[test]
    fn test_session_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(*STARTED_AT);
        let store = Arc::new(FileStore::open(dir.path()).unwrap());

        let mut controller = SessionController::new(
            Cache::new(Arc::clone(&store)),
            &clock,
            domain::Settings::default(),
            *USER,
        );
        controller.start();
        let squat = controller
            .add_named_exercise("Squat", None)
            .unwrap()
            .unwrap();
        controller
            .update_field(
                &squat,
                Some(&domain::SetKey::set(1)),
                domain::Field::Weight("225".to_string()),
            )
            .unwrap();
        clock.advance(Duration::minutes(5));
        controller.pause();
        let tree = controller.tree().cloned();
        drop(controller);

        clock.advance(Duration::minutes(10));
        let mut restarted = SessionController::new(
            Cache::new(Arc::clone(&store)),
            &clock,
            domain::Settings::default(),
            *USER,
        );
        assert_eq!(restarted.restore(), Some(Duration::minutes(5)));
        assert_eq!(restarted.phase(), Phase::Paused);
        assert_eq!(restarted.tree().cloned(), tree);
        assert_eq!(restarted.elapsed(), Duration::minutes(5));
    }
}
