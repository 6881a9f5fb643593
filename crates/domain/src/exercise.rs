use std::{fmt, slice::Iter, str::FromStr};

use derive_more::{Deref, Display, Into};
use uuid::Uuid;

use crate::Name;

const EXERCISE_NAMESPACE: Uuid = Uuid::from_u128(0x7c1d_4a5e_0b2f_4f61_9a3e_55c0_d1e2_f3a4);

#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: ExerciseID,
    pub name: Name,
    pub weight_config: WeightConfig,
    pub reps_config: RepsConfig,
    pub weight_unit: WeightUnit,
    pub sets: Vec<Set>,
    pub completed: bool,
}

impl Exercise {
    /// A fresh exercise with a single empty set.
    #[must_use]
    pub fn new(name: Name, weight_unit: WeightUnit) -> Self {
        Self {
            id: ExerciseID::from_name(&name),
            name,
            weight_config: WeightConfig::TotalWeight,
            reps_config: RepsConfig::Repetitions,
            weight_unit,
            sets: vec![Set::new(SetKey::set(1))],
            completed: false,
        }
    }

    #[must_use]
    pub fn set(&self, key: &SetKey) -> Option<&Set> {
        self.sets.get(key.set_index())
    }

    /// Every set followed by its drop sets, in performance order.
    pub fn entries(&self) -> impl Iterator<Item = SetEntry<'_>> {
        self.sets.iter().flat_map(|set| {
            std::iter::once(SetEntry {
                key: &set.key,
                weight: set.weight,
                reps: set.reps,
            })
            .chain(set.drop_sets.iter().map(|drop_set| SetEntry {
                key: &drop_set.key,
                weight: drop_set.weight,
                reps: drop_set.reps,
            }))
        })
    }

    #[must_use]
    pub fn entry(&self, key: &SetKey) -> Option<SetEntry<'_>> {
        self.entries().find(|e| e.key == key)
    }

    pub(crate) fn entry_mut(
        &mut self,
        key: &SetKey,
    ) -> Option<(&mut Option<Weight>, &mut Option<Reps>)> {
        let set = self.sets.get_mut(key.set_index())?;
        match key.drop_set_index() {
            None => Some((&mut set.weight, &mut set.reps)),
            Some(idx) => set
                .drop_sets
                .get_mut(idx)
                .map(|drop_set| (&mut drop_set.weight, &mut drop_set.reps)),
        }
    }

    /// A set counts once reps are recorded and the load is known (or not needed).
    #[must_use]
    pub fn is_loggable(&self, weight: Option<Weight>, reps: Option<Reps>) -> bool {
        reps.is_some()
            && (weight.is_some()
                || self.weight_config == WeightConfig::Bodyweight
                || self.reps_config == RepsConfig::CardioDuration)
    }

    pub fn loggable_entries(&self) -> impl Iterator<Item = SetEntry<'_>> {
        self.entries()
            .filter(|entry| self.is_loggable(entry.weight, entry.reps))
    }

    #[must_use]
    pub fn has_loggable_sets(&self) -> bool {
        self.loggable_entries().next().is_some()
    }

    /// Total load as shown to the user, derived from the stored per-side value.
    #[must_use]
    pub fn displayed_load(&self, key: &SetKey) -> Option<f64> {
        let entry = self.entry(key)?;
        match self.weight_config {
            WeightConfig::Bodyweight => None,
            config => entry
                .weight
                .map(|weight| config.total_load(weight, self.weight_unit)),
        }
    }

    pub(crate) fn renumber(&mut self) {
        for (set_idx, set) in self.sets.iter_mut().enumerate() {
            let set_num = ordinal(set_idx);
            set.key = SetKey::set(set_num);
            for (drop_idx, drop_set) in set.drop_sets.iter_mut().enumerate() {
                drop_set.key = SetKey::drop_set(set_num, ordinal(drop_idx));
            }
        }
    }
}

fn ordinal(idx: usize) -> u32 {
    u32::try_from(idx + 1).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetEntry<'a> {
    pub key: &'a SetKey,
    pub weight: Option<Weight>,
    pub reps: Option<Reps>,
}

#[derive(Deref, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExerciseID(Uuid);

impl ExerciseID {
    #[must_use]
    pub fn from_name(name: &Name) -> Self {
        Self(Uuid::new_v5(
            &EXERCISE_NAMESPACE,
            name.normalized().as_bytes(),
        ))
    }

    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for ExerciseID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for ExerciseID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    pub key: SetKey,
    pub weight: Option<Weight>,
    pub reps: Option<Reps>,
    pub drop_sets: Vec<DropSet>,
}

impl Set {
    #[must_use]
    pub fn new(key: SetKey) -> Self {
        Self {
            key,
            weight: None,
            reps: None,
            drop_sets: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropSet {
    pub key: SetKey,
    pub weight: Option<Weight>,
    pub reps: Option<Reps>,
}

impl DropSet {
    #[must_use]
    pub fn new(key: SetKey) -> Self {
        Self {
            key,
            weight: None,
            reps: None,
        }
    }
}

/// Ordinal label of a set (`set2`) or of one of its drop sets (`set2_dropset1`).
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SetKey {
    set: u32,
    drop_set: Option<u32>,
}

impl SetKey {
    #[must_use]
    pub fn set(set: u32) -> Self {
        Self {
            set,
            drop_set: None,
        }
    }

    #[must_use]
    pub fn drop_set(set: u32, drop_set: u32) -> Self {
        Self {
            set,
            drop_set: Some(drop_set),
        }
    }

    #[must_use]
    pub fn number(&self) -> u32 {
        self.set
    }

    #[must_use]
    pub fn parent(&self) -> SetKey {
        SetKey::set(self.set)
    }

    #[must_use]
    pub fn is_drop_set(&self) -> bool {
        self.drop_set.is_some()
    }

    fn set_index(&self) -> usize {
        (self.set as usize).wrapping_sub(1)
    }

    fn drop_set_index(&self) -> Option<usize> {
        self.drop_set.map(|d| (d as usize).wrapping_sub(1))
    }
}

impl fmt::Display for SetKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.drop_set {
            None => write!(f, "set{}", self.set),
            Some(drop_set) => write!(f, "set{}_dropset{drop_set}", self.set),
        }
    }
}

impl FromStr for SetKey {
    type Err = SetKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SetKeyError::Invalid(s.to_string());
        let rest = s.strip_prefix("set").ok_or_else(invalid)?;
        let (set, drop_set) = match rest.split_once("_dropset") {
            Some((set, drop_set)) => (set, Some(drop_set)),
            None => (rest, None),
        };
        let set = set.parse::<u32>().map_err(|_| invalid())?;
        let drop_set = drop_set
            .map(|d| d.parse::<u32>().map_err(|_| invalid()))
            .transpose()?;
        if set == 0 || drop_set == Some(0) {
            return Err(invalid());
        }
        Ok(Self { set, drop_set })
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SetKeyError {
    #[error("Invalid set key: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Display, Clone, Copy, Into, PartialEq, PartialOrd)]
pub struct Weight(f64);

impl Weight {
    /// Stored for every set of a bodyweight exercise.
    pub const ZERO: Weight = Weight(0.0);

    pub fn new(value: f64) -> Result<Self, WeightError> {
        if !(0.0..10000.0).contains(&value) {
            return Err(WeightError::OutOfRange);
        }

        Ok(Self(value))
    }
}

impl TryFrom<&str> for Weight {
    type Error = WeightError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.replace(',', ".").trim().parse::<f64>() {
            Ok(parsed_value) => Weight::new(parsed_value),
            Err(_) => Err(WeightError::ParseError),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum WeightError {
    #[error("Weight must be in the range 0 to 9999.9")]
    OutOfRange,
    #[error("Weight must be a decimal number")]
    ParseError,
}

/// A repetition count, or seconds for timed configurations.
#[derive(Debug, Default, Display, Clone, Copy, Into, PartialEq, Eq, PartialOrd, Ord)]
pub struct Reps(u32);

impl Reps {
    pub fn new(value: u32) -> Result<Self, RepsError> {
        if value >= 100_000 {
            return Err(RepsError::OutOfRange);
        }

        Ok(Self(value))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RepsError {
    #[error("Value is too large")]
    OutOfRange,
    #[error("Reps must be an integer")]
    ParseError,
    #[error("Time must be given as {0}")]
    InvalidTime(&'static str),
}

#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq)]
pub enum WeightUnit {
    #[default]
    Pounds,
    Kilograms,
}

impl WeightUnit {
    #[must_use]
    pub fn bar_weight(self) -> f64 {
        match self {
            WeightUnit::Pounds => 45.0,
            WeightUnit::Kilograms => 20.0,
        }
    }

    #[must_use]
    pub fn abbreviation(self) -> &'static str {
        match self {
            WeightUnit::Pounds => "lb",
            WeightUnit::Kilograms => "kg",
        }
    }
}

impl Property for WeightUnit {
    fn iter() -> Iter<'static, WeightUnit> {
        static UNITS: [WeightUnit; 2] = [WeightUnit::Pounds, WeightUnit::Kilograms];
        UNITS.iter()
    }

    fn name(self) -> &'static str {
        match self {
            WeightUnit::Pounds => "Pounds",
            WeightUnit::Kilograms => "Kilograms",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq)]
pub enum WeightConfig {
    #[default]
    TotalWeight,
    PerSide,
    PerSidePlusBar,
    Bodyweight,
    BodyweightPlusExtra,
}

impl WeightConfig {
    #[must_use]
    pub fn accepts_weight(self) -> bool {
        self != WeightConfig::Bodyweight
    }

    /// Converts an entered value into the load actually moved, in the same unit.
    #[must_use]
    pub fn total_load(self, entered: Weight, unit: WeightUnit) -> f64 {
        match self {
            WeightConfig::TotalWeight | WeightConfig::BodyweightPlusExtra => entered.0,
            WeightConfig::PerSide => entered.0 * 2.0,
            WeightConfig::PerSidePlusBar => entered.0 * 2.0 + unit.bar_weight(),
            WeightConfig::Bodyweight => 0.0,
        }
    }

    #[must_use]
    pub fn display_load(self, weight: Option<Weight>, unit: WeightUnit) -> Option<String> {
        match self {
            WeightConfig::Bodyweight => Some(String::from("BW")),
            WeightConfig::BodyweightPlusExtra => weight.map(|w| format!("BW + {}", w.0)),
            config => weight.map(|w| config.total_load(w, unit).to_string()),
        }
    }
}

impl Property for WeightConfig {
    fn iter() -> Iter<'static, WeightConfig> {
        static CONFIGS: [WeightConfig; 5] = [
            WeightConfig::TotalWeight,
            WeightConfig::PerSide,
            WeightConfig::PerSidePlusBar,
            WeightConfig::Bodyweight,
            WeightConfig::BodyweightPlusExtra,
        ];
        CONFIGS.iter()
    }

    fn name(self) -> &'static str {
        match self {
            WeightConfig::TotalWeight => "Total Weight",
            WeightConfig::PerSide => "Per Side",
            WeightConfig::PerSidePlusBar => "Per Side + Bar",
            WeightConfig::Bodyweight => "Bodyweight",
            WeightConfig::BodyweightPlusExtra => "Bodyweight + Extra",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq)]
pub enum RepsConfig {
    #[default]
    Repetitions,
    Time,
    CardioDuration,
}

impl RepsConfig {
    #[must_use]
    pub fn is_timed(self) -> bool {
        self != RepsConfig::Repetitions
    }

    /// Parses user input: a count, `m:ss` for time or `h:mm:ss` for cardio.
    pub fn parse(self, input: &str) -> Result<Reps, RepsError> {
        let input = input.trim();
        match self {
            RepsConfig::Repetitions => {
                Reps::new(input.parse::<u32>().map_err(|_| RepsError::ParseError)?)
            }
            RepsConfig::Time => Reps::new(parse_clock(input, 2, "m:ss")?),
            RepsConfig::CardioDuration => Reps::new(parse_clock(input, 3, "h:mm:ss")?),
        }
    }

    #[must_use]
    pub fn format(self, reps: Reps) -> String {
        let value = reps.0;
        match self {
            RepsConfig::Repetitions => value.to_string(),
            RepsConfig::Time => format!("{}:{:02}", value / 60, value % 60),
            RepsConfig::CardioDuration => format!(
                "{}:{:02}:{:02}",
                value / 3600,
                value % 3600 / 60,
                value % 60
            ),
        }
    }

    /// Count for repetitions, seconds for timed configurations.
    #[must_use]
    pub fn normalized(self, reps: Reps) -> f64 {
        f64::from(reps.0)
    }

    /// Wire form of a reps value: count, or milliseconds for timed configurations.
    #[must_use]
    pub fn to_record_value(self, reps: Reps) -> u64 {
        if self.is_timed() {
            u64::from(reps.0) * 1000
        } else {
            u64::from(reps.0)
        }
    }
}

fn parse_clock(input: &str, max_parts: usize, format: &'static str) -> Result<u32, RepsError> {
    let parts = input.split(':').collect::<Vec<_>>();
    if parts.is_empty() || parts.len() > max_parts {
        return Err(RepsError::InvalidTime(format));
    }
    let mut seconds: u32 = 0;
    for (idx, part) in parts.iter().enumerate() {
        let value = part
            .parse::<u32>()
            .map_err(|_| RepsError::InvalidTime(format))?;
        if idx > 0 && value >= 60 {
            return Err(RepsError::InvalidTime(format));
        }
        seconds = seconds
            .checked_mul(60)
            .and_then(|s| s.checked_add(value))
            .ok_or(RepsError::OutOfRange)?;
    }
    Ok(seconds)
}

impl Property for RepsConfig {
    fn iter() -> Iter<'static, RepsConfig> {
        static CONFIGS: [RepsConfig; 3] = [
            RepsConfig::Repetitions,
            RepsConfig::Time,
            RepsConfig::CardioDuration,
        ];
        CONFIGS.iter()
    }

    fn name(self) -> &'static str {
        match self {
            RepsConfig::Repetitions => "Reps",
            RepsConfig::Time => "Time",
            RepsConfig::CardioDuration => "Duration",
        }
    }
}

pub trait Property: Clone + Copy + Sized {
    fn iter() -> Iter<'static, Self>;
    fn name(self) -> &'static str;
}
