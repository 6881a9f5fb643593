use std::collections::{BTreeMap, BTreeSet};

use crate::{
    DropSet, Exercise, ExerciseID, Name, NameError, RepsConfig, RepsError, Set, SetKey, Weight,
    WeightConfig, WeightError, WeightUnit,
};

/// The exercises of an in-progress workout.
///
/// Exercises live in an arena keyed by id. Superset chains are kept in a separate adjacency map
/// from each exercise to the exercise performed directly after it, so every chain is a
/// singly-linked list: at most one successor and at most one predecessor per exercise.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExerciseTree {
    order: Vec<ExerciseID>,
    exercises: BTreeMap<ExerciseID, Exercise>,
    successors: BTreeMap<ExerciseID, ExerciseID>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Name(String),
    Weight(String),
    Reps(String),
    WeightConfig(WeightConfig),
    RepsConfig(RepsConfig),
    WeightUnit(WeightUnit),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TreeError {
    #[error("unknown exercise {0:?}")]
    UnknownExercise(ExerciseID),
    #[error("unknown set {0}")]
    UnknownSet(SetKey),
    #[error("exercise {0} already exists")]
    DuplicateExercise(Name),
    #[error("superset refers to missing exercise {0:?}")]
    DanglingSuperset(ExerciseID),
    #[error("exercise {0:?} follows more than one exercise")]
    SharedSuccessor(ExerciseID),
    #[error("exercise {0:?} is followed by more than one exercise")]
    SharedPredecessor(ExerciseID),
    #[error("superset chain through {0:?} contains a cycle")]
    Cycle(ExerciseID),
    #[error("weight cannot be entered for bodyweight exercises")]
    WeightDisabled,
    #[error("set key required")]
    MissingSetKey,
    #[error("drop sets cannot contain drop sets")]
    NestedDropSet,
    #[error(transparent)]
    Name(#[from] NameError),
    #[error(transparent)]
    Weight(#[from] WeightError),
    #[error(transparent)]
    Reps(#[from] RepsError),
}

impl TreeError {
    /// Errors caused by events referring to exercises or sets that no longer exist.
    #[must_use]
    pub fn is_stale_reference(&self) -> bool {
        matches!(
            self,
            TreeError::UnknownExercise(_) | TreeError::UnknownSet(_)
        )
    }
}

impl ExerciseTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from externally supplied exercises and superset links.
    pub fn from_parts(
        exercises: Vec<Exercise>,
        supersets: impl IntoIterator<Item = (ExerciseID, ExerciseID)>,
    ) -> Result<Self, TreeError> {
        let mut tree = Self::new();
        for exercise in exercises {
            if tree.contains_name(&exercise.name) || tree.exercises.contains_key(&exercise.id) {
                return Err(TreeError::DuplicateExercise(exercise.name));
            }
            tree.order.push(exercise.id);
            tree.exercises.insert(exercise.id, exercise);
        }
        for (predecessor, successor) in supersets {
            if tree.successors.insert(predecessor, successor).is_some() {
                return Err(TreeError::SharedPredecessor(predecessor));
            }
        }
        tree.check_integrity()?;
        Ok(tree)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Exercises in display order.
    pub fn exercises(&self) -> impl Iterator<Item = &Exercise> {
        self.order.iter().filter_map(|id| self.exercises.get(id))
    }

    #[must_use]
    pub fn ids(&self) -> &[ExerciseID] {
        &self.order
    }

    #[must_use]
    pub fn get(&self, id: &ExerciseID) -> Option<&Exercise> {
        self.exercises.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ExerciseID) -> bool {
        self.exercises.contains_key(id)
    }

    /// The exercise chained directly after `id`.
    #[must_use]
    pub fn superset_of(&self, id: &ExerciseID) -> Option<ExerciseID> {
        self.successors.get(id).copied()
    }

    #[must_use]
    pub fn predecessor_of(&self, id: &ExerciseID) -> Option<ExerciseID> {
        self.successors
            .iter()
            .find(|(_, successor)| *successor == id)
            .map(|(predecessor, _)| *predecessor)
    }

    /// Whether `id` is the target of some superset link.
    #[must_use]
    pub fn is_superset(&self, id: &ExerciseID) -> bool {
        self.predecessor_of(id).is_some()
    }

    /// `root` followed by all of its transitive successors.
    #[must_use]
    pub fn chain(&self, root: &ExerciseID) -> Vec<ExerciseID> {
        let mut chain = vec![*root];
        let mut current = *root;
        while let Some(next) = self.successors.get(&current) {
            if chain.contains(next) {
                break;
            }
            chain.push(*next);
            current = *next;
        }
        chain
    }

    pub fn supersets(&self) -> impl Iterator<Item = (ExerciseID, ExerciseID)> {
        self.successors.iter().map(|(p, s)| (*p, *s))
    }

    #[must_use]
    pub fn has_loggable_sets(&self) -> bool {
        self.exercises().any(Exercise::has_loggable_sets)
    }

    #[must_use]
    pub fn incomplete_exercises(&self) -> Vec<&Exercise> {
        self.exercises().filter(|e| !e.completed).collect()
    }

    /// Adds an exercise with a placeholder name. With `after`, the new exercise is chained
    /// directly behind that exercise.
    pub fn add_exercise(
        &mut self,
        after: Option<ExerciseID>,
        weight_unit: WeightUnit,
    ) -> Result<ExerciseID, TreeError> {
        let name = self.placeholder_name()?;
        self.add_named_exercise(name, after, weight_unit)
    }

    pub fn add_named_exercise(
        &mut self,
        name: Name,
        after: Option<ExerciseID>,
        weight_unit: WeightUnit,
    ) -> Result<ExerciseID, TreeError> {
        self.insert_exercise(Exercise::new(name, weight_unit), after)
    }

    pub fn insert_exercise(
        &mut self,
        exercise: Exercise,
        after: Option<ExerciseID>,
    ) -> Result<ExerciseID, TreeError> {
        let id = exercise.id;
        if self.contains_name(&exercise.name) || self.exercises.contains_key(&id) {
            return Err(TreeError::DuplicateExercise(exercise.name));
        }
        match after {
            None => self.order.push(id),
            Some(after) => {
                let position = self
                    .order
                    .iter()
                    .position(|i| *i == after)
                    .ok_or(TreeError::UnknownExercise(after))?;
                if let Some(next) = self.successors.insert(after, id) {
                    self.successors.insert(id, next);
                }
                self.order.insert(position + 1, id);
            }
        }
        self.exercises.insert(id, exercise);
        Ok(id)
    }

    /// Removes an exercise. Deleting a chain member splices its neighbours together, deleting
    /// the root of a chain removes the whole chain. Returns the removed ids.
    pub fn delete_exercise(&mut self, id: &ExerciseID) -> Result<Vec<ExerciseID>, TreeError> {
        if !self.contains(id) {
            return Err(TreeError::UnknownExercise(*id));
        }
        let removed = match self.predecessor_of(id) {
            Some(predecessor) => {
                match self.successors.remove(id) {
                    Some(next) => {
                        self.successors.insert(predecessor, next);
                    }
                    None => {
                        self.successors.remove(&predecessor);
                    }
                }
                vec![*id]
            }
            None => self.chain(id),
        };
        for r in &removed {
            self.exercises.remove(r);
            self.successors.remove(r);
        }
        self.order.retain(|i| !removed.contains(i));
        Ok(removed)
    }

    pub fn add_set(&mut self, id: &ExerciseID) -> Result<SetKey, TreeError> {
        let exercise = self.exercise_mut(id)?;
        let key = SetKey::set(ordinal(exercise.sets.len()));
        let mut set = Set::new(key);
        set.weight = initial_weight(exercise.weight_config);
        exercise.sets.push(set);
        Ok(key)
    }

    pub fn delete_set(&mut self, id: &ExerciseID, set_key: &SetKey) -> Result<(), TreeError> {
        let exercise = self.exercise_mut(id)?;
        let idx = set_position(exercise, set_key)?;
        exercise.sets.remove(idx);
        exercise.renumber();
        Ok(())
    }

    pub fn add_drop_set(&mut self, id: &ExerciseID, set_key: &SetKey) -> Result<SetKey, TreeError> {
        let exercise = self.exercise_mut(id)?;
        let idx = set_position(exercise, set_key)?;
        let weight = initial_weight(exercise.weight_config);
        let set = &mut exercise.sets[idx];
        let key = SetKey::drop_set(set.key.number(), ordinal(set.drop_sets.len()));
        let mut drop_set = DropSet::new(key);
        drop_set.weight = weight;
        set.drop_sets.push(drop_set);
        Ok(key)
    }

    /// Removes the drop set at `index` (zero-based) and renumbers the remaining ones.
    pub fn delete_drop_set(
        &mut self,
        id: &ExerciseID,
        set_key: &SetKey,
        index: usize,
    ) -> Result<(), TreeError> {
        let exercise = self.exercise_mut(id)?;
        let idx = set_position(exercise, set_key)?;
        let set = &mut exercise.sets[idx];
        if index >= set.drop_sets.len() {
            return Err(TreeError::UnknownSet(SetKey::drop_set(
                set.key.number(),
                ordinal(index),
            )));
        }
        set.drop_sets.remove(index);
        exercise.renumber();
        Ok(())
    }

    /// Applies a user edit. Returns the id of the edited exercise, which changes on rename.
    pub fn update_field(
        &mut self,
        id: &ExerciseID,
        set_key: Option<&SetKey>,
        field: Field,
    ) -> Result<ExerciseID, TreeError> {
        match field {
            Field::Name(name) => return self.rename_exercise(id, Name::new(&name)?),
            Field::Weight(value) => {
                let exercise = self.exercise_mut(id)?;
                if !exercise.weight_config.accepts_weight() {
                    return Err(TreeError::WeightDisabled);
                }
                let key = set_key.ok_or(TreeError::MissingSetKey)?;
                let weight = if value.trim().is_empty() {
                    None
                } else {
                    Some(Weight::try_from(value.as_str())?)
                };
                let (stored, _) = exercise
                    .entry_mut(key)
                    .ok_or(TreeError::UnknownSet(*key))?;
                *stored = weight;
            }
            Field::Reps(value) => {
                let exercise = self.exercise_mut(id)?;
                let key = set_key.ok_or(TreeError::MissingSetKey)?;
                let reps = if value.trim().is_empty() {
                    None
                } else {
                    Some(exercise.reps_config.parse(&value)?)
                };
                let (_, stored) = exercise
                    .entry_mut(key)
                    .ok_or(TreeError::UnknownSet(*key))?;
                *stored = reps;
            }
            Field::WeightConfig(config) => {
                let exercise = self.exercise_mut(id)?;
                let previous = exercise.weight_config;
                exercise.weight_config = config;
                if config == WeightConfig::Bodyweight {
                    set_all_weights(exercise, Some(Weight::ZERO));
                } else if previous == WeightConfig::Bodyweight {
                    set_all_weights(exercise, None);
                }
            }
            Field::RepsConfig(config) => {
                let exercise = self.exercise_mut(id)?;
                if exercise.reps_config != config {
                    exercise.reps_config = config;
                    clear_all_reps(exercise);
                }
            }
            Field::WeightUnit(unit) => {
                self.exercise_mut(id)?.weight_unit = unit;
            }
        }
        Ok(*id)
    }

    /// Renames an exercise, moving it to the id derived from the new name.
    pub fn rename_exercise(
        &mut self,
        id: &ExerciseID,
        name: Name,
    ) -> Result<ExerciseID, TreeError> {
        let new_id = ExerciseID::from_name(&name);
        if !self.contains(id) {
            return Err(TreeError::UnknownExercise(*id));
        }
        if new_id != *id
            && (self.exercises.contains_key(&new_id)
                || self
                    .exercises
                    .values()
                    .any(|e| e.id != *id && e.name.matches(&name)))
        {
            return Err(TreeError::DuplicateExercise(name));
        }
        let Some(mut exercise) = self.exercises.remove(id) else {
            return Err(TreeError::UnknownExercise(*id));
        };
        exercise.id = new_id;
        exercise.name = name;
        self.exercises.insert(new_id, exercise);
        if new_id != *id {
            for i in &mut self.order {
                if i == id {
                    *i = new_id;
                }
            }
            let rekey = |i: ExerciseID| if i == *id { new_id } else { i };
            self.successors = std::mem::take(&mut self.successors)
                .into_iter()
                .map(|(p, s)| (rekey(p), rekey(s)))
                .collect();
        }
        Ok(new_id)
    }

    pub fn toggle_completed(&mut self, id: &ExerciseID) -> Result<bool, TreeError> {
        let exercise = self.exercise_mut(id)?;
        exercise.completed = !exercise.completed;
        Ok(exercise.completed)
    }

    #[must_use]
    pub fn displayed_load(&self, id: &ExerciseID, set_key: &SetKey) -> Option<f64> {
        self.exercises.get(id)?.displayed_load(set_key)
    }

    /// Verifies that the superset links form dangling-free, acyclic, singly-linked chains.
    pub fn check_integrity(&self) -> Result<(), TreeError> {
        let mut targets = BTreeSet::new();
        for (predecessor, successor) in &self.successors {
            if !self.exercises.contains_key(predecessor) {
                return Err(TreeError::DanglingSuperset(*predecessor));
            }
            if !self.exercises.contains_key(successor) {
                return Err(TreeError::DanglingSuperset(*successor));
            }
            if predecessor == successor {
                return Err(TreeError::Cycle(*predecessor));
            }
            if !targets.insert(*successor) {
                return Err(TreeError::SharedSuccessor(*successor));
            }
        }
        for start in self.successors.keys() {
            let mut current = *start;
            for _ in 0..self.successors.len() {
                match self.successors.get(&current) {
                    Some(next) if next == start => return Err(TreeError::Cycle(*start)),
                    Some(next) => current = *next,
                    None => break,
                }
            }
        }
        Ok(())
    }

    fn exercise_mut(&mut self, id: &ExerciseID) -> Result<&mut Exercise, TreeError> {
        self.exercises
            .get_mut(id)
            .ok_or(TreeError::UnknownExercise(*id))
    }

    fn contains_name(&self, name: &Name) -> bool {
        self.exercises.values().any(|e| e.name.matches(name))
    }

    fn placeholder_name(&self) -> Result<Name, TreeError> {
        let mut n = self.len() + 1;
        loop {
            let name = Name::new(&format!("Exercise {n}"))?;
            if !self.contains_name(&name) {
                return Ok(name);
            }
            n += 1;
        }
    }
}

fn ordinal(len: usize) -> u32 {
    u32::try_from(len + 1).unwrap_or(u32::MAX)
}

fn set_position(exercise: &Exercise, set_key: &SetKey) -> Result<usize, TreeError> {
    if set_key.is_drop_set() {
        return Err(TreeError::NestedDropSet);
    }
    exercise
        .sets
        .iter()
        .position(|s| s.key == *set_key)
        .ok_or(TreeError::UnknownSet(*set_key))
}

fn initial_weight(config: WeightConfig) -> Option<Weight> {
    if config.accepts_weight() {
        None
    } else {
        Some(Weight::ZERO)
    }
}

fn set_all_weights(exercise: &mut Exercise, weight: Option<Weight>) {
    for set in &mut exercise.sets {
        set.weight = weight;
        for drop_set in &mut set.drop_sets {
            drop_set.weight = weight;
        }
    }
}

fn clear_all_reps(exercise: &mut Exercise) {
    for set in &mut exercise.sets {
        set.reps = None;
        for drop_set in &mut set.drop_sets {
            drop_set.reps = None;
        }
    }
}
