use chrono::{DateTime, Utc};

use crate::{
    CreateError, DropSet, Exercise, ExerciseID, ExerciseTree, Name, ReadError, RepsConfig, Set,
    SetKey, TreeError, ValidationError, Weight, WeightConfig, WeightUnit,
};

#[allow(async_fn_in_trait)]
pub trait TemplateService {
    async fn get_templates(&self) -> Result<Vec<Template>, ReadError>;
    async fn create_template(&self, template: Template) -> Result<Template, CreateError>;

    /// Template names must be unique among the user's templates, ignoring case and spacing.
    async fn validate_template_name(&self, name: &str) -> Result<Name, ValidationError> {
        match Name::new(name) {
            Ok(name) => match self.get_templates().await {
                Ok(templates) => {
                    if templates.iter().all(|t| !t.name.matches(&name)) {
                        Ok(name)
                    } else {
                        Err(ValidationError::Conflict("templateName".to_string()))
                    }
                }
                Err(err) => Err(ValidationError::Other(err.into())),
            },
            Err(err) => Err(ValidationError::Other(err.into())),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait TemplateRepository {
    async fn read_templates(&self) -> Result<Vec<Template>, ReadError>;
    async fn create_template(&self, template: Template) -> Result<Template, CreateError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: Name,
    pub exercises: Vec<TemplateExercise>,
    pub created_at: DateTime<Utc>,
}

/// Structure of an exercise without any recorded values.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateExercise {
    pub id: ExerciseID,
    pub name: Name,
    pub weight_config: WeightConfig,
    pub reps_config: RepsConfig,
    pub weight_unit: WeightUnit,
    pub sets: Vec<TemplateSet>,
    pub superset_exercise: Option<ExerciseID>,
    pub is_superset: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TemplateSet {
    pub drop_sets: u32,
}

impl ExerciseTree {
    /// Expands a template into a tree of empty sets and drop sets.
    pub fn from_template(template: &[TemplateExercise]) -> Result<Self, TreeError> {
        let exercises = template
            .iter()
            .map(|t| {
                let mut exercise = Exercise::new(t.name.clone(), t.weight_unit);
                exercise.id = t.id;
                exercise.weight_config = t.weight_config;
                exercise.reps_config = t.reps_config;
                exercise.sets = (1..)
                    .zip(&t.sets)
                    .map(|(n, template_set)| {
                        let mut set = Set::new(SetKey::set(n));
                        set.drop_sets = (1..=template_set.drop_sets)
                            .map(|m| DropSet::new(SetKey::drop_set(n, m)))
                            .collect();
                        set
                    })
                    .collect();
                if exercise.weight_config == WeightConfig::Bodyweight {
                    for set in &mut exercise.sets {
                        set.weight = Some(Weight::ZERO);
                        for drop_set in &mut set.drop_sets {
                            drop_set.weight = Some(Weight::ZERO);
                        }
                    }
                }
                exercise
            })
            .collect();
        let supersets = template
            .iter()
            .filter_map(|t| t.superset_exercise.map(|successor| (t.id, successor)));
        ExerciseTree::from_parts(exercises, supersets)
    }

    /// Projects the tree onto its structure, dropping all weights and reps.
    #[must_use]
    pub fn to_template(&self) -> Vec<TemplateExercise> {
        self.exercises()
            .map(|e| TemplateExercise {
                id: e.id,
                name: e.name.clone(),
                weight_config: e.weight_config,
                reps_config: e.reps_config,
                weight_unit: e.weight_unit,
                sets: e
                    .sets
                    .iter()
                    .map(|s| TemplateSet {
                        drop_sets: u32::try_from(s.drop_sets.len()).unwrap_or(u32::MAX),
                    })
                    .collect(),
                superset_exercise: self.superset_of(&e.id),
                is_superset: self.is_superset(&e.id),
            })
            .collect()
    }
}
