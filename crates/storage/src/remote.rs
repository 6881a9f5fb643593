use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use liftlog_domain::{
    CreateError, Profile, ProfileRepository, ReadError, StorageError, Template,
    TemplateRepository, UpdateError, UserID, WorkoutRecord, WorkoutRepository,
};

/// Remote document store kept in memory, for hosts without a backend.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    workouts: Mutex<Vec<WorkoutRecord>>,
    templates: Mutex<Vec<Template>>,
    profiles: Mutex<BTreeMap<UserID, Profile>>,
}

impl MemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|err| StorageError::Other(err.to_string().into()))
}

impl WorkoutRepository for MemoryRemote {
    async fn read_workouts(&self) -> Result<Vec<WorkoutRecord>, ReadError> {
        Ok(lock(&self.workouts)?.clone())
    }

    async fn create_workout(&self, workout: WorkoutRecord) -> Result<WorkoutRecord, CreateError> {
        lock(&self.workouts)?.push(workout.clone());
        Ok(workout)
    }
}

impl TemplateRepository for MemoryRemote {
    async fn read_templates(&self) -> Result<Vec<Template>, ReadError> {
        Ok(lock(&self.templates)?.clone())
    }

    async fn create_template(&self, template: Template) -> Result<Template, CreateError> {
        let mut templates = lock(&self.templates)?;
        if templates.iter().any(|t| t.name.matches(&template.name)) {
            return Err(CreateError::Conflict);
        }
        templates.push(template.clone());
        Ok(template)
    }
}

impl ProfileRepository for MemoryRemote {
    async fn read_profile(&self, user_id: UserID) -> Result<Profile, ReadError> {
        lock(&self.profiles)?
            .get(&user_id)
            .cloned()
            .ok_or(ReadError::NotFound)
    }

    async fn replace_profile(&self, profile: Profile) -> Result<Profile, UpdateError> {
        lock(&self.profiles)?.insert(profile.user_id, profile.clone());
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, NaiveDate};
    use liftlog_domain::{
        ManualClock, Name, ProfileService, SaveError, Service, SessionController, Settings,
        TemplateService, ValidationError, WorkoutDetails, WorkoutService,
    };
    use pretty_assertions::assert_eq;

    use crate::{
        cache::Cache,
        memory::MemoryStore,
        tests::data::{STARTED_AT, USER},
    };

    use super::*;

    #[tokio::test]
    async fn test_template_names_are_unique() {
        let remote = MemoryRemote::new();
        let template = Template {
            name: Name::new("Leg Day").unwrap(),
            exercises: vec![],
            created_at: *STARTED_AT,
        };
        remote.create_template(template.clone()).await.unwrap();
        assert!(matches!(
            remote
                .create_template(Template {
                    name: Name::new("leg  day").unwrap(),
                    ..template.clone()
                })
                .await,
            Err(CreateError::Conflict)
        ));
        assert_eq!(remote.read_templates().await.unwrap(), vec![template]);
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let remote = MemoryRemote::new();
        assert!(matches!(
            remote.read_profile(*USER).await,
            Err(ReadError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_save_workout() {
        let clock = ManualClock::new(*STARTED_AT);
        let service = Service::new(MemoryRemote::new());
        let store = Arc::new(MemoryStore::new());
        let mut controller = SessionController::new(
            Cache::new(Arc::clone(&store)),
            &clock,
            Settings::default(),
            *USER,
        );

        controller.start();
        let push_up = controller
            .add_named_exercise("Push Up", None)
            .unwrap()
            .unwrap();
        controller
            .update_field(
                &push_up,
                None,
                liftlog_domain::Field::WeightConfig(liftlog_domain::WeightConfig::Bodyweight),
            )
            .unwrap();
        controller
            .update_field(
                &push_up,
                Some(&liftlog_domain::SetKey::set(1)),
                liftlog_domain::Field::Reps("20".to_string()),
            )
            .unwrap();
        controller.toggle_completed(&push_up).unwrap();
        clock.advance(Duration::minutes(20));
        controller.finish();

        let details = WorkoutDetails {
            title: " Morning ".to_string(),
            template_name: Some("Push".to_string()),
            ..WorkoutDetails::default()
        };
        let outcome = controller.save(&service, &details).await.unwrap();

        assert_eq!(outcome.workout.title, "Morning");
        assert_eq!(outcome.workout.total_workout_time, Duration::minutes(20));
        assert_eq!(service.get_workouts().await.unwrap(), vec![outcome.workout]);
        assert_eq!(service.get_templates().await.unwrap().len(), 1);
        assert_eq!(
            service.get_profile(*USER).await.unwrap().last_workout,
            NaiveDate::from_ymd_opt(2023, 11, 14)
        );
        assert!(controller.session().is_none());
        assert!(store.keys().is_empty());

        controller.start();
        controller.add_named_exercise("Push Up", None).unwrap();
        controller.finish();
        assert!(matches!(
            controller.save(&service, &details).await,
            Err(SaveError::Validation(ValidationError::NoLoggableSets))
        ));
    }
}
