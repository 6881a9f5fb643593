use log::{debug, error};

use crate::{
    CreateError, Profile, ProfileRepository, ProfileService, ReadError, Template,
    TemplateRepository, TemplateService, UpdateError, UserID, WorkoutRecord, WorkoutRepository,
    WorkoutService,
};

/// Remote collaborators of the engine, with failures logged on the way through.
pub struct Service<R> {
    repository: R,
}

impl<R> Service<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }
}

macro_rules! log_on_error {
    ($func: expr, $error: ident, $action: literal, $entity: literal) => {{
        let result = $func.await;
        match result {
            Ok(_) => {}
            Err(ref err) => match err {
                $error::Storage(crate::StorageError::NoConnection) => {
                    debug!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    error!("failed to {} {}: {err}", $action, $entity);
                }
            },
        }
        result
    }};
}

impl<R: WorkoutRepository> WorkoutService for Service<R> {
    async fn get_workouts(&self) -> Result<Vec<WorkoutRecord>, ReadError> {
        log_on_error!(self.repository.read_workouts(), ReadError, "get", "workouts")
    }

    async fn create_workout(&self, workout: WorkoutRecord) -> Result<WorkoutRecord, CreateError> {
        log_on_error!(
            self.repository.create_workout(workout),
            CreateError,
            "create",
            "workout"
        )
    }
}

impl<R: TemplateRepository> TemplateService for Service<R> {
    async fn get_templates(&self) -> Result<Vec<Template>, ReadError> {
        log_on_error!(
            self.repository.read_templates(),
            ReadError,
            "get",
            "templates"
        )
    }

    async fn create_template(&self, template: Template) -> Result<Template, CreateError> {
        log_on_error!(
            self.repository.create_template(template),
            CreateError,
            "create",
            "template"
        )
    }
}

impl<R: ProfileRepository> ProfileService for Service<R> {
    async fn get_profile(&self, user_id: UserID) -> Result<Profile, ReadError> {
        log_on_error!(
            self.repository.read_profile(user_id),
            ReadError,
            "get",
            "profile"
        )
    }

    async fn replace_profile(&self, profile: Profile) -> Result<Profile, UpdateError> {
        log_on_error!(
            self.repository.replace_profile(profile),
            UpdateError,
            "replace",
            "profile"
        )
    }
}
