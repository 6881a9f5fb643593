use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

use crate::{
    CacheError, Clock, CreateError, ElapsedTimeTracker, ExerciseID, ExerciseTree, Field, Name,
    PersistenceCache, Phase, Profile, ProfileService, SaveError, Score, Session,
    SessionCacheRepository, SetKey, Settings, Template, TemplateExercise, TemplateService,
    TreeError, UpdateError, UserID, ValidationError, WorkoutDetails, WorkoutRecord,
    WorkoutService, elapsed, score,
};

/// Owns the session of one user and gates every change to it.
///
/// Each change to the tree or the timing is mirrored into the cache. Events that refer to an
/// absent session or to exercises that no longer exist are ignored, as UI events may arrive
/// out of order.
pub struct SessionController<R, C> {
    cache: PersistenceCache<R>,
    clock: C,
    settings: Settings,
    user_id: UserID,
    session: Option<Session>,
    tracker: ElapsedTimeTracker,
    restored: bool,
}

#[derive(Debug)]
pub struct SaveOutcome {
    pub workout: WorkoutRecord,
    pub score: Score,
    pub template: Option<Template>,
    pub template_error: Option<CreateError>,
    pub profile: Option<Profile>,
    pub profile_error: Option<UpdateError>,
}

impl<R: SessionCacheRepository, C: Clock> SessionController<R, C> {
    pub fn new(repository: R, clock: C, settings: Settings, user_id: UserID) -> Self {
        Self {
            cache: PersistenceCache::new(repository),
            clock,
            tracker: ElapsedTimeTracker::new(settings.tick_interval()),
            settings,
            user_id,
            session: None,
            restored: false,
        }
    }

    /// Recovers a cached session. Only the first call reads the cache.
    ///
    /// Returns the last mirrored elapsed time for display until the first tick.
    pub fn restore(&mut self) -> Option<Duration> {
        if self.restored || self.session.is_some() {
            return None;
        }
        self.restored = true;
        let recovered = self
            .cache
            .load(self.user_id, self.settings.discard_foreign_sessions)?;
        debug!("restored session in phase {:?}", recovered.session.phase);
        self.session = Some(recovered.session);
        self.tracker.sync(self.session.as_ref(), self.clock.now());
        recovered.last_elapsed
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn tree(&self) -> Option<&ExerciseTree> {
        self.session.as_ref().map(|s| &s.tree)
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.session.as_ref().map_or(Phase::Idle, |s| s.phase)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.session
            .as_ref()
            .map_or(Duration::zero(), |s| elapsed(s, self.clock.now()))
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// When the host should call [`SessionController::tick`] next. `None` unless active.
    #[must_use]
    pub fn next_tick(&self) -> Option<DateTime<Utc>> {
        self.tracker.ticker().next_due()
    }

    pub fn take_cache_failures(&mut self) -> Vec<CacheError> {
        self.cache.take_failures()
    }

    /// Starts a new session or continues the existing one, recovering a cached session first.
    pub fn start(&mut self) {
        self.restore();
        let now = self.clock.now();
        self.session
            .get_or_insert_with(|| Session::new(self.user_id, ExerciseTree::new()))
            .start(now);
        self.transitioned(now);
    }

    /// Starts a session seeded from a template. An existing session is kept as is.
    pub fn start_from_template(&mut self, template: &[TemplateExercise]) -> Result<(), TreeError> {
        self.restore();
        if self.session.is_some() {
            debug!("ignoring template start with existing session");
            return Ok(());
        }
        let tree = ExerciseTree::from_template(template)?;
        let now = self.clock.now();
        let mut session = Session::new(self.user_id, tree);
        session.start(now);
        self.session = Some(session);
        self.transitioned(now);
        Ok(())
    }

    pub fn pause(&mut self) {
        self.transition("pause", Session::pause);
    }

    pub fn resume(&mut self) {
        self.transition("resume", Session::resume);
    }

    pub fn finish(&mut self) {
        self.transition("finish", Session::finish);
    }

    /// Drops the session and its cached mirror.
    pub fn reset(&mut self) {
        self.session = None;
        self.cache.clear();
        self.tracker.sync(None, self.clock.now());
    }

    /// Republishes the elapsed time if a tick is due.
    pub fn tick(&mut self) -> Option<Duration> {
        let now = self.clock.now();
        let published = self.tracker.poll(self.session.as_ref()?, now)?;
        self.mirror(now);
        Some(published)
    }

    pub fn add_exercise(
        &mut self,
        after: Option<ExerciseID>,
    ) -> Result<Option<ExerciseID>, TreeError> {
        let unit = self.settings.default_weight_unit;
        self.edit("add exercise", |tree| tree.add_exercise(after, unit))
    }

    pub fn add_named_exercise(
        &mut self,
        name: &str,
        after: Option<ExerciseID>,
    ) -> Result<Option<ExerciseID>, TreeError> {
        let name = Name::new(name)?;
        let unit = self.settings.default_weight_unit;
        self.edit("add exercise", |tree| {
            tree.add_named_exercise(name, after, unit)
        })
    }

    pub fn delete_exercise(
        &mut self,
        id: &ExerciseID,
    ) -> Result<Option<Vec<ExerciseID>>, TreeError> {
        self.edit("delete exercise", |tree| tree.delete_exercise(id))
    }

    pub fn add_set(&mut self, id: &ExerciseID) -> Result<Option<SetKey>, TreeError> {
        self.edit("add set", |tree| tree.add_set(id))
    }

    pub fn delete_set(
        &mut self,
        id: &ExerciseID,
        set_key: &SetKey,
    ) -> Result<Option<()>, TreeError> {
        self.edit("delete set", |tree| tree.delete_set(id, set_key))
    }

    pub fn add_drop_set(
        &mut self,
        id: &ExerciseID,
        set_key: &SetKey,
    ) -> Result<Option<SetKey>, TreeError> {
        self.edit("add drop set", |tree| tree.add_drop_set(id, set_key))
    }

    pub fn delete_drop_set(
        &mut self,
        id: &ExerciseID,
        set_key: &SetKey,
        index: usize,
    ) -> Result<Option<()>, TreeError> {
        self.edit("delete drop set", |tree| {
            tree.delete_drop_set(id, set_key, index)
        })
    }

    pub fn update_field(
        &mut self,
        id: &ExerciseID,
        set_key: Option<&SetKey>,
        field: Field,
    ) -> Result<Option<ExerciseID>, TreeError> {
        self.edit("update field", |tree| tree.update_field(id, set_key, field))
    }

    pub fn toggle_completed(&mut self, id: &ExerciseID) -> Result<Option<bool>, TreeError> {
        self.edit("toggle completed", |tree| tree.toggle_completed(id))
    }

    /// Saves the finished session remotely and returns to idle.
    ///
    /// The workout is written once. If that fails, the session and its cache are kept so that
    /// the save can be retried. Failures of the template and profile writes do not undo the
    /// saved workout and are reported in the outcome.
    pub async fn save<S>(
        &mut self,
        service: &S,
        details: &WorkoutDetails,
    ) -> Result<SaveOutcome, SaveError>
    where
        S: WorkoutService + TemplateService + ProfileService,
    {
        let Some(session) = self
            .session
            .as_ref()
            .filter(|s| s.phase == Phase::Finished)
        else {
            return Err(SaveError::NotFinished);
        };

        if !session.tree.has_loggable_sets() {
            return Err(ValidationError::NoLoggableSets.into());
        }

        if !details.allow_incomplete {
            let incomplete = session
                .tree
                .incomplete_exercises()
                .into_iter()
                .map(|e| e.name.clone())
                .collect::<Vec<_>>();
            if !incomplete.is_empty() {
                return Err(ValidationError::IncompleteExercises(incomplete).into());
            }
        }

        let template_name = match &details.template_name {
            Some(name) => Some(service.validate_template_name(name).await?),
            None => None,
        };

        let now = self.clock.now();
        let total_workout_time = elapsed(session, now);
        let score = score(&session.tree, total_workout_time);
        let record = WorkoutRecord::new(
            self.user_id,
            &session.tree,
            &score,
            details,
            now,
            total_workout_time,
        );
        let template = template_name.map(|name| Template {
            name,
            exercises: session.tree.to_template(),
            created_at: now,
        });

        let workout = service.create_workout(record).await?;

        let (template, template_error) = match template {
            Some(template) => match service.create_template(template).await {
                Ok(template) => (Some(template), None),
                Err(err) => {
                    warn!("workout saved without template: {err}");
                    (None, Some(err))
                }
            },
            None => (None, None),
        };

        let (profile, profile_error) = match service
            .record_workout(self.user_id, score.added_exp, now.date_naive())
            .await
        {
            Ok(profile) => (Some(profile), None),
            Err(err) => {
                warn!("workout saved without profile update: {err}");
                (None, Some(err))
            }
        };

        self.reset();

        Ok(SaveOutcome {
            workout,
            score,
            template,
            template_error,
            profile,
            profile_error,
        })
    }

    fn transition(&mut self, operation: &str, change: fn(&mut Session, DateTime<Utc>)) {
        let now = self.clock.now();
        match self.session.as_mut() {
            Some(session) => {
                change(session, now);
                self.transitioned(now);
            }
            None => debug!("ignoring {operation} without session"),
        }
    }

    fn transitioned(&mut self, now: DateTime<Utc>) {
        self.tracker.sync(self.session.as_ref(), now);
        self.mirror(now);
    }

    fn edit<T>(
        &mut self,
        operation: &str,
        change: impl FnOnce(&mut ExerciseTree) -> Result<T, TreeError>,
    ) -> Result<Option<T>, TreeError> {
        let Some(session) = self.session.as_mut().filter(|s| s.is_editable()) else {
            debug!("ignoring {operation} without editable session");
            return Ok(None);
        };
        match change(&mut session.tree) {
            Ok(value) => {
                self.mirror(self.clock.now());
                Ok(Some(value))
            }
            Err(err) if err.is_stale_reference() => {
                debug!("ignoring {operation}: {err}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn mirror(&mut self, now: DateTime<Utc>) {
        if let Some(session) = &self.session {
            self.cache.mirror(session, elapsed(session, now));
        }
    }
}
