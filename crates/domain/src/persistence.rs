use std::{collections::VecDeque, rc::Rc};

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

use crate::{CacheError, ExerciseTree, Phase, Session, UserID};

/// Local durable cache of the in-progress session, one entry per key.
///
/// Writes are independent of each other. Readers must tolerate any subset of the entries being
/// missing or stale.
pub trait SessionCacheRepository {
    fn read_current_workout(&self) -> Result<Option<ExerciseTree>, CacheError>;
    fn write_current_workout(&self, tree: &ExerciseTree) -> Result<(), CacheError>;
    fn read_start_time(&self) -> Result<Option<DateTime<Utc>>, CacheError>;
    /// Removes the entry when `start_time` is `None`.
    fn write_start_time(&self, start_time: Option<DateTime<Utc>>) -> Result<(), CacheError>;
    fn read_elapsed_time(&self) -> Result<Option<Duration>, CacheError>;
    fn write_elapsed_time(&self, elapsed: Duration) -> Result<(), CacheError>;
    fn read_pause_state(&self) -> Result<Option<PauseState>, CacheError>;
    fn write_pause_state(&self, pause_state: &PauseState) -> Result<(), CacheError>;
    fn read_session_owner(&self) -> Result<Option<UserID>, CacheError>;
    fn write_session_owner(&self, owner: UserID) -> Result<(), CacheError>;
    fn clear_session(&self) -> Result<(), CacheError>;
}

impl<R: SessionCacheRepository + ?Sized> SessionCacheRepository for Rc<R> {
    fn read_current_workout(&self) -> Result<Option<ExerciseTree>, CacheError> {
        (**self).read_current_workout()
    }

    fn write_current_workout(&self, tree: &ExerciseTree) -> Result<(), CacheError> {
        (**self).write_current_workout(tree)
    }

    fn read_start_time(&self) -> Result<Option<DateTime<Utc>>, CacheError> {
        (**self).read_start_time()
    }

    fn write_start_time(&self, start_time: Option<DateTime<Utc>>) -> Result<(), CacheError> {
        (**self).write_start_time(start_time)
    }

    fn read_elapsed_time(&self) -> Result<Option<Duration>, CacheError> {
        (**self).read_elapsed_time()
    }

    fn write_elapsed_time(&self, elapsed: Duration) -> Result<(), CacheError> {
        (**self).write_elapsed_time(elapsed)
    }

    fn read_pause_state(&self) -> Result<Option<PauseState>, CacheError> {
        (**self).read_pause_state()
    }

    fn write_pause_state(&self, pause_state: &PauseState) -> Result<(), CacheError> {
        (**self).write_pause_state(pause_state)
    }

    fn read_session_owner(&self) -> Result<Option<UserID>, CacheError> {
        (**self).read_session_owner()
    }

    fn write_session_owner(&self, owner: UserID) -> Result<(), CacheError> {
        (**self).write_session_owner(owner)
    }

    fn clear_session(&self) -> Result<(), CacheError> {
        (**self).clear_session()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauseState {
    pub accumulated: Duration,
    pub started_at: Option<DateTime<Utc>>,
}

impl PauseState {
    /// A finished session is stored as paused at its finish time, so that its clock stays
    /// frozen across restarts.
    #[must_use]
    pub fn of(session: &Session) -> Self {
        Self {
            accumulated: session.paused,
            started_at: match session.phase {
                Phase::Finished => session.finished_at,
                _ => session.pause_started_at,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredSession {
    pub session: Session,
    /// Last mirrored elapsed time, for display until it is recomputed.
    pub last_elapsed: Option<Duration>,
}

/// Number of cache failures kept until the host drains them.
pub const MAX_FAILURES: usize = 100;

/// Best-effort mirror of the session into a [`SessionCacheRepository`].
///
/// Failures never reach the caller. They are logged and collected for
/// [`PersistenceCache::take_failures`].
pub struct PersistenceCache<R> {
    repository: R,
    failures: VecDeque<CacheError>,
}

impl<R: SessionCacheRepository> PersistenceCache<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            failures: VecDeque::new(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Writes every entry in a fixed order.
    pub fn mirror(&mut self, session: &Session, elapsed: Duration) {
        let results = [
            ("currentWorkout", self.repository.write_current_workout(&session.tree)),
            ("startTime", self.repository.write_start_time(session.started_at)),
            ("elapsedTime", self.repository.write_elapsed_time(elapsed)),
            (
                "pauseState",
                self.repository.write_pause_state(&PauseState::of(session)),
            ),
            (
                "sessionOwner",
                self.repository.write_session_owner(session.owner),
            ),
        ];
        for (key, result) in results {
            if let Err(err) = result {
                self.report("write", key, err);
            }
        }
    }

    /// Recovers a session for `owner`. Unreadable entries degrade to "no session".
    pub fn load(&mut self, owner: UserID, discard_foreign: bool) -> Option<RecoveredSession> {
        let tree = match self.repository.read_current_workout() {
            Ok(Some(tree)) if !tree.is_empty() => tree,
            Ok(_) => return None,
            Err(err) => {
                self.report("read", "currentWorkout", err);
                return None;
            }
        };

        match self.repository.read_session_owner() {
            Ok(Some(cached_owner)) if cached_owner != owner && discard_foreign => {
                debug!("discarding cached session of another user");
                self.clear();
                return None;
            }
            Ok(_) => {}
            Err(err) => {
                self.report("read", "sessionOwner", err);
                return None;
            }
        }

        let mut session = Session::new(owner, tree);
        session.started_at = self
            .repository
            .read_start_time()
            .unwrap_or_else(|err| self.report_missing("read", "startTime", err));
        if session.is_started() {
            let pause_state = self
                .repository
                .read_pause_state()
                .unwrap_or_else(|err| self.report_missing("read", "pauseState", err));
            if let Some(pause_state) = pause_state {
                session.paused = pause_state.accumulated;
                session.pause_started_at = pause_state.started_at;
            }
            session.phase = if session.pause_started_at.is_some() {
                Phase::Paused
            } else {
                Phase::Active
            };
        }
        let last_elapsed = self
            .repository
            .read_elapsed_time()
            .unwrap_or_else(|err| self.report_missing("read", "elapsedTime", err));

        Some(RecoveredSession {
            session,
            last_elapsed,
        })
    }

    pub fn clear(&mut self) {
        if let Err(err) = self.repository.clear_session() {
            self.report("clear", "session cache", err);
        }
    }

    /// Drains the failures collected since the last call, oldest first. Only the latest
    /// [`MAX_FAILURES`] are kept.
    pub fn take_failures(&mut self) -> Vec<CacheError> {
        self.failures.drain(..).collect()
    }

    fn report(&mut self, action: &str, key: &str, err: CacheError) {
        warn!("failed to {action} {key}: {err}");
        self.push_failure(err);
    }

    fn report_missing<T>(&mut self, action: &str, key: &str, err: CacheError) -> Option<T> {
        self.report(action, key, err);
        None
    }

    fn push_failure(&mut self, err: CacheError) {
        if self.failures.len() == MAX_FAILURES {
            self.failures.pop_front();
        }
        self.failures.push_back(err);
    }
}
