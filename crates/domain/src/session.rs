use chrono::{DateTime, Duration, Utc};

use crate::{ExerciseTree, UserID};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No session, or a session whose timer has not been started yet.
    #[default]
    Idle,
    Active,
    Paused,
    Finished,
}

/// The in-progress workout owned by the session controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub tree: ExerciseTree,
    pub started_at: Option<DateTime<Utc>>,
    pub paused: Duration,
    pub pause_started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub phase: Phase,
    pub owner: UserID,
}

impl Session {
    /// A session whose timer has not been started.
    #[must_use]
    pub fn new(owner: UserID, tree: ExerciseTree) -> Self {
        Self {
            tree,
            started_at: None,
            paused: Duration::zero(),
            pause_started_at: None,
            finished_at: None,
            phase: Phase::Idle,
            owner,
        }
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.phase != Phase::Finished
    }

    /// Starts the timer if unset. A paused session is resumed instead.
    pub fn start(&mut self, now: DateTime<Utc>) {
        match self.phase {
            Phase::Idle => {
                self.started_at.get_or_insert(now);
                self.phase = Phase::Active;
            }
            Phase::Paused => self.resume(now),
            Phase::Active | Phase::Finished => {}
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.phase == Phase::Active {
            self.pause_started_at = Some(now);
            self.phase = Phase::Paused;
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.phase == Phase::Paused {
            self.close_pause(now);
            self.phase = Phase::Active;
        }
    }

    /// Freezes the session. An open pause interval is folded into the paused total first.
    pub fn finish(&mut self, now: DateTime<Utc>) {
        if matches!(self.phase, Phase::Active | Phase::Paused) {
            self.close_pause(now);
            self.finished_at = Some(now);
            self.phase = Phase::Finished;
        }
    }

    fn close_pause(&mut self, now: DateTime<Utc>) {
        if let Some(pause_started_at) = self.pause_started_at.take() {
            self.paused += (now - pause_started_at).max(Duration::zero());
        }
    }
}
