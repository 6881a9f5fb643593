use chrono::{DateTime, Duration, Utc};

use crate::{Phase, Session};

/// Workout duration net of paused intervals.
///
/// Derived from absolute timestamps only. A finished session is frozen at its finish time.
#[must_use]
pub fn elapsed(session: &Session, now: DateTime<Utc>) -> Duration {
    let Some(started_at) = session.started_at else {
        return Duration::zero();
    };
    let end = match (session.phase, session.finished_at) {
        (Phase::Finished, Some(finished_at)) => finished_at,
        _ => now,
    };
    let open_pause = match (session.phase, session.pause_started_at) {
        (Phase::Paused, Some(pause_started_at)) => (end - pause_started_at).max(Duration::zero()),
        _ => Duration::zero(),
    };
    (end - started_at - session.paused - open_pause).max(Duration::zero())
}

/// Schedules recomputations at `anchor + k * period`.
///
/// Missed ticks collapse into a single due tick and the schedule never drifts.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker {
    period: Duration,
    anchor: Option<DateTime<Utc>>,
    next_due: Option<DateTime<Utc>>,
}

impl Ticker {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::milliseconds(1)),
            anchor: None,
            next_due: None,
        }
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    #[must_use]
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.next_due
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.anchor.is_none() {
            self.anchor = Some(now);
            self.next_due = Some(now + self.period);
        }
    }

    pub fn stop(&mut self) {
        self.anchor = None;
        self.next_due = None;
    }

    /// Returns whether a tick is due at `now` and advances the schedule past `now`.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        let (Some(anchor), Some(next_due)) = (self.anchor, self.next_due) else {
            return false;
        };
        if now < next_due {
            return false;
        }
        let period_ms = self.period.num_milliseconds();
        let ticks = (now - anchor).num_milliseconds() / period_ms + 1;
        self.next_due = Some(anchor + Duration::milliseconds(ticks * period_ms));
        true
    }
}

/// Publishes the elapsed time of a session while it is active.
#[derive(Debug, Clone, PartialEq)]
pub struct ElapsedTimeTracker {
    ticker: Ticker,
    published: Duration,
}

impl ElapsedTimeTracker {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            ticker: Ticker::new(period),
            published: Duration::zero(),
        }
    }

    #[must_use]
    pub fn published(&self) -> Duration {
        self.published
    }

    #[must_use]
    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Runs the ticker exactly while the session is active and republishes the current value.
    pub fn sync(&mut self, session: Option<&Session>, now: DateTime<Utc>) -> Duration {
        match session {
            Some(session) if session.phase == Phase::Active => self.ticker.start(now),
            _ => self.ticker.stop(),
        }
        self.published = session.map_or(Duration::zero(), |s| elapsed(s, now));
        self.published
    }

    /// The recomputed elapsed time if a tick is due.
    pub fn poll(&mut self, session: &Session, now: DateTime<Utc>) -> Option<Duration> {
        if self.ticker.poll(now) {
            self.published = elapsed(session, now);
            Some(self.published)
        } else {
            None
        }
    }
}
