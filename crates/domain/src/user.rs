use chrono::NaiveDate;
use derive_more::Deref;
use uuid::Uuid;

use crate::{ReadError, UpdateError};

#[allow(async_fn_in_trait)]
pub trait ProfileService {
    async fn get_profile(&self, user_id: UserID) -> Result<Profile, ReadError>;
    async fn replace_profile(&self, profile: Profile) -> Result<Profile, UpdateError>;

    /// Adds the experience of a saved workout and advances the consistency streak. A missing
    /// profile is created.
    async fn record_workout(
        &self,
        user_id: UserID,
        added_exp: u64,
        date: NaiveDate,
    ) -> Result<Profile, UpdateError> {
        let mut profile = match self.get_profile(user_id).await {
            Ok(profile) => profile,
            Err(ReadError::NotFound) => Profile::new(user_id),
            Err(err) => return Err(err.into()),
        };
        profile.record_workout(added_exp, date);
        self.replace_profile(profile).await
    }
}

#[allow(async_fn_in_trait)]
pub trait ProfileRepository {
    async fn read_profile(&self, user_id: UserID) -> Result<Profile, ReadError>;
    async fn replace_profile(&self, profile: Profile) -> Result<Profile, UpdateError>;
}

#[derive(Deref, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct UserID(Uuid);

impl UserID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for UserID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for UserID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user_id: UserID,
    pub experience: u64,
    pub streak: u32,
    pub last_workout: Option<NaiveDate>,
}

impl Profile {
    #[must_use]
    pub fn new(user_id: UserID) -> Self {
        Self {
            user_id,
            experience: 0,
            streak: 0,
            last_workout: None,
        }
    }

    pub fn record_workout(&mut self, added_exp: u64, date: NaiveDate) {
        self.experience = self.experience.saturating_add(added_exp);
        self.streak = next_streak(self.streak, self.last_workout, date);
        self.last_workout = Some(date);
    }
}

/// Day-granularity consistency streak: continues if the previous workout was at most one day
/// before `today`, otherwise starts over at one.
#[must_use]
pub fn next_streak(streak: u32, last_workout: Option<NaiveDate>, today: NaiveDate) -> u32 {
    match last_workout {
        Some(last) if (0..=1).contains(&(today - last).num_days()) => streak.saturating_add(1),
        _ => 1,
    }
}
