//! Storage for saved FIRE profiles.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::core::{FireProfile, resolve_fire_target};

pub type ProfileId = u64;

/// A saved profile as returned to callers. `profile.fire_number` always holds
/// the target the projection starts from; `fire_number_derived` says whether
/// it was computed from expenses rather than supplied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProfile {
    pub id: ProfileId,
    #[serde(flatten)]
    pub profile: FireProfile,
    pub fire_number_derived: bool,
}

impl StoredProfile {
    /// Builds the caller view of a profile saved exactly as it was given.
    fn present(id: ProfileId, given: &FireProfile) -> Self {
        let fire_number_derived = !has_explicit_fire_number(given);
        let mut profile = given.clone();
        if fire_number_derived {
            profile.fire_number = resolve_fire_target(given).amount();
        }
        Self {
            id,
            profile,
            fire_number_derived,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("FireProfile not found with id {0}")]
    NotFound(ProfileId),
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn list(&self) -> Vec<StoredProfile>;
    async fn get(&self, id: ProfileId) -> Result<StoredProfile, StoreError>;
    async fn create(&self, profile: FireProfile) -> StoredProfile;
    async fn update(&self, id: ProfileId, profile: FireProfile)
    -> Result<StoredProfile, StoreError>;
}

fn has_explicit_fire_number(profile: &FireProfile) -> bool {
    profile.fire_number.is_some_and(|n| n > 0.0)
}

/// Drops a `fire_number` that merely echoes the value previously derived for
/// `previous`, so a fetched record sent back with new expenses is re-derived.
fn without_echoed_fire_number(previous: &FireProfile, mut incoming: FireProfile) -> FireProfile {
    if has_explicit_fire_number(previous) {
        return incoming;
    }
    let echoed = resolve_fire_target(previous).amount();
    if echoed.is_some() && incoming.fire_number == echoed {
        incoming.fire_number = None;
    }
    incoming
}

/// Profiles are kept as given; derived FIRE numbers are computed on read.
#[derive(Debug)]
pub struct InMemoryProfileStore {
    profiles: RwLock<BTreeMap<ProfileId, FireProfile>>,
    next_id: AtomicU64,
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self {
            profiles: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn list(&self) -> Vec<StoredProfile> {
        self.profiles
            .read()
            .await
            .iter()
            .map(|(id, profile)| StoredProfile::present(*id, profile))
            .collect()
    }

    async fn get(&self, id: ProfileId) -> Result<StoredProfile, StoreError> {
        self.profiles
            .read()
            .await
            .get(&id)
            .map(|profile| StoredProfile::present(id, profile))
            .ok_or(StoreError::NotFound(id))
    }

    async fn create(&self, profile: FireProfile) -> StoredProfile {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let stored = StoredProfile::present(id, &profile);
        self.profiles.write().await.insert(id, profile);
        info!(
            id,
            fire_number = ?stored.profile.fire_number,
            derived = stored.fire_number_derived,
            "created fire profile"
        );
        stored
    }

    async fn update(
        &self,
        id: ProfileId,
        profile: FireProfile,
    ) -> Result<StoredProfile, StoreError> {
        let mut profiles = self.profiles.write().await;
        let slot = profiles.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let profile = without_echoed_fire_number(slot, profile);
        let stored = StoredProfile::present(id, &profile);
        *slot = profile;
        info!(
            id,
            fire_number = ?stored.profile.fire_number,
            derived = stored.fire_number_derived,
            "updated fire profile"
        );
        Ok(stored)
    }
}
