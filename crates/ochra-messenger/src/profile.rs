//! Profile cache and refresh policy (Section 4.10 "get_profile / lookup_profile" / C11).
//!
//! A thin layer over [`crate::store::ProfileDb`] and [`crate::keyserver`]:
//! `get_profile` prefers the local cache, `lookup_profile` (and `refresh`)
//! always goes to the DHT and repopulates the cache. An `InvalidSignature`
//! from the DHT is left to the caller to act on (Section 7: auto-remove the
//! contact), this module only fetches and caches.

use crate::dht::DhtClient;
use crate::fingerprint::Fingerprint;
use crate::keyserver::{self, Profile};
use crate::store::ProfileDb;
use crate::{EngineError, Result};

/// How long a cached profile is trusted before `get_or_fetch` goes back to
/// the DHT, matching the daemon's other cache TTLs.
pub const FRESHNESS_WINDOW_SECS: u64 = 15 * 60;

pub struct ProfileCache {
    db: ProfileDb,
}

impl ProfileCache {
    pub fn new(db: ProfileDb) -> Self {
        Self { db }
    }

    /// Return the cached profile for `fp`, if present, without touching the DHT.
    pub async fn get_cached(&self, fp: &Fingerprint) -> Result<Option<Profile>> {
        Ok(self.get_cached_with_age(fp).await?.map(|(profile, _)| profile))
    }

    /// Like [`Self::get_cached`] but also returns the row's `fetched_at`.
    async fn get_cached_with_age(&self, fp: &Fingerprint) -> Result<Option<(Profile, u64)>> {
        match self.db.get(&fp.to_hex()).await? {
            Some(row) => {
                let profile = serde_json::from_str(&row.profile_json)
                    .map_err(|e| EngineError::Internal(e.to_string()))?;
                Ok(Some((profile, row.fetched_at)))
            }
            None => Ok(None),
        }
    }

    pub async fn store(&self, fp: &Fingerprint, profile: &Profile, fetched_at: u64) -> Result<()> {
        let json = serde_json::to_string(profile).map_err(|e| EngineError::Internal(e.to_string()))?;
        self.db.put(&fp.to_hex(), &json, fetched_at).await
    }

    pub async fn invalidate(&self, fp: &Fingerprint) -> Result<()> {
        self.db.invalidate(&fp.to_hex()).await
    }

    pub async fn set_display_name(&self, fp: &Fingerprint, name: &str) -> Result<()> {
        self.db.set_name(&fp.to_hex(), name).await
    }

    pub async fn cached_display_name(&self, fp: &Fingerprint) -> Result<Option<String>> {
        self.db.get_name(&fp.to_hex()).await
    }

    /// `get_profile`: prefer the cache while it's within the freshness
    /// window; on a miss or a stale entry, fetch and recache.
    pub async fn get_or_fetch(&self, dht: &DhtClient, fp: &Fingerprint, now: u64) -> Result<Profile> {
        if let Some((cached, fetched_at)) = self.get_cached_with_age(fp).await? {
            if now.saturating_sub(fetched_at) < FRESHNESS_WINDOW_SECS {
                return Ok(cached);
            }
        }
        self.refresh(dht, fp, now).await
    }

    /// `lookup_profile` / explicit refresh: always hits the DHT, verifies,
    /// and repopulates the cache on success.
    pub async fn refresh(&self, dht: &DhtClient, fp: &Fingerprint, now: u64) -> Result<Profile> {
        let profile = keyserver::lookup(dht, fp).await?;
        self.store(fp, &profile, now).await?;
        Ok(profile)
    }
}
