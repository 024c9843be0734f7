//! Profile publish/lookup and name registration (Section 4.6 / C6).
//!
//! Builds on the generic [`crate::dht::DhtClient`] facade: this module owns
//! the `keyserver:<fp>`, `name:<name>`, and `keyserver_name:<fp>` key
//! namespaces and the canonical encoding + DSA signature that make values in
//! those namespaces self-verifying.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use ochra_crypto::pq::DsaKeyPair;

use crate::dht::{DhtClient, PutOutcome};
use crate::fingerprint::Fingerprint;
use crate::{EngineError, Result};

/// TTL for keyserver and name records; a republish on each login keeps live
/// identities from expiring out of the DHT.
pub const RECORD_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Wallets {
    pub backbone: Option<String>,
    pub btc: Option<String>,
    pub eth: Option<String>,
    pub sol: Option<String>,
    pub trx: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Socials {
    pub telegram: Option<String>,
    pub x: Option<String>,
    pub github: Option<String>,
}

/// A signed, self-describing profile record published at `keyserver:<fp>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub display_name: Option<String>,
    pub wallets: Wallets,
    pub socials: Socials,
    pub bio: Option<String>,
    pub avatar_b64: Option<String>,
    pub dsa_pubkey: Vec<u8>,
    pub kem_pubkey: Vec<u8>,
    pub timestamp: u64,
    pub signature: Vec<u8>,
}

#[derive(Serialize)]
struct ProfileFields<'a> {
    display_name: &'a Option<String>,
    wallets: &'a Wallets,
    socials: &'a Socials,
    bio: &'a Option<String>,
    avatar_b64: &'a Option<String>,
    dsa_pubkey: &'a [u8],
    kem_pubkey: &'a [u8],
    timestamp: u64,
}

impl Profile {
    fn canonical_bytes(&self) -> Vec<u8> {
        let fields = ProfileFields {
            display_name: &self.display_name,
            wallets: &self.wallets,
            socials: &self.socials,
            bio: &self.bio,
            avatar_b64: &self.avatar_b64,
            dsa_pubkey: &self.dsa_pubkey,
            kem_pubkey: &self.kem_pubkey,
            timestamp: self.timestamp,
        };
        serde_json::to_vec(&fields).expect("profile fields are always serializable")
    }

    /// Sign this profile's canonical fields with `dsa`, setting `timestamp`
    /// and `signature` in place.
    pub fn sign(&mut self, dsa: &DsaKeyPair, timestamp: u64) {
        self.timestamp = timestamp;
        self.signature = dsa.sign(&self.canonical_bytes());
    }

    /// Verify this profile's signature against its own embedded DSA public key.
    pub fn verify(&self) -> Result<()> {
        ochra_crypto::pq::verify(&self.dsa_pubkey, &self.canonical_bytes(), &self.signature)?;
        Ok(())
    }

    pub fn has_any_wallet(&self) -> bool {
        self.wallets.backbone.is_some()
            || self.wallets.btc.is_some()
            || self.wallets.eth.is_some()
            || self.wallets.sol.is_some()
            || self.wallets.trx.is_some()
    }
}

/// `{name, fingerprint, dsa_pubkey, timestamp, signature}` published at
/// `name:<lowercased_name>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameRecord {
    pub name: String,
    pub fingerprint: Fingerprint,
    pub dsa_pubkey: Vec<u8>,
    pub timestamp: u64,
    pub signature: Vec<u8>,
}

#[derive(Serialize)]
struct NameRecordFields<'a> {
    name: &'a str,
    fingerprint: &'a Fingerprint,
    dsa_pubkey: &'a [u8],
    timestamp: u64,
}

impl NameRecord {
    fn canonical_bytes(&self) -> Vec<u8> {
        let fields = NameRecordFields {
            name: &self.name,
            fingerprint: &self.fingerprint,
            dsa_pubkey: &self.dsa_pubkey,
            timestamp: self.timestamp,
        };
        serde_json::to_vec(&fields).expect("name record fields are always serializable")
    }

    pub fn sign(&mut self, dsa: &DsaKeyPair, timestamp: u64) {
        self.timestamp = timestamp;
        self.signature = dsa.sign(&self.canonical_bytes());
    }

    pub fn verify(&self) -> Result<()> {
        ochra_crypto::pq::verify(&self.dsa_pubkey, &self.canonical_bytes(), &self.signature)?;
        Ok(())
    }
}

pub(crate) fn keyserver_key(fp: &Fingerprint) -> String {
    format!("keyserver:{fp}")
}

fn name_key(name: &str) -> String {
    format!("name:{}", name.to_lowercase())
}

fn reverse_name_key(fp: &Fingerprint) -> String {
    format!("keyserver_name:{fp}")
}

/// Publish `profile` (already signed) to `keyserver:<self_fp>`, then, if
/// `name` is present, claim `name:<name>` — first-writer-wins: a claim by a
/// different fingerprint than the one already on record is rejected with
/// [`EngineError::AlreadyExists`].
pub async fn publish(
    dht: &DhtClient,
    self_fp: &Fingerprint,
    name: Option<&str>,
    profile: &Profile,
    dsa: &DsaKeyPair,
    now: u64,
) -> Result<()> {
    let blob = serde_json::to_vec(profile).map_err(|e| EngineError::Internal(e.to_string()))?;
    let outcome = dht
        .chunked_put(keyserver_key(self_fp).as_bytes(), &blob, &profile.dsa_pubkey, RECORD_TTL)
        .await?;
    match outcome {
        PutOutcome::Ok => {}
        PutOutcome::TemporaryUnavailable => return Err(EngineError::Network),
        PutOutcome::PermanentConflict => return Err(EngineError::Internal("unexpected conflict on own profile key".into())),
    }

    if let Some(name) = name {
        let lname = name.to_lowercase();
        let key = name_key(&lname);
        if let Some(existing_raw) = dht.get(key.as_bytes()).await {
            let existing: NameRecord =
                serde_json::from_slice(&existing_raw).map_err(|e| EngineError::Internal(e.to_string()))?;
            if existing.fingerprint != *self_fp {
                return Err(EngineError::AlreadyExists);
            }
        }

        let mut record = NameRecord {
            name: lname,
            fingerprint: *self_fp,
            dsa_pubkey: profile.dsa_pubkey.clone(),
            timestamp: now,
            signature: Vec::new(),
        };
        record.sign(dsa, now);
        let record_bytes = serde_json::to_vec(&record).map_err(|e| EngineError::Internal(e.to_string()))?;
        let name_outcome = dht
            .put_signed(key.as_bytes(), record_bytes, &profile.dsa_pubkey, RECORD_TTL)
            .await;
        if name_outcome == PutOutcome::PermanentConflict {
            return Err(EngineError::AlreadyExists);
        }

        dht.put_signed(
            reverse_name_key(self_fp).as_bytes(),
            record.name.clone().into_bytes(),
            &profile.dsa_pubkey,
            RECORD_TTL,
        )
        .await;
    }

    Ok(())
}

/// Look up and verify `fp`'s profile. `NotFound` if absent; `InvalidSignature`
/// if the fetched record's embedded signature does not verify — the caller
/// is responsible for the "auto-remove contact" policy on that outcome.
pub async fn lookup(dht: &DhtClient, fp: &Fingerprint) -> Result<Profile> {
    let blob = dht
        .chunked_get(keyserver_key(fp).as_bytes())
        .await
        .ok_or_else(|| EngineError::NotFound(format!("profile {fp}")))?;
    let profile: Profile =
        serde_json::from_slice(&blob).map_err(|e| EngineError::Internal(e.to_string()))?;
    profile.verify().map_err(|_| EngineError::InvalidSignature)?;
    Ok(profile)
}

/// Resolve `name` to a fingerprint via a verified `NameRecord`.
pub async fn lookup_name(dht: &DhtClient, name: &str) -> Result<Fingerprint> {
    let raw = dht
        .get(name_key(name).as_bytes())
        .await
        .ok_or_else(|| EngineError::NotFound(format!("name {name}")))?;
    let record: NameRecord =
        serde_json::from_slice(&raw).map_err(|e| EngineError::Internal(e.to_string()))?;
    record.verify().map_err(|_| EngineError::InvalidSignature)?;
    Ok(record.fingerprint)
}

/// Scan the secondary fp→name record written at publish time. Absence is
/// not an error: returns `None`.
pub async fn reverse_lookup(dht: &DhtClient, fp: &Fingerprint) -> Option<String> {
    dht.get(reverse_name_key(fp).as_bytes())
        .await
        .and_then(|b| String::from_utf8(b).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_profile(dsa: &DsaKeyPair, kem_pub: Vec<u8>) -> Profile {
        Profile {
            display_name: Some("Alice".into()),
            wallets: Wallets::default(),
            socials: Socials::default(),
            bio: None,
            avatar_b64: None,
            dsa_pubkey: dsa.public_key.clone(),
            kem_pubkey: kem_pub,
            timestamp: 0,
            signature: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_publish_and_lookup_profile() {
        let dht = DhtClient::new();
        let dsa = DsaKeyPair::generate();
        let fp = Fingerprint::from_dsa_public_key(&dsa.public_key);
        let mut profile = test_profile(&dsa, vec![0u8; 32]);
        profile.sign(&dsa, 1_000);

        publish(&dht, &fp, None, &profile, &dsa, 1_000).await.expect("publish");
        let fetched = lookup(&dht, &fp).await.expect("lookup");
        assert_eq!(fetched.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_lookup_missing_profile_not_found() {
        let dht = DhtClient::new();
        let dsa = DsaKeyPair::generate();
        let fp = Fingerprint::from_dsa_public_key(&dsa.public_key);
        let err = lookup(&dht, &fp).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_name_registration_first_writer_wins() {
        let dht = DhtClient::new();
        let dsa_a = DsaKeyPair::generate();
        let fp_a = Fingerprint::from_dsa_public_key(&dsa_a.public_key);
        let mut profile_a = test_profile(&dsa_a, vec![1u8; 32]);
        profile_a.sign(&dsa_a, 1_000);
        publish(&dht, &fp_a, Some("nocdem"), &profile_a, &dsa_a, 1_000).await.expect("publish a");

        let dsa_b = DsaKeyPair::generate();
        let fp_b = Fingerprint::from_dsa_public_key(&dsa_b.public_key);
        let mut profile_b = test_profile(&dsa_b, vec![2u8; 32]);
        profile_b.sign(&dsa_b, 2_000);
        let err = publish(&dht, &fp_b, Some("nocdem"), &profile_b, &dsa_b, 2_000)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::AlreadyExists));

        let resolved = lookup_name(&dht, "nocdem").await.expect("lookup name");
        assert_eq!(resolved, fp_a);
    }

    #[tokio::test]
    async fn test_reverse_lookup_roundtrip() {
        let dht = DhtClient::new();
        let dsa = DsaKeyPair::generate();
        let fp = Fingerprint::from_dsa_public_key(&dsa.public_key);
        let mut profile = test_profile(&dsa, vec![3u8; 32]);
        profile.sign(&dsa, 1_000);
        publish(&dht, &fp, Some("carol"), &profile, &dsa, 1_000).await.expect("publish");
        assert_eq!(reverse_lookup(&dht, &fp).await.as_deref(), Some("carol"));
    }

    #[tokio::test]
    async fn test_reverse_lookup_absent_is_not_error() {
        let dht = DhtClient::new();
        let dsa = DsaKeyPair::generate();
        let fp = Fingerprint::from_dsa_public_key(&dsa.public_key);
        assert_eq!(reverse_lookup(&dht, &fp).await, None);
    }

    #[tokio::test]
    async fn test_tampered_profile_fails_verification() {
        let dht = DhtClient::new();
        let dsa = DsaKeyPair::generate();
        let fp = Fingerprint::from_dsa_public_key(&dsa.public_key);
        let mut profile = test_profile(&dsa, vec![4u8; 32]);
        profile.sign(&dsa, 1_000);
        profile.display_name = Some("Mallory".into());
        // publish the tampered profile directly, bypassing re-signing, to
        // simulate a corrupted or forged record reaching the DHT.
        let blob = serde_json::to_vec(&profile).unwrap();
        dht.chunked_put(
            format!("keyserver:{fp}").as_bytes(),
            &blob,
            &profile.dsa_pubkey,
            RECORD_TTL,
        )
        .await
        .unwrap();
        let err = lookup(&dht, &fp).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidSignature));
    }
}
