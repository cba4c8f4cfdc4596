//! In-memory cache for the API key used by verification submissions.

use chrono::{DateTime, Utc};

use crate::types::AccessCredential;

/// Holds at most one credential for the lifetime of a session.
///
/// The cache survives "start over"; it is only emptied when the remote service
/// rejects the credential or it is found to be expired before reuse.
#[derive(Debug, Default)]
pub struct CredentialCache {
    slot: Option<AccessCredential>,
    expiry_margin: chrono::Duration,
}

impl CredentialCache {
    pub fn new(expiry_margin: chrono::Duration) -> Self {
        Self {
            slot: None,
            expiry_margin,
        }
    }

    /// The cached credential, if it may still be presented at `now`.
    ///
    /// An expired credential is dropped from the cache.
    pub fn usable_at(&mut self, now: DateTime<Utc>) -> Option<&AccessCredential> {
        if self
            .slot
            .as_ref()
            .is_some_and(|credential| credential.is_expired_at(now, self.expiry_margin))
        {
            tracing::debug!("Discarding expired API key");
            self.slot = None;
        }
        self.slot.as_ref()
    }

    pub fn store(&mut self, credential: AccessCredential) {
        self.slot = Some(credential);
    }

    /// Drop the cached credential. Returns whether one was cached.
    pub fn invalidate(&mut self) -> bool {
        self.slot.take().is_some()
    }

    pub fn is_cached(&self) -> bool {
        self.slot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_empty_cache() {
        let mut cache = CredentialCache::new(Duration::seconds(30));
        assert!(!cache.is_cached());
        assert!(cache.usable_at(Utc::now()).is_none());
        assert!(!cache.invalidate());
    }

    #[test]
    fn test_fresh_credential_is_reused() {
        let now = Utc::now();
        let mut cache = CredentialCache::new(Duration::seconds(30));
        cache.store(AccessCredential::new("k1", now + Duration::hours(1)));

        assert_eq!(cache.usable_at(now).map(AccessCredential::token), Some("k1"));
        assert_eq!(cache.usable_at(now).map(AccessCredential::token), Some("k1"));
        assert!(cache.is_cached());
    }

    #[test]
    fn test_credential_inside_margin_is_dropped() {
        let now = Utc::now();
        let mut cache = CredentialCache::new(Duration::seconds(30));
        cache.store(AccessCredential::new("k1", now + Duration::seconds(10)));

        assert!(cache.usable_at(now).is_none());
        assert!(!cache.is_cached());
    }

    #[test]
    fn test_invalidate() {
        let mut cache = CredentialCache::new(Duration::zero());
        cache.store(AccessCredential::new("k1", Utc::now() + Duration::hours(1)));

        assert!(cache.invalidate());
        assert!(!cache.is_cached());
    }
}
