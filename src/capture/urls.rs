//! Local object-URL registry.
//!
//! Browser-style `URL.createObjectURL`/`revokeObjectURL` lifecycle made
//! explicit: every media blob held by a draft gets a `blob:` token minted
//! here, and the token stays resolvable until the owning draft revokes it.
//! Revocation is final for that token — a removed attachment can never be
//! previewed again through a stale URL.
//!
//! The registry is a shared handle (cheap to clone) so the capture
//! controller that mints URLs and the intake draft that releases them
//! operate on the same live set.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

// ═══════════════════════════════════════════════════════════
// ObjectUrlRegistry
// ═══════════════════════════════════════════════════════════

/// Shared registry of live local object URLs.
///
/// Clones share the same underlying set. The lock only guards single
/// set inserts/removes, so a poisoned lock is safely recoverable.
#[derive(Debug, Clone, Default)]
pub struct ObjectUrlRegistry {
    live: Arc<Mutex<HashSet<String>>>,
}

impl ObjectUrlRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh local URL and mark it live.
    pub fn create(&self) -> String {
        let url = format!("blob:{}", Uuid::new_v4());
        self.lock().insert(url.clone());
        url
    }

    /// Revoke a URL. Returns `false` if it was unknown or already revoked.
    pub fn revoke(&self, url: &str) -> bool {
        self.lock().remove(url)
    }

    /// Is this URL still resolvable?
    pub fn is_live(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    /// How many URLs are currently live?
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_urls_are_live_and_distinct() {
        let registry = ObjectUrlRegistry::new();
        let a = registry.create();
        let b = registry.create();

        assert_ne!(a, b);
        assert!(a.starts_with("blob:"));
        assert!(registry.is_live(&a));
        assert!(registry.is_live(&b));
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn revoke_is_final() {
        let registry = ObjectUrlRegistry::new();
        let url = registry.create();

        assert!(registry.revoke(&url));
        assert!(!registry.is_live(&url));
        // Second revoke is a no-op
        assert!(!registry.revoke(&url));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn unknown_urls_are_not_live() {
        let registry = ObjectUrlRegistry::new();
        assert!(!registry.is_live("blob:nonsense"));
        assert!(!registry.revoke("blob:nonsense"));
    }

    #[test]
    fn clones_share_the_same_live_set() {
        let registry = ObjectUrlRegistry::new();
        let handle = registry.clone();

        let url = registry.create();
        assert!(handle.is_live(&url));

        handle.revoke(&url);
        assert!(!registry.is_live(&url));
    }
}
