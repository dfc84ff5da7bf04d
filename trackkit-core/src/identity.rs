//! Resolution of the durable anonymous identifiers (user id, consent id).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::store::IdentifierStore;

const USER_ID_KEY: &str = "user-id";
const CONSENT_ID_KEY: &str = "consent-id";

/// Whether a value was freshly created at resolution time or already existed.
///
/// Embedded in outbound payloads for server-side bookkeeping; rendered
/// lowercase on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum Action {
    /// The value was generated by this resolution.
    New,
    /// The value existed prior to this resolution.
    Update,
}

/// A resolved identifier together with its [`Action`] tag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct IdentifierDescriptor {
    /// The identifier value (a lowercase canonical UUID string).
    pub value: String,
    /// `New` iff no prior value existed in the store at resolution time.
    pub action: Action,
}

/// Resolves the stable user and consent identifiers against an
/// [`IdentifierStore`].
///
/// Storage keys are namespaced by the configured container name so that two
/// containers configured on the same device never collide.
pub struct IdentityResolver {
    store: Arc<dyn IdentifierStore>,
    container: String,
}

impl IdentityResolver {
    /// Creates a resolver scoped to `container`.
    pub fn new(store: Arc<dyn IdentifierStore>, container: &str) -> Self {
        Self {
            store,
            container: container.to_string(),
        }
    }

    /// Resolves the stable user identifier.
    #[must_use]
    pub fn resolve_user(&self) -> IdentifierDescriptor {
        self.resolve(&self.scoped_key(USER_ID_KEY))
    }

    /// Resolves the stable consent identifier.
    #[must_use]
    pub fn resolve_consent(&self) -> IdentifierDescriptor {
        self.resolve(&self.scoped_key(CONSENT_ID_KEY))
    }

    /// Resolves the identifier under `key`: returns the stored value with
    /// [`Action::Update`] when present, otherwise generates a fresh one,
    /// persists it and returns it with [`Action::New`].
    ///
    /// Failure to read is treated as "absent"; failure to persist is logged
    /// and the freshly generated in-memory value is returned regardless, so a
    /// resolution never fails because the backing store did.
    #[must_use]
    pub fn resolve(&self, key: &str) -> IdentifierDescriptor {
        let stored = match self.store.get(key.to_string()) {
            Ok(stored) => stored,
            Err(err) => {
                log::warn!("identifier read failed for key {key}: {err}");
                None
            }
        };

        if let Some(value) = stored {
            log::debug!("identifier for key {key} resolved from store");
            return IdentifierDescriptor {
                value,
                action: Action::Update,
            };
        }

        let value = generate_identifier();
        if let Err(err) = self.store.set(key.to_string(), value.clone()) {
            log::warn!("identifier persist failed for key {key}: {err}");
        } else {
            log::info!("new identifier generated and stored for key {key}");
        }
        IdentifierDescriptor {
            value,
            action: Action::New,
        }
    }

    fn scoped_key(&self, leaf: &str) -> String {
        format!("trackkit.{}.{leaf}", self.container)
    }
}

/// Generates a 128-bit random identifier in canonical lowercase form.
fn generate_identifier() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryIdentifierStore, StoreError, StoreResult};

    /// A store whose writes (or reads) always fail.
    struct BrokenStore {
        fail_reads: bool,
    }

    impl IdentifierStore for BrokenStore {
        fn get(&self, _key: String) -> StoreResult<Option<String>> {
            if self.fail_reads {
                Err(StoreError::Read("backing store unavailable".to_string()))
            } else {
                Ok(None)
            }
        }

        fn set(&self, _key: String, _value: String) -> StoreResult<()> {
            Err(StoreError::Write("backing store unavailable".to_string()))
        }

        fn remove(&self, _key: String) -> StoreResult<()> {
            Ok(())
        }

        fn exists(&self, _key: String) -> StoreResult<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_resolve_generates_then_reuses() {
        let store = Arc::new(MemoryIdentifierStore::new());
        let resolver = IdentityResolver::new(store, "demo");

        let first = resolver.resolve_user();
        assert_eq!(first.action, Action::New);
        assert_eq!(first.value, first.value.to_lowercase());

        let second = resolver.resolve_user();
        assert_eq!(second.action, Action::Update);
        assert_eq!(second.value, first.value);
    }

    #[test]
    fn test_user_and_consent_identifiers_are_independent() {
        let store = Arc::new(MemoryIdentifierStore::new());
        let resolver = IdentityResolver::new(store, "demo");

        let user = resolver.resolve_user();
        let consent = resolver.resolve_consent();
        assert_ne!(user.value, consent.value);
        assert_eq!(consent.action, Action::New);
        assert_eq!(resolver.resolve_consent().value, consent.value);
    }

    #[test]
    fn test_containers_do_not_collide() {
        let store = Arc::new(MemoryIdentifierStore::new());
        let first = IdentityResolver::new(Arc::clone(&store) as Arc<dyn IdentifierStore>, "one");
        let second = IdentityResolver::new(store, "two");

        let a = first.resolve_user();
        let b = second.resolve_user();
        assert_ne!(a.value, b.value);
        assert_eq!(b.action, Action::New);
    }

    #[test]
    fn test_persist_failure_still_returns_value() {
        let resolver =
            IdentityResolver::new(Arc::new(BrokenStore { fail_reads: false }), "demo");

        let first = resolver.resolve_user();
        assert_eq!(first.action, Action::New);
        assert!(!first.value.is_empty());

        // Nothing was persisted, so the next resolution generates again.
        let second = resolver.resolve_user();
        assert_eq!(second.action, Action::New);
        assert_ne!(second.value, first.value);
    }

    #[test]
    fn test_read_failure_degrades_to_absent() {
        let resolver =
            IdentityResolver::new(Arc::new(BrokenStore { fail_reads: true }), "demo");

        let descriptor = resolver.resolve_user();
        assert_eq!(descriptor.action, Action::New);
        assert!(!descriptor.value.is_empty());
    }
}
