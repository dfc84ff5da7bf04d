//! Durable, key-scoped storage for anonymous identifiers.
//!
//! The host platform provides the actual backing store (Keychain, Keystore,
//! `UserDefaults`, a file, ...); the core only depends on this trait. Storage
//! failures are never fatal to business logic: the identity resolver logs them
//! and proceeds with the in-memory value (see [`crate::IdentityResolver`]).

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Result type for identifier store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by an identifier store implementation.
#[derive(Debug, Error)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error))]
#[cfg_attr(feature = "ffi", uniffi(flat_error))]
pub enum StoreError {
    /// The backing store could not be read.
    #[error("store read error: {0}")]
    Read(String),
    /// The backing store could not be written.
    #[error("store write error: {0}")]
    Write(String),
}

/// Key-scoped persistent storage for string identifiers.
///
/// Implementations must be safe to call before any other SDK component is
/// initialized.
#[cfg_attr(feature = "ffi", uniffi::export(with_foreign))]
pub trait IdentifierStore: Send + Sync {
    /// Returns the value stored under `key`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: String) -> StoreResult<Option<String>>;

    /// Persists `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&self, key: String, value: String) -> StoreResult<()>;

    /// Removes the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: String) -> StoreResult<()>;

    /// Whether a value exists under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn exists(&self, key: String) -> StoreResult<bool>;
}

/// An in-process [`IdentifierStore`].
///
/// Holds values for the lifetime of the process only. Useful as a test double
/// and for hosts that opt out of durable identity.
#[derive(Debug, Default)]
pub struct MemoryIdentifierStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryIdentifierStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentifierStore for MemoryIdentifierStore {
    fn get(&self, key: String) -> StoreResult<Option<String>> {
        let guard = self
            .values
            .lock()
            .map_err(|_| StoreError::Read("mutex poisoned".to_string()))?;
        Ok(guard.get(&key).cloned())
    }

    fn set(&self, key: String, value: String) -> StoreResult<()> {
        let mut guard = self
            .values
            .lock()
            .map_err(|_| StoreError::Write("mutex poisoned".to_string()))?;
        guard.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: String) -> StoreResult<()> {
        let mut guard = self
            .values
            .lock()
            .map_err(|_| StoreError::Write("mutex poisoned".to_string()))?;
        guard.remove(&key);
        Ok(())
    }

    fn exists(&self, key: String) -> StoreResult<bool> {
        let guard = self
            .values
            .lock()
            .map_err(|_| StoreError::Read("mutex poisoned".to_string()))?;
        Ok(guard.contains_key(&key))
    }
}
