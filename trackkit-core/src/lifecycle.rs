//! Abstract application lifecycle signal surface.
//!
//! The host environment fires three signals (foreground, background,
//! terminate) without the core assuming any particular platform API. Hosts
//! either call [`crate::Tracker::notify_lifecycle`] directly, or implement
//! [`LifecycleSource`] and let the tracker register itself; the returned
//! [`LifecycleSubscription`] unsubscribes when dropped so lifecycle ownership
//! stays scoped.

use std::sync::Arc;

/// An application lifecycle transition delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum AppLifecycleEvent {
    /// The app is resuming to the foreground.
    EnterForeground,
    /// The app is moving to the background.
    EnterBackground,
    /// The app is about to terminate.
    Terminate,
}

/// Receiver of lifecycle events. Implemented by the SDK (see
/// [`crate::Tracker`]); hosts call it, directly or through a
/// [`LifecycleSource`].
#[cfg_attr(feature = "ffi", uniffi::export(with_foreign))]
pub trait LifecycleObserver: Send + Sync {
    /// Delivers a lifecycle transition.
    fn on_lifecycle_event(&self, event: AppLifecycleEvent);
}

/// Host-side registration point for lifecycle signals (the platform's
/// notification-center analog).
#[cfg_attr(feature = "ffi", uniffi::export(with_foreign))]
pub trait LifecycleSource: Send + Sync {
    /// Registers an observer; returns a token identifying the registration.
    fn subscribe(&self, observer: Arc<dyn LifecycleObserver>) -> u64;

    /// Removes the registration identified by `token`. Unknown tokens are
    /// ignored.
    fn unsubscribe(&self, token: u64);
}

/// RAII guard for a lifecycle registration; unsubscribes on drop.
pub struct LifecycleSubscription {
    source: Arc<dyn LifecycleSource>,
    token: u64,
}

impl LifecycleSubscription {
    /// Subscribes `observer` to `source` for the lifetime of the guard.
    pub fn register(
        source: Arc<dyn LifecycleSource>,
        observer: Arc<dyn LifecycleObserver>,
    ) -> Self {
        let token = source.subscribe(observer);
        log::debug!("lifecycle subscription registered with token {token}");
        Self { source, token }
    }
}

impl Drop for LifecycleSubscription {
    fn drop(&mut self) {
        self.source.unsubscribe(self.token);
        log::debug!("lifecycle subscription {} released", self.token);
    }
}
