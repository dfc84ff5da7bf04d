//! The tracker context object tying identity, session, assembly and
//! transport together, plus the optional process-shared instance.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::clock::{Clock, SystemClock};
use crate::config::TrackConfig;
use crate::error::TrackKitError;
use crate::identity::IdentityResolver;
use crate::lifecycle::{
    AppLifecycleEvent, LifecycleObserver, LifecycleSource, LifecycleSubscription,
};
use crate::payload::{
    ConsentPayload, Enrichment, EventPayload, EventVariables, VendorStates,
};
use crate::session::{SessionDescriptor, SessionManager};
use crate::store::IdentifierStore;
use crate::transport::Transport;

/// The TrackKit context object.
///
/// Owns the immutable configuration, the identity resolver, the single
/// logical session, and the transport. Hosts construct one instance per
/// process (or use [`configure`]/[`shared`]); tests construct isolated
/// instances with a [`crate::ManualClock`].
pub struct Tracker {
    config: TrackConfig,
    identity: IdentityResolver,
    session: Mutex<SessionManager>,
    transport: Transport,
}

impl Tracker {
    /// Creates a tracker driven by the wall clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured collection domain does not form a
    /// valid endpoint URL.
    pub fn new(
        config: TrackConfig,
        store: Arc<dyn IdentifierStore>,
    ) -> Result<Arc<Self>, TrackKitError> {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Creates a tracker with an injected clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured collection domain does not form a
    /// valid endpoint URL.
    pub fn with_clock(
        config: TrackConfig,
        store: Arc<dyn IdentifierStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Arc<Self>, TrackKitError> {
        let transport = Transport::new(&config.endpoint_url())?;
        let identity = IdentityResolver::new(store, &config.container);
        let session = Mutex::new(SessionManager::new(config.session_timeout(), clock));
        Ok(Arc::new(Self {
            config,
            identity,
            session,
            transport,
        }))
    }

    /// The configuration this tracker was constructed with.
    #[must_use]
    pub const fn config(&self) -> &TrackConfig {
        &self.config
    }

    /// Returns the current session descriptor, renewing the session first if
    /// none exists or the inactivity timeout elapsed.
    pub fn start_or_resume_session(&self) -> SessionDescriptor {
        self.lock_session().start_or_resume()
    }

    /// Ends the current session. Idempotent.
    pub fn end_session(&self) {
        self.lock_session().end_session();
    }

    /// Delivers an application lifecycle signal.
    pub fn notify_lifecycle(&self, event: AppLifecycleEvent) {
        self.lock_session().handle_event(event);
    }

    /// Registers this tracker with a host lifecycle source. Dropping the
    /// returned subscription unsubscribes it.
    #[must_use]
    pub fn attach_lifecycle(
        self: Arc<Self>,
        source: Arc<dyn LifecycleSource>,
    ) -> LifecycleSubscription {
        LifecycleSubscription::register(source, self as Arc<dyn LifecycleObserver>)
    }

    /// Assembles and delivers a consent-state payload.
    ///
    /// Resolves the user and consent identifiers and the current session,
    /// then performs a single delivery attempt.
    ///
    /// # Errors
    ///
    /// Surfaces transport errors unchanged; the payload is not retried or
    /// queued.
    pub async fn send_consent(
        &self,
        vendors: VendorStates,
        vendors_changed: VendorStates,
    ) -> Result<(), TrackKitError> {
        let user = self.identity.resolve_user();
        let consent = self.identity.resolve_consent();
        let session = self.start_or_resume_session();
        let payload = ConsentPayload::assemble(
            &self.config,
            &user,
            &consent,
            &session,
            vendors,
            vendors_changed,
        );
        self.transport.send(&payload).await?;
        Ok(())
    }

    /// Assembles and delivers an event/data-submission payload.
    ///
    /// # Errors
    ///
    /// Surfaces transport errors unchanged; the payload is not retried or
    /// queued.
    pub async fn send_event(
        &self,
        vendors: VendorStates,
        variables: EventVariables,
        enrichment: BTreeMap<String, Enrichment>,
    ) -> Result<(), TrackKitError> {
        let user = self.identity.resolve_user();
        let session = self.start_or_resume_session();
        let payload = EventPayload::assemble(
            &self.config,
            &user,
            &session,
            &vendors,
            variables,
            enrichment,
        );
        self.transport.send(&payload).await?;
        Ok(())
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, SessionManager> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LifecycleObserver for Tracker {
    fn on_lifecycle_event(&self, event: AppLifecycleEvent) {
        self.notify_lifecycle(event);
    }
}

/// The process-shared tracker set by [`configure`].
static SHARED_TRACKER: OnceLock<Arc<Tracker>> = OnceLock::new();

/// Initializes the process-shared tracker. Must be called exactly once,
/// before [`shared`] is first used; a second call warns and keeps the
/// original configuration.
///
/// # Errors
///
/// Returns an error if the configured collection domain does not form a
/// valid endpoint URL.
pub fn configure(
    config: TrackConfig,
    store: Arc<dyn IdentifierStore>,
) -> Result<(), TrackKitError> {
    let tracker = Tracker::new(config, store)?;
    if SHARED_TRACKER.set(tracker).is_err() {
        log::warn!("trackkit already configured, keeping original configuration");
    }
    Ok(())
}

/// Returns the process-shared tracker.
///
/// # Errors
///
/// Returns [`TrackKitError::ConfigurationMissing`] if [`configure`] has not
/// run.
pub fn shared() -> Result<Arc<Tracker>, TrackKitError> {
    SHARED_TRACKER
        .get()
        .cloned()
        .ok_or(TrackKitError::ConfigurationMissing)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::Environment;
    use crate::identity::Action;
    use crate::store::MemoryIdentifierStore;

    fn test_tracker(clock: Arc<ManualClock>) -> Arc<Tracker> {
        let config = TrackConfig::new(
            "abc123.collect.io",
            "web-demo",
            Environment::Stage,
            "1.0.0",
            "",
        );
        Tracker::with_clock(
            config,
            Arc::new(MemoryIdentifierStore::new()),
            clock as Arc<dyn Clock>,
        )
        .expect("tracker")
    }

    #[test]
    fn test_invalid_domain_fails_construction() {
        let config =
            TrackConfig::new("http://", "web-demo", Environment::Stage, "1.0.0", "");
        assert!(Tracker::new(config, Arc::new(MemoryIdentifierStore::new())).is_err());
    }

    #[test]
    fn test_session_continuity_through_tracker() {
        let clock = Arc::new(ManualClock::new(Duration::ZERO));
        let tracker = test_tracker(Arc::clone(&clock));

        let first = tracker.start_or_resume_session();
        assert_eq!(first.action, Action::New);

        clock.advance(Duration::from_secs(300));
        let second = tracker.start_or_resume_session();
        assert_eq!(second.id, first.id);
        assert_eq!(second.action, Action::Update);
    }

    #[test]
    fn test_terminate_signal_ends_session() {
        let clock = Arc::new(ManualClock::new(Duration::ZERO));
        let tracker = test_tracker(clock);

        let first = tracker.start_or_resume_session();
        tracker.notify_lifecycle(AppLifecycleEvent::Terminate);

        let second = tracker.start_or_resume_session();
        assert_ne!(second.id, first.id);
        assert_eq!(second.action, Action::New);
    }

    #[test]
    fn test_shared_before_configure_is_configuration_missing() {
        // The shared instance is process-global; this test only asserts the
        // error shape before any configure call in this process's tests.
        if SHARED_TRACKER.get().is_none() {
            match shared() {
                Err(TrackKitError::ConfigurationMissing) => {}
                Err(err) => panic!("unexpected error: {err}"),
                Ok(_) => panic!("expected error"),
            }
        }
    }
}
