//! The session lifecycle manager: continuation vs renewal under an
//! inactivity timeout, driven by explicit calls and app lifecycle signals.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::clock::Clock;
use crate::identity::Action;
use crate::lifecycle::AppLifecycleEvent;

/// The current session id together with its [`Action`] tag.
///
/// `action` is [`Action::New`] when the id was generated by the call that
/// produced this descriptor (a renewal), [`Action::Update`] when an existing
/// session was resumed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct SessionDescriptor {
    /// The session id (a lowercase canonical UUID string).
    pub id: String,
    /// Renewal (`new`) or resumption (`update`).
    pub action: Action,
}

/// Owns the current session and the activity clock.
///
/// Sessions are held in process memory only; a fresh process starts with no
/// session until the first [`SessionManager::start_or_resume`]. Only this type
/// mutates the session id and the last-active timestamp.
pub struct SessionManager {
    current_session: Option<String>,
    last_active: Duration,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    /// Creates a manager with no session. The activity clock starts at the
    /// current time.
    pub fn new(timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        let last_active = clock.now();
        Self {
            current_session: None,
            last_active,
            timeout,
            clock,
        }
    }

    /// Returns the current session, renewing it first if none exists or the
    /// inactivity timeout has elapsed.
    ///
    /// Every call moves the activity clock to now, regardless of which branch
    /// is taken.
    pub fn start_or_resume(&mut self) -> SessionDescriptor {
        let now = self.clock.now();
        let expired = now.saturating_sub(self.last_active) > self.timeout;

        let descriptor = match &self.current_session {
            Some(id) if !expired => {
                log::debug!("session resumed with id {id}");
                SessionDescriptor {
                    id: id.clone(),
                    action: Action::Update,
                }
            }
            _ => {
                let id = Uuid::new_v4().to_string();
                log::info!("new session started with id {id}");
                self.current_session = Some(id.clone());
                SessionDescriptor {
                    id,
                    action: Action::New,
                }
            }
        };

        self.last_active = now;
        descriptor
    }

    /// Ends the current session. Idempotent.
    pub fn end_session(&mut self) {
        if let Some(id) = self.current_session.take() {
            log::info!("session ended with id {id}");
        }
    }

    /// Routes an application lifecycle signal to the matching handler.
    pub fn handle_event(&mut self, event: AppLifecycleEvent) {
        match event {
            AppLifecycleEvent::EnterBackground => self.on_background(),
            AppLifecycleEvent::EnterForeground => self.on_foreground(),
            AppLifecycleEvent::Terminate => self.on_terminate(),
        }
    }

    /// Background transition: records the moment activity stopped so that
    /// backgrounded time counts toward the timeout window checked on the next
    /// foreground/resume. Does not end or renew the session.
    pub fn on_background(&mut self) {
        self.last_active = self.clock.now();
        log::debug!("app entered background, activity clock updated");
    }

    /// Foreground transition: runs the timeout check immediately so the next
    /// explicit resolution sees correct continuity. The resulting descriptor
    /// is only logged.
    pub fn on_foreground(&mut self) {
        let descriptor = self.start_or_resume();
        log::debug!(
            "app entering foreground, session {} ({})",
            descriptor.id,
            descriptor.action
        );
    }

    /// Terminate signal: ends the session.
    pub fn on_terminate(&mut self) {
        self.end_session();
    }

    #[cfg(test)]
    pub(crate) const fn last_active(&self) -> Duration {
        self.last_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const TIMEOUT: Duration = Duration::from_secs(30 * 60);

    fn manager_at(start: Duration) -> (SessionManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start));
        let manager =
            SessionManager::new(TIMEOUT, Arc::clone(&clock) as Arc<dyn Clock>);
        (manager, clock)
    }

    #[test]
    fn test_first_call_starts_new_session() {
        let (mut manager, _clock) = manager_at(Duration::from_secs(1_000));
        let descriptor = manager.start_or_resume();
        assert_eq!(descriptor.action, Action::New);
        assert!(!descriptor.id.is_empty());
    }

    #[test]
    fn test_resume_within_timeout_keeps_id() {
        let (mut manager, clock) = manager_at(Duration::ZERO);
        let first = manager.start_or_resume();

        clock.advance(Duration::from_secs(300));
        let second = manager.start_or_resume();
        assert_eq!(second.id, first.id);
        assert_eq!(second.action, Action::Update);
    }

    #[test]
    fn test_renewal_after_timeout_changes_id() {
        let (mut manager, clock) = manager_at(Duration::ZERO);
        let first = manager.start_or_resume();

        clock.advance(TIMEOUT + Duration::from_secs(1));
        let second = manager.start_or_resume();
        assert_ne!(second.id, first.id);
        assert_eq!(second.action, Action::New);
    }

    #[test]
    fn test_elapsed_time_exactly_at_timeout_resumes() {
        let (mut manager, clock) = manager_at(Duration::ZERO);
        let first = manager.start_or_resume();

        clock.advance(TIMEOUT);
        let second = manager.start_or_resume();
        assert_eq!(second.id, first.id);
        assert_eq!(second.action, Action::Update);
    }

    #[test]
    fn test_every_call_updates_activity_clock() {
        let (mut manager, clock) = manager_at(Duration::ZERO);

        manager.start_or_resume();
        assert_eq!(manager.last_active(), Duration::ZERO);

        clock.set(Duration::from_secs(10));
        manager.start_or_resume(); // resumption branch
        assert_eq!(manager.last_active(), Duration::from_secs(10));

        clock.set(Duration::from_secs(10) + TIMEOUT + Duration::from_secs(1));
        manager.start_or_resume(); // renewal branch
        assert_eq!(
            manager.last_active(),
            Duration::from_secs(10) + TIMEOUT + Duration::from_secs(1)
        );
    }

    #[test]
    fn test_background_signal_restarts_timeout_window() {
        let (mut manager, clock) = manager_at(Duration::ZERO);
        let first = manager.start_or_resume();

        // Background at t=100s resets the baseline; at t=110s only 10s have
        // elapsed since the signal, so the session resumes.
        clock.set(Duration::from_secs(100));
        manager.handle_event(AppLifecycleEvent::EnterBackground);
        clock.set(Duration::from_secs(110));

        let second = manager.start_or_resume();
        assert_eq!(second.id, first.id);
        assert_eq!(second.action, Action::Update);
    }

    #[test]
    fn test_background_does_not_end_session() {
        let (mut manager, clock) = manager_at(Duration::ZERO);
        let first = manager.start_or_resume();

        manager.on_background();
        clock.advance(Duration::from_secs(1));
        assert_eq!(manager.start_or_resume().id, first.id);
    }

    #[test]
    fn test_foreground_after_timeout_renews() {
        let (mut manager, clock) = manager_at(Duration::ZERO);
        let first = manager.start_or_resume();

        clock.advance(TIMEOUT + Duration::from_secs(1));
        manager.handle_event(AppLifecycleEvent::EnterForeground);

        let second = manager.start_or_resume();
        assert_ne!(second.id, first.id);
        // The foreground check already renewed; the explicit call resumes.
        assert_eq!(second.action, Action::Update);
    }

    #[test]
    fn test_foreground_within_timeout_resumes() {
        let (mut manager, clock) = manager_at(Duration::ZERO);
        let first = manager.start_or_resume();

        clock.advance(Duration::from_secs(60));
        manager.handle_event(AppLifecycleEvent::EnterForeground);

        let second = manager.start_or_resume();
        assert_eq!(second.id, first.id);
        assert_eq!(second.action, Action::Update);
    }

    #[test]
    fn test_terminate_forces_new_session_regardless_of_elapsed_time() {
        let (mut manager, clock) = manager_at(Duration::ZERO);
        let first = manager.start_or_resume();

        clock.advance(Duration::from_secs(1));
        manager.handle_event(AppLifecycleEvent::Terminate);

        let second = manager.start_or_resume();
        assert_ne!(second.id, first.id);
        assert_eq!(second.action, Action::New);
    }

    #[test]
    fn test_end_session_is_idempotent() {
        let (mut manager, _clock) = manager_at(Duration::ZERO);
        manager.start_or_resume();
        manager.end_session();
        manager.end_session();
        assert_eq!(manager.start_or_resume().action, Action::New);
    }
}
