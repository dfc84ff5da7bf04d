use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Default inactivity window before a session is renewed.
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: u64 = 30;

/// The environment a container tracks into.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum Environment {
    /// Production traffic.
    Live,
    /// Staging traffic.
    Stage,
}

/// Immutable per-process SDK configuration.
///
/// Constructed once by the host application before any identity or session
/// operation runs; every field is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TrackConfig {
    /// Collection domain payloads are POSTed to (e.g. `abc123.example-collect.io`).
    pub track_domain: String,
    /// Logical container/tenant name. Also namespaces the durable identifier
    /// storage keys, so two configured containers never collide on one device.
    pub container: String,
    /// Target environment.
    pub environment: Environment,
    /// SDK version tag embedded in every payload.
    pub version: String,
    /// Debug code forwarded to the collection endpoint.
    pub debug_code: String,
    /// Inactivity window, in minutes, before a session is renewed.
    pub session_timeout_minutes: u64,
}

impl TrackConfig {
    /// Creates a configuration with the default session timeout.
    #[must_use]
    pub fn new(
        track_domain: &str,
        container: &str,
        environment: Environment,
        version: &str,
        debug_code: &str,
    ) -> Self {
        Self {
            track_domain: track_domain.to_string(),
            container: container.to_string(),
            environment,
            version: version.to_string(),
            debug_code: debug_code.to_string(),
            session_timeout_minutes: DEFAULT_SESSION_TIMEOUT_MINUTES,
        }
    }

    /// Overrides the session timeout.
    #[must_use]
    pub const fn with_session_timeout_minutes(mut self, minutes: u64) -> Self {
        self.session_timeout_minutes = minutes;
        self
    }

    /// The session timeout as a [`Duration`].
    #[must_use]
    pub const fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_minutes * 60)
    }

    /// The collection endpoint URL derived from `track_domain`.
    ///
    /// A bare domain is addressed over HTTPS. A domain that already carries a
    /// scheme is used verbatim, which lets tests point at a local server.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        if self.track_domain.starts_with("http://")
            || self.track_domain.starts_with("https://")
        {
            self.track_domain.clone()
        } else {
            format!("https://{}/", self.track_domain)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_environment_renders_lowercase() {
        assert_eq!(Environment::Live.to_string(), "live");
        assert_eq!(Environment::Stage.to_string(), "stage");
        assert_eq!(Environment::from_str("stage").unwrap(), Environment::Stage);
    }

    #[test]
    fn test_endpoint_url_defaults_to_https() {
        let config =
            TrackConfig::new("abc123.collect.io", "web-demo", Environment::Live, "1.0.0", "");
        assert_eq!(config.endpoint_url(), "https://abc123.collect.io/");
    }

    #[test]
    fn test_endpoint_url_keeps_explicit_scheme() {
        let config = TrackConfig::new(
            "http://127.0.0.1:9999/collect",
            "web-demo",
            Environment::Stage,
            "1.0.0",
            "",
        );
        assert_eq!(config.endpoint_url(), "http://127.0.0.1:9999/collect");
    }

    #[test]
    fn test_session_timeout_conversion() {
        let config = TrackConfig::new("d", "c", Environment::Live, "1.0.0", "")
            .with_session_timeout_minutes(5);
        assert_eq!(config.session_timeout(), Duration::from_secs(300));
    }
}
