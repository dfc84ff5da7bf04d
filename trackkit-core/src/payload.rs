//! Wire models for the collection endpoint and their assembly.
//!
//! Field names in this module are a compatibility contract with the
//! collection endpoint and must not change. Assembly is deterministic for a
//! given set of inputs except for the embedded `timestamp`, which is the
//! wall clock at call time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::clock::unix_timestamp_millis;
use crate::config::{Environment, TrackConfig};
use crate::identity::{Action, IdentifierDescriptor};
use crate::session::SessionDescriptor;

/// `type` tag of the consent payload.
const CONSENT_PAYLOAD_TYPE: &str = "consent";
/// `type` tag of the event/data-submission payload.
const EVENT_PAYLOAD_TYPE: &str = "event";
/// `initiator` tag stamped on every payload.
const INITIATOR: &str = "trackkit-sdk";

/// Client signature sent in the `navigator-userAgent` field.
fn client_signature() -> String {
    format!("trackkit-core/{}", env!("CARGO_PKG_VERSION"))
}

/// Per-vendor consent status: either a boolean flag or a free-form category
/// string. Both encodings are valid on the wire and round-trip without type
/// coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum VendorStatus {
    /// Consent granted or denied outright.
    Flag(bool),
    /// A vendor-specific category, e.g. `"ncm"`.
    Category(String),
}

/// Vendor name to consent status.
pub type VendorStates = BTreeMap<String, VendorStatus>;

/// An identifier with its action tag as rendered inside payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierTag {
    /// The identifier value.
    pub id: String,
    /// `new` or `update`.
    pub action: Action,
}

impl From<&IdentifierDescriptor> for IdentifierTag {
    fn from(descriptor: &IdentifierDescriptor) -> Self {
        Self {
            id: descriptor.value.clone(),
            action: descriptor.action,
        }
    }
}

impl From<&SessionDescriptor> for IdentifierTag {
    fn from(descriptor: &SessionDescriptor) -> Self {
        Self {
            id: descriptor.id.clone(),
            action: descriptor.action,
        }
    }
}

/// The `system` block shared by both payload shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemBlock {
    /// Payload type tag.
    #[serde(rename = "type")]
    pub payload_type: String,
    /// Wall-clock assembly time, epoch milliseconds.
    pub timestamp: u64,
    /// Client signature.
    #[serde(rename = "navigator-userAgent")]
    pub navigator_user_agent: String,
    /// Initiator tag.
    pub initiator: String,
    /// Current session id.
    #[serde(rename = "sessionID")]
    pub session_id: String,
}

impl SystemBlock {
    fn assemble(payload_type: &str, session: &SessionDescriptor) -> Self {
        Self {
            payload_type: payload_type.to_string(),
            timestamp: unix_timestamp_millis(),
            navigator_user_agent: client_signature(),
            initiator: INITIATOR.to_string(),
            session_id: session.id.clone(),
        }
    }
}

/// The `configuration` block shared by both payload shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationBlock {
    /// Container/tenant name.
    pub container: String,
    /// Target environment.
    pub environment: Environment,
    /// SDK version tag.
    pub version: String,
    /// Debug code.
    pub debugcode: String,
}

impl From<&TrackConfig> for ConfigurationBlock {
    fn from(config: &TrackConfig) -> Self {
        Self {
            container: config.container.clone(),
            environment: config.environment,
            version: config.version.clone(),
            debugcode: config.debug_code.clone(),
        }
    }
}

/// Consent-state payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentPayload {
    /// System block.
    pub system: SystemBlock,
    /// Configuration block.
    pub configuration: ConfigurationBlock,
    /// Data block.
    pub data: ConsentData,
}

/// Data block of the consent payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentData {
    /// User and consent identifiers with action tags.
    pub identifier: ConsentIdentifierBlock,
    /// Vendor-consent state.
    pub consent: ConsentState,
}

/// Identifier block of the consent payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentIdentifierBlock {
    /// The durable user identifier.
    pub user: IdentifierTag,
    /// The durable consent identifier.
    pub consent: IdentifierTag,
}

/// Vendor-consent state carried by the consent payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentState {
    /// When the consent state last changed, epoch milliseconds.
    pub lastupdate: u64,
    /// Free-form consent metadata.
    pub data: BTreeMap<String, String>,
    /// Current status per vendor.
    pub vendors: VendorStates,
    /// Vendors whose status changed in this update.
    #[serde(rename = "vendorsChanged")]
    pub vendors_changed: VendorStates,
}

impl ConsentPayload {
    /// Assembles a consent payload from resolved identity/session state and
    /// the caller-supplied vendor-consent maps.
    #[must_use]
    pub fn assemble(
        config: &TrackConfig,
        user: &IdentifierDescriptor,
        consent: &IdentifierDescriptor,
        session: &SessionDescriptor,
        vendors: VendorStates,
        vendors_changed: VendorStates,
    ) -> Self {
        let system = SystemBlock::assemble(CONSENT_PAYLOAD_TYPE, session);
        let lastupdate = system.timestamp;
        Self {
            system,
            configuration: config.into(),
            data: ConsentData {
                identifier: ConsentIdentifierBlock {
                    user: user.into(),
                    consent: consent.into(),
                },
                consent: ConsentState {
                    lastupdate,
                    data: BTreeMap::new(),
                    vendors,
                    vendors_changed,
                },
            },
        }
    }
}

/// Event/data-submission payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    /// System block.
    pub system: SystemBlock,
    /// Snapshot of vendor-consent status at submission time.
    pub consent: BTreeMap<String, VendorEntry>,
    /// Configuration block.
    pub configuration: ConfigurationBlock,
    /// Data block.
    pub data: EventData,
}

/// One vendor's status inside the event payload's consent snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorEntry {
    /// Boolean flag or category string.
    pub status: VendorStatus,
}

/// Data block of the event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    /// User and session identifiers with action tags.
    pub identifier: EventIdentifierBlock,
    /// Business variables supplied by the caller.
    pub variables: EventVariables,
    /// Server-side enrichment directives, keyed by directive name.
    pub enrichment: BTreeMap<String, Enrichment>,
}

/// Identifier block of the event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventIdentifierBlock {
    /// The durable user identifier.
    pub user: IdentifierTag,
    /// The current session.
    pub session: IdentifierTag,
}

/// Business variables carried by the event payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventVariables {
    /// Current document/screen location.
    pub document_location_href: String,
    /// Facebook browser id, when known.
    pub fb_browser_id: String,
    /// Commands pushed ahead of this submission.
    pub jtspushedcommands: Vec<String>,
    /// Product ids referenced by the event.
    pub product_id: Vec<String>,
}

/// A server-side enrichment directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    /// Directive arguments; values are arbitrary JSON.
    pub arguments: BTreeMap<String, serde_json::Value>,
    /// Variables the directive should populate.
    pub variables: Vec<String>,
}

impl EventPayload {
    /// Assembles an event payload from resolved identity/session state, the
    /// consent snapshot, and the caller-supplied business fields.
    #[must_use]
    pub fn assemble(
        config: &TrackConfig,
        user: &IdentifierDescriptor,
        session: &SessionDescriptor,
        vendors: &VendorStates,
        variables: EventVariables,
        enrichment: BTreeMap<String, Enrichment>,
    ) -> Self {
        let consent = vendors
            .iter()
            .map(|(vendor, status)| {
                (
                    vendor.clone(),
                    VendorEntry {
                        status: status.clone(),
                    },
                )
            })
            .collect();
        Self {
            system: SystemBlock::assemble(EVENT_PAYLOAD_TYPE, session),
            consent,
            configuration: config.into(),
            data: EventData {
                identifier: EventIdentifierBlock {
                    user: user.into(),
                    session: session.into(),
                },
                variables,
                enrichment,
            },
        }
    }
}
