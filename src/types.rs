//! Data structures shared across the sync daemon.
//!
//! A [`Binding`] comes from the static configuration, a [`Container`] is a
//! snapshot taken from the runtime at the start of a pass, and a
//! [`RouteTable`] is what a pass publishes.  None of these are mutated
//! after construction; each pass builds fresh values.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A configured rule routing `domain` to `port` on the container named
/// `container`.
///
/// Accepts both lowercase keys and the capitalised keys used by older
/// Hipache updater configs (`Domain`, `Container`, `Port`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(alias = "Domain")]
    pub domain: String,
    #[serde(alias = "Container")]
    pub container: String,
    #[serde(alias = "Port")]
    pub port: u16,
}

/// A running container as seen by the inventory resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// Container name without the leading `/`.
    pub name: String,
    /// Primary IPv4 or IPv6 address.
    pub address: String,
}

impl Container {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Domain to backend URLs. Domains iterate in sorted order.
pub type RouteTable = BTreeMap<String, Vec<String>>;

/// A notification from the container runtime. Its contents are only used
/// for logging; every event triggers a full pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeEvent {
    pub kind: String,
    pub action: String,
    pub actor: String,
}

impl fmt::Display for RuntimeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind, self.action, self.actor)
    }
}
