//! Route aggregation: bindings + live containers -> routing table.

use std::net::IpAddr;

use crate::types::{Binding, Container, RouteTable};

/// Builds the routing table for one pass.
///
/// Bindings whose container is not running contribute nothing, and a domain
/// without any backend is left out entirely. Repeated bindings produce
/// repeated URLs.
pub fn aggregate(bindings: &[Binding], containers: &[Container]) -> RouteTable {
    let mut table = RouteTable::new();
    for binding in bindings {
        for container in containers.iter().filter(|c| c.name == binding.container) {
            table
                .entry(binding.domain.clone())
                .or_default()
                .push(backend_url(&container.address, binding.port));
        }
    }
    table
}

pub fn backend_url(address: &str, port: u16) -> String {
    match address.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => format!("http://[{}]:{}/", address, port),
        _ => format!("http://{}:{}/", address, port),
    }
}
