//! Publishing a routing table into the store in Hipache's key layout.
//!
//! Each domain is a list at `frontend:<domain>` holding the domain name
//! followed by its backend URLs. The set `activeDomains` tracks which
//! domains are live, so entries from previous passes can be found and
//! removed once their domain disappears from the table.

use log::{debug, warn};

use crate::error::Result;
use crate::store::RoutingStore;
use crate::types::RouteTable;

pub const ACTIVE_DOMAINS_KEY: &str = "activeDomains";
pub const OLD_DOMAINS_KEY: &str = "oldDomains";
pub const FRONTEND_PREFIX: &str = "frontend:";

pub fn frontend_key(domain: &str) -> String {
    format!("{}{}", FRONTEND_PREFIX, domain)
}

/// Outcome of a successful publish.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub published: usize,
    pub removed: Vec<String>,
}

/// Replaces the published routing table with `table`.
///
/// The first failing store operation aborts the publish and leaves the
/// store as it is; the next pass rewrites everything. `oldDomains` is
/// only removed once stale entries are gone, so an interrupted publish
/// keeps its snapshot for the next one to merge into.
pub async fn publish<S>(store: &S, table: &RouteTable) -> Result<PublishReport>
where
    S: RoutingStore + ?Sized,
{
    store.snapshot(ACTIVE_DOMAINS_KEY, OLD_DOMAINS_KEY).await?;

    for (domain, backends) in table {
        let mut values = Vec::with_capacity(backends.len() + 1);
        values.push(domain.clone());
        values.extend(backends.iter().cloned());

        debug!("Publishing {} -> {:?}", domain, backends);
        store
            .replace_list(&frontend_key(domain), &values, ACTIVE_DOMAINS_KEY, domain)
            .await?;
    }

    let removed = store
        .difference(OLD_DOMAINS_KEY, ACTIVE_DOMAINS_KEY)
        .await?;
    if !removed.is_empty() {
        warn!("Removing stale domains: {:?}", removed);
        let keys: Vec<String> = removed.iter().map(|d| frontend_key(d)).collect();
        store.delete(&keys).await?;
    }
    store.delete(&[OLD_DOMAINS_KEY.to_string()]).await?;

    Ok(PublishReport {
        published: table.len(),
        removed,
    })
}
