use crate::error::Result;
use async_trait::async_trait;

pub mod redis_store;
pub use redis_store::RedisStore;

#[cfg(test)]
pub mod memory;

/// The store operations a publishing pass needs. Grouped operations must be
/// applied atomically: a reader never observes part of a group.
#[async_trait]
pub trait RoutingStore: Send + Sync {
    /// Merges the set `active` into the set `old` and removes `active`.
    /// When `old` does not exist this is a rename, and when `active` does
    /// not exist either it is a no-op.
    async fn snapshot(&self, active: &str, old: &str) -> Result<()>;

    /// Replaces the list at `key` with `values` and adds `member` to the
    /// set `set`, as one group.
    async fn replace_list(&self, key: &str, values: &[String], set: &str, member: &str)
        -> Result<()>;

    /// Members of set `a` that are not in set `b`.
    async fn difference(&self, a: &str, b: &str) -> Result<Vec<String>>;

    async fn delete(&self, keys: &[String]) -> Result<()>;
}
