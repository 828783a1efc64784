//! In-memory routing store for tests. Follows Redis semantics for the
//! operations used (empty sets and lists disappear) and can be told to fail
//! a given operation.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use redis::{ErrorKind, RedisError};

use super::RoutingStore;
use crate::error::{Error, Result};

#[derive(Default)]
struct Inner {
    lists: HashMap<String, Vec<String>>,
    sets: HashMap<String, BTreeSet<String>>,
    /// Operation name and how many successful calls remain before it fails.
    fail_on: Option<(&'static str, usize)>,
    ops: Vec<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the call to `op` after `after` successful ones fail.
    pub fn fail_on(&self, op: &'static str, after: usize) {
        self.inner.lock().unwrap().fail_on = Some((op, after));
    }

    pub fn clear_failure(&self) {
        self.inner.lock().unwrap().fail_on = None;
    }

    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        self.inner.lock().unwrap().lists.get(key).cloned()
    }

    pub fn set(&self, key: &str) -> Option<BTreeSet<String>> {
        self.inner.lock().unwrap().sets.get(key).cloned()
    }

    pub fn set_members(&self, key: &str) -> Vec<String> {
        self.set(key).unwrap_or_default().into_iter().collect()
    }

    pub fn seed_list(&self, key: &str, values: &[&str]) {
        let values = values.iter().map(|v| v.to_string()).collect();
        self.inner.lock().unwrap().lists.insert(key.to_string(), values);
    }

    pub fn seed_set(&self, key: &str, members: &[&str]) {
        let members = members.iter().map(|m| m.to_string()).collect();
        self.inner.lock().unwrap().sets.insert(key.to_string(), members);
    }

    /// Every operation attempted so far, as `"<op> <first key>"`.
    pub fn ops(&self) -> Vec<String> {
        self.inner.lock().unwrap().ops.clone()
    }

    fn record(inner: &mut Inner, op: &'static str, key: &str) -> Result<()> {
        inner.ops.push(format!("{} {}", op, key));
        if let Some((name, remaining)) = inner.fail_on.as_mut() {
            if *name == op {
                if *remaining == 0 {
                    return Err(Error::Store(RedisError::from((
                        ErrorKind::IoError,
                        "injected failure",
                    ))));
                }
                *remaining -= 1;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RoutingStore for MemoryStore {
    async fn snapshot(&self, active: &str, old: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "snapshot", active)?;
        if let Some(members) = inner.sets.remove(active) {
            inner.sets.entry(old.to_string()).or_default().extend(members);
        }
        Ok(())
    }

    async fn replace_list(
        &self,
        key: &str,
        values: &[String],
        set: &str,
        member: &str,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "replace_list", key)?;
        inner.lists.remove(key);
        if !values.is_empty() {
            inner.lists.insert(key.to_string(), values.to_vec());
        }
        inner
            .sets
            .entry(set.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn difference(&self, a: &str, b: &str) -> Result<Vec<String>> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "difference", a)?;
        let empty = BTreeSet::new();
        let left = inner.sets.get(a).unwrap_or(&empty);
        let right = inner.sets.get(b).unwrap_or(&empty);
        Ok(left.difference(right).cloned().collect())
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let first = keys.first().map(String::as_str).unwrap_or("");
        Self::record(&mut inner, "delete", first)?;
        for key in keys {
            inner.lists.remove(key);
            inner.sets.remove(key);
        }
        Ok(())
    }
}
