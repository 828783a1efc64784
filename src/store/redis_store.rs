use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use log::info;
use redis::aio::MultiplexedConnection;
use redis::{Pipeline, RedisResult};

use super::RoutingStore;
use crate::error::{Error, Result};

/// Routing store backed by Redis, in the key layout Hipache reads.
pub struct RedisStore {
    conn: MultiplexedConnection,
    timeout: Duration,
}

impl RedisStore {
    /// Connects to `address` (a `redis://` URL). Every later operation is
    /// bounded by `timeout`.
    pub async fn connect(address: &str, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(address)?;
        let conn = match tokio::time::timeout(timeout, client.get_multiplexed_tokio_connection())
            .await
        {
            Ok(conn) => conn?,
            Err(_) => return Err(Error::StoreTimeout(timeout)),
        };
        info!("Connected to Redis at {}", address);
        Ok(Self { conn, timeout })
    }

    async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => Ok(res?),
            Err(_) => Err(Error::StoreTimeout(self.timeout)),
        }
    }
}

#[async_trait]
impl RoutingStore for RedisStore {
    async fn snapshot(&self, active: &str, old: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let pipe = snapshot_pipeline(active, old);
        let () = self.run(pipe.query_async(&mut conn)).await?;
        Ok(())
    }

    async fn replace_list(
        &self,
        key: &str,
        values: &[String],
        set: &str,
        member: &str,
    ) -> Result<()> {
        let mut conn = self.conn.clone();
        let pipe = replace_list_pipeline(key, values, set, member);
        let () = self.run(pipe.query_async(&mut conn)).await?;
        Ok(())
    }

    async fn difference(&self, a: &str, b: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SDIFF");
        cmd.arg(a).arg(b);
        self.run(cmd.query_async(&mut conn)).await
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("DEL");
        cmd.arg(keys);
        let _removed: i64 = self.run(cmd.query_async(&mut conn)).await?;
        Ok(())
    }
}

/// `old := old ∪ active`, then drop `active`, in one MULTI/EXEC.
fn snapshot_pipeline(active: &str, old: &str) -> Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .cmd("SUNIONSTORE")
        .arg(old)
        .arg(old)
        .arg(active)
        .ignore()
        .cmd("DEL")
        .arg(active)
        .ignore();
    pipe
}

fn replace_list_pipeline(key: &str, values: &[String], set: &str, member: &str) -> Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic().cmd("DEL").arg(key).ignore();
    if !values.is_empty() {
        pipe.cmd("RPUSH").arg(key).arg(values).ignore();
    }
    pipe.cmd("SADD").arg(set).arg(member).ignore();
    pipe
}
