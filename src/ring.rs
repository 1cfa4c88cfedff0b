use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::codec::{Value, ValueCodec};
use crate::conf::RingOptions;
use crate::error::RingError;
use crate::hash::HashRing;
use crate::node::RingNode;
use crate::pool::{PooledConn, ShardPool};

/// Longest slice of an encoded value reproduced in error messages; the
/// rest is elided so errors stay bounded.
const PREVIEW_MAX: usize = 64;

/// A client-side sharded view over multiple backend nodes.
///
/// Construction parses every address, builds the consistent-hash ring and
/// one connection pool per shard, and selects the value codec; any
/// malformed address aborts the whole build. Ring and shard table are
/// immutable afterwards, so per-operation routing only takes the read
/// lock that guards against concurrent [`Ring::close`].
pub struct Ring {
    hash: HashRing,
    shards: RwLock<HashMap<String, Arc<ShardPool>>>,
    codec: Box<dyn ValueCodec>,
}

impl Ring {
    /// Build a ring from validated options. No network I/O happens here;
    /// connections are dialed lazily on first use.
    pub fn new(mut opt: RingOptions) -> Result<Ring, RingError> {
        opt.normalize();

        let mut nodes = Vec::with_capacity(opt.addrs.len());
        for raw in &opt.addrs {
            nodes.push(RingNode::parse(raw)?);
        }

        let weights: HashMap<String, usize> = nodes
            .iter()
            .filter(|n| n.weight > 0)
            .map(|n| (n.addr.clone(), n.weight))
            .collect();
        let hash = if weights.is_empty() {
            HashRing::new(nodes.iter().map(|n| n.addr.as_str()))
        } else if weights.len() == nodes.len() {
            HashRing::with_weights(&weights)
        } else {
            // Weighting is ring-wide; a partially weighted ring would
            // leave the unweighted shards unreachable.
            return Err(RingError::MixedWeights);
        };

        let mut shards = HashMap::with_capacity(nodes.len());
        for node in &nodes {
            let pool = ShardPool::new(node, &opt)?;
            debug!(
                addr = %node.addr,
                server = %node.server,
                database = node.database,
                weight = node.weight,
                "added shard"
            );
            shards.insert(node.addr.clone(), Arc::new(pool));
        }
        info!(shards = shards.len(), codec = ?opt.codec, "built ring");

        Ok(Ring {
            hash,
            shards: RwLock::new(shards),
            codec: opt.codec.build(),
        })
    }

    /// Resolve a key to its shard and check a connection out of that
    /// shard's pool. The read lock covers only the table lookup, not the
    /// checkout itself.
    async fn conn_for(&self, key: &str) -> Result<PooledConn, RingError> {
        let pool = {
            let shards = self.shards.read().await;
            let shard = self
                .hash
                .resolve(key)
                .ok_or_else(|| RingError::Unroutable(key.to_string()))?;
            shards
                .get(shard)
                .ok_or_else(|| RingError::Unroutable(key.to_string()))?
                .clone()
        };
        pool.acquire().await
    }

    /// Fetch a key. A key the backend does not know yields empty bytes,
    /// not an error; present values pass through the codec.
    pub async fn get(&self, key: &str) -> Result<Bytes, RingError> {
        let mut conn = self.conn_for(key).await?;
        let data: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn.conn)
            .await
            .map_err(|e| RingError::Backend {
                op: "get",
                key: key.to_string(),
                source: e,
            })?;
        match data {
            Some(raw) => self.codec.decode(Bytes::from(raw)),
            None => Ok(Bytes::new()),
        }
    }

    /// Store a value, encoded by the ring's codec. `expiry_secs > 0`
    /// issues SETEX, otherwise a plain SET.
    pub async fn set(
        &self,
        key: &str,
        value: impl Into<Value>,
        expiry_secs: u64,
    ) -> Result<(), RingError> {
        let data = self.codec.encode(value.into())?;
        let mut conn = self.conn_for(key).await?;
        let stored: Result<(), redis::RedisError> = if expiry_secs > 0 {
            redis::cmd("SETEX")
                .arg(key)
                .arg(expiry_secs)
                .arg(data.as_ref())
                .query_async(&mut conn.conn)
                .await
        } else {
            redis::cmd("SET")
                .arg(key)
                .arg(data.as_ref())
                .query_async(&mut conn.conn)
                .await
        };
        stored.map_err(|e| RingError::SetBackend {
            key: key.to_string(),
            preview: preview(&data),
            source: e,
        })
    }

    pub async fn exists(&self, key: &str) -> Result<bool, RingError> {
        let mut conn = self.conn_for(key).await?;
        let found: bool = redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut conn.conn)
            .await
            .map_err(|e| RingError::Backend {
                op: "exists",
                key: key.to_string(),
                source: e,
            })?;
        Ok(found)
    }

    pub async fn delete(&self, key: &str) -> Result<(), RingError> {
        let mut conn = self.conn_for(key).await?;
        let _: () = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn.conn)
            .await
            .map_err(|e| RingError::Backend {
                op: "del",
                key: key.to_string(),
                source: e,
            })?;
        Ok(())
    }

    /// Atomically add one to a key; see [`Ring::incr_by`].
    pub async fn incr(
        &self,
        key: &str,
        expiry_secs: u64,
    ) -> Result<i64, RingError> {
        self.counter("INCR", key, None, expiry_secs).await
    }

    /// Atomically add `amount` to a key and return the new value. When
    /// `expiry_secs > 0` a best-effort EXPIRE follows; its failure is
    /// logged but never overrides the counter result.
    pub async fn incr_by(
        &self,
        key: &str,
        amount: i64,
        expiry_secs: u64,
    ) -> Result<i64, RingError> {
        self.counter("INCRBY", key, Some(amount), expiry_secs).await
    }

    /// Atomically subtract one from a key; see [`Ring::incr_by`].
    pub async fn decr(
        &self,
        key: &str,
        expiry_secs: u64,
    ) -> Result<i64, RingError> {
        self.counter("DECR", key, None, expiry_secs).await
    }

    /// Atomically subtract `amount` from a key; same expiry contract as
    /// [`Ring::incr_by`].
    pub async fn decr_by(
        &self,
        key: &str,
        amount: i64,
        expiry_secs: u64,
    ) -> Result<i64, RingError> {
        self.counter("DECRBY", key, Some(amount), expiry_secs).await
    }

    async fn counter(
        &self,
        op: &'static str,
        key: &str,
        amount: Option<i64>,
        expiry_secs: u64,
    ) -> Result<i64, RingError> {
        let mut conn = self.conn_for(key).await?;
        let mut cmd = redis::cmd(op);
        cmd.arg(key);
        if let Some(amount) = amount {
            cmd.arg(amount);
        }
        let value: i64 = cmd
            .query_async(&mut conn.conn)
            .await
            .map_err(|e| RingError::Backend {
                op,
                key: key.to_string(),
                source: e,
            })?;

        if expiry_secs > 0 {
            let refreshed: Result<i64, redis::RedisError> =
                redis::cmd("EXPIRE")
                    .arg(key)
                    .arg(expiry_secs)
                    .query_async(&mut conn.conn)
                    .await;
            if let Err(e) = refreshed {
                // The counter already moved; the caller gets its value and
                // only the observability channel sees the expiry failure.
                warn!(key, op, error = %e, "failed to set expiry");
            }
        }
        Ok(value)
    }

    /// Set or refresh a key's time-to-live. `true` when the backend
    /// accepted the command.
    pub async fn expire(
        &self,
        key: &str,
        expiry_secs: u64,
    ) -> Result<bool, RingError> {
        let mut conn = self.conn_for(key).await?;
        let _: i64 = redis::cmd("EXPIRE")
            .arg(key)
            .arg(expiry_secs)
            .query_async(&mut conn.conn)
            .await
            .map_err(|e| RingError::Backend {
                op: "expire",
                key: key.to_string(),
                source: e,
            })?;
        Ok(true)
    }

    /// Close every shard's pool. Teardown is terminal: later operations
    /// fail with a pool-closed error.
    pub async fn close(&self) -> Result<(), RingError> {
        let shards = self.shards.write().await;
        for (addr, pool) in shards.iter() {
            pool.close();
            debug!(addr = %addr, "closed shard pool");
        }
        Ok(())
    }
}

fn preview(data: &[u8]) -> String {
    let shown = &data[..data.len().min(PREVIEW_MAX)];
    let mut out = String::from_utf8_lossy(shown).into_owned();
    if data.len() > PREVIEW_MAX {
        out.push_str("...");
    }
    out
}
