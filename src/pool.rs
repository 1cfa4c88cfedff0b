use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use mobc::{Manager, Pool};
use redis::aio::MultiplexedConnection;
use tracing::{debug, warn};

use crate::conf::RingOptions;
use crate::error::RingError;
use crate::node::RingNode;

/// Connections idle at least this long are PINGed before being handed out.
const PROBE_AFTER: Duration = Duration::from_secs(60);

/// Database indexes outside this range mean "no SELECT issued".
const DATABASE_RANGE: std::ops::Range<i64> = 0..16;

/// A live connection to one shard plus the moment it last left the pool,
/// so the manager knows when a liveness probe is due.
pub struct ShardConn {
    pub conn: MultiplexedConnection,
    checked_at: Instant,
}

/// Establishes connections to a single backend node in three stages:
/// dial, AUTH when a password is configured, SELECT when the database
/// index is in range. Each stage fails with its own error variant and a
/// half-open connection is dropped, never handed out.
pub struct RedisManager {
    client: redis::Client,
    server: String,
    password: String,
    database: i64,
}

impl RedisManager {
    pub fn new(node: &RingNode) -> Result<Self, RingError> {
        let client = redis::Client::open(format!("redis://{}", node.server))
            .map_err(|e| RingError::Connect {
                server: node.server.clone(),
                source: e,
            })?;
        Ok(Self {
            client,
            server: node.server.clone(),
            password: node.password.clone(),
            database: node.database,
        })
    }
}

#[async_trait::async_trait]
impl Manager for RedisManager {
    type Connection = ShardConn;
    type Error = RingError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                warn!(server = %self.server, error = %e, "dial failed");
                RingError::Connect {
                    server: self.server.clone(),
                    source: e,
                }
            })?;

        if !self.password.is_empty() {
            let authed: Result<(), redis::RedisError> = redis::cmd("AUTH")
                .arg(&self.password)
                .query_async(&mut conn)
                .await;
            if let Err(e) = authed {
                warn!(server = %self.server, error = %e, "auth failed");
                return Err(RingError::Auth {
                    server: self.server.clone(),
                    source: e,
                });
            }
        }

        if DATABASE_RANGE.contains(&self.database) {
            let selected: Result<(), redis::RedisError> = redis::cmd("SELECT")
                .arg(self.database)
                .query_async(&mut conn)
                .await;
            if let Err(e) = selected {
                warn!(
                    server = %self.server,
                    database = self.database,
                    error = %e,
                    "select failed"
                );
                return Err(RingError::Select {
                    server: self.server.clone(),
                    database: self.database,
                    source: e,
                });
            }
        }

        debug!(server = %self.server, "established connection");
        Ok(ShardConn {
            conn,
            checked_at: Instant::now(),
        })
    }

    async fn check(
        &self,
        mut conn: Self::Connection,
    ) -> Result<Self::Connection, Self::Error> {
        if conn.checked_at.elapsed() >= PROBE_AFTER {
            let pong: Result<String, redis::RedisError> =
                redis::cmd("PING").query_async(&mut conn.conn).await;
            if let Err(e) = pong {
                debug!(server = %self.server, error = %e, "probe failed");
                return Err(RingError::Connect {
                    server: self.server.clone(),
                    source: e,
                });
            }
        }
        conn.checked_at = Instant::now();
        Ok(conn)
    }
}

/// A checked-out connection; returns to its pool on drop.
pub type PooledConn = mobc::Connection<RedisManager>;

/// Bounded pool of connections to one shard. Connections are established
/// lazily on first acquire; `close` is terminal.
pub struct ShardPool {
    pool: Pool<RedisManager>,
    closed: AtomicBool,
}

impl ShardPool {
    pub fn new(node: &RingNode, opt: &RingOptions) -> Result<Self, RingError> {
        let manager = RedisManager::new(node)?;
        let pool = Pool::builder()
            .max_open(opt.max_active)
            .max_idle(opt.max_idle)
            .max_idle_lifetime(Some(opt.idle_timeout))
            .build(manager);
        Ok(Self {
            pool,
            closed: AtomicBool::new(false),
        })
    }

    pub async fn acquire(&self) -> Result<PooledConn, RingError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RingError::PoolClosed);
        }
        self.pool.get().await.map_err(RingError::from)
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
