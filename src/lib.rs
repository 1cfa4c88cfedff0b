//! Client-side sharded cache over Redis-compatible backends.
//!
//! A [`Ring`] spreads key-value traffic across multiple independent server
//! instances using consistent hashing. Each shard is reached through a
//! bounded, health-checked connection pool; values pass through a pluggable
//! codec on the way in and out.
//!
//! ```no_run
//! use shardcache::{Ring, RingOptions, CodecKind};
//!
//! # async fn example() -> Result<(), shardcache::RingError> {
//! let ring = Ring::new(RingOptions {
//!     addrs: vec![
//!         "redis://127.0.0.1:6380/0".to_string(),
//!         "redis://:@127.0.0.1:6380/1".to_string(),
//!     ],
//!     codec: CodecKind::Identity,
//!     ..Default::default()
//! })?;
//!
//! ring.set("aa", "haha", 0).await?;
//! let data = ring.get("aa").await?;
//! ring.close().await?;
//! # Ok(())
//! # }
//! ```

mod codec;
mod conf;
mod error;
mod hash;
mod node;
mod pool;
mod ring;

pub use codec::{CodecKind, Value};
pub use conf::{EnvOptions, RingOptions};
pub use error::RingError;
pub use node::RingNode;
pub use ring::Ring;
