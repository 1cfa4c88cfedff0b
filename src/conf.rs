use std::time::Duration;

use envconfig::Envconfig;

use crate::codec::CodecKind;
use crate::error::RingError;

pub const DEFAULT_MAX_IDLE: u64 = 50;
pub const DEFAULT_MAX_ACTIVE: u64 = 50;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Construction options for a [`crate::Ring`].
///
/// Zero values for the pool fields are normalized to the defaults, so a
/// struct-literal with `..Default::default()` only needs the addresses.
#[derive(Debug, Clone, Default)]
pub struct RingOptions {
    /// Raw shard addresses, possibly carrying weights.
    pub addrs: Vec<String>,
    /// Idle connection ceiling per shard pool; 0 means 50.
    pub max_idle: u64,
    /// Active connection ceiling per shard pool; 0 means 50.
    pub max_active: u64,
    /// Idle connections older than this are evicted; zero means 60s.
    pub idle_timeout: Duration,
    /// Value transform applied on every set and get.
    pub codec: CodecKind,
}

impl RingOptions {
    pub(crate) fn normalize(&mut self) {
        if self.max_idle == 0 {
            self.max_idle = DEFAULT_MAX_IDLE;
        }
        if self.max_active == 0 {
            self.max_active = DEFAULT_MAX_ACTIVE;
        }
        if self.idle_timeout.is_zero() {
            self.idle_timeout = DEFAULT_IDLE_TIMEOUT;
        }
    }
}

/// Environment mapping for [`RingOptions`], for processes configured the
/// twelve-factor way. Addresses are whitespace-separated because the
/// address grammar itself uses commas for weights.
#[derive(Envconfig, Debug)]
pub struct EnvOptions {
    #[envconfig(from = "RING_ADDRS", default = "")]
    pub addrs: String,
    #[envconfig(from = "RING_MAX_IDLE", default = "0")]
    pub max_idle: u64,
    #[envconfig(from = "RING_MAX_ACTIVE", default = "0")]
    pub max_active: u64,
    #[envconfig(from = "RING_IDLE_TIMEOUT_SECS", default = "0")]
    pub idle_timeout_secs: u64,
    #[envconfig(from = "RING_CODEC", default = "compact-binary")]
    pub codec: String,
}

impl EnvOptions {
    pub fn into_options(self) -> Result<RingOptions, RingError> {
        Ok(RingOptions {
            addrs: self
                .addrs
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            max_idle: self.max_idle,
            max_active: self.max_active,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            codec: self.codec.parse()?,
        })
    }
}
