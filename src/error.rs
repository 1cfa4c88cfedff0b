/// Everything that can go wrong inside the ring, from address parsing at
/// construction time down to individual backend commands.
#[derive(thiserror::Error, Debug)]
pub enum RingError {
    #[error("address `{0}` is missing the `redis://` scheme")]
    MissingScheme(String),
    #[error("password in `{0}` must start with a colon")]
    BadPassword(String),
    #[error("invalid {field} `{value}` in address: {source}")]
    BadNumber {
        field: &'static str,
        value: String,
        source: std::num::ParseIntError,
    },
    #[error("weighted and unweighted addresses cannot be mixed in one ring")]
    MixedWeights,
    #[error("unknown codec `{0}`")]
    UnknownCodec(String),
    #[error("no shard owns key `{0}`")]
    Unroutable(String),
    #[error("connect to node `{server}` failed: {source}")]
    Connect {
        server: String,
        source: redis::RedisError,
    },
    #[error("auth against node `{server}` rejected: {source}")]
    Auth {
        server: String,
        source: redis::RedisError,
    },
    #[error("select db {database} on node `{server}` failed: {source}")]
    Select {
        server: String,
        database: i64,
        source: redis::RedisError,
    },
    #[error("{op} key `{key}` failed: {source}")]
    Backend {
        op: &'static str,
        key: String,
        source: redis::RedisError,
    },
    #[error("set key `{key}` to `{preview}` failed: {source}")]
    SetBackend {
        key: String,
        preview: String,
        source: redis::RedisError,
    },
    #[error("value cannot be encoded: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("stored bytes are not a valid envelope: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("envelope carries {0} trailing bytes")]
    TrailingBytes(usize),
    #[error("timed out waiting for a pooled connection")]
    PoolTimeout,
    #[error("pooled connection was broken")]
    BadConn,
    #[error("shard pool is closed")]
    PoolClosed,
}

impl From<mobc::Error<RingError>> for RingError {
    fn from(value: mobc::Error<RingError>) -> Self {
        match value {
            mobc::Error::Inner(e) => e,
            mobc::Error::Timeout => RingError::PoolTimeout,
            mobc::Error::BadConn => RingError::BadConn,
            mobc::Error::PoolClosed => RingError::PoolClosed,
        }
    }
}

impl RingError {
    /// True for errors that describe malformed configuration rather than a
    /// runtime failure. These abort ring construction.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            RingError::MissingScheme(_)
                | RingError::BadPassword(_)
                | RingError::BadNumber { .. }
                | RingError::MixedWeights
                | RingError::UnknownCodec(_)
        )
    }
}
