use std::str::FromStr;

use crate::error::RingError;

const SCHEME: &str = "redis://";
const DEFAULT_PORT: &str = "6379";

/// One parsed shard address:
/// `redis://[:password@]host[:port][,weight][/database]`.
///
/// `addr` is the address with the weight component stripped and is the
/// stable shard identifier; the hash ring and the shard table are both
/// keyed by it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingNode {
    /// Normalized address, scheme kept, weight stripped.
    pub addr: String,
    /// `host:port`, with the port filled in when omitted.
    pub server: String,
    /// Empty means no AUTH step.
    pub password: String,
    /// Logical database index; outside `[0, 16)` no SELECT is issued.
    pub database: i64,
    /// 0 means unweighted.
    pub weight: usize,
}

impl RingNode {
    /// Parse one raw address string.
    ///
    /// The components are peeled off the tail in a fixed order: the
    /// `,weight` suffix first, then the `/database` suffix, then the
    /// `@`-delimited password, then the `:`-delimited port. The order
    /// matters: `redis://host/5,2` carries database 5 and weight 2, while
    /// `redis://host,2/5` fails because `2/5` is not a weight.
    pub fn parse(raw: &str) -> Result<RingNode, RingError> {
        let rest = raw
            .strip_prefix(SCHEME)
            .ok_or_else(|| RingError::MissingScheme(raw.to_string()))?;

        let (no_weight, weight) = split_tail::<usize>(rest, ',', "weight")?;
        let (url, database) = split_tail::<i64>(no_weight, '/', "database")?;

        let (password, hostport) = match url.split_once('@') {
            Some((pw, hp)) => {
                let pw = pw
                    .strip_prefix(':')
                    .ok_or_else(|| RingError::BadPassword(raw.to_string()))?;
                (pw.to_string(), hp)
            }
            None => (String::new(), url),
        };

        let server = match hostport.split_once(':') {
            Some((_, port)) if !port.is_empty() => hostport.to_string(),
            Some((host, _)) => format!("{host}:{DEFAULT_PORT}"),
            None => format!("{hostport}:{DEFAULT_PORT}"),
        };

        Ok(RingNode {
            addr: format!("{SCHEME}{no_weight}"),
            server,
            password,
            database: database.unwrap_or(0),
            weight: weight.unwrap_or(0),
        })
    }
}

/// Split `s` once on `sep` and parse the tail as an integer. No separator
/// means no value; an unparseable tail is a format error.
fn split_tail<'a, T>(
    s: &'a str,
    sep: char,
    field: &'static str,
) -> Result<(&'a str, Option<T>), RingError>
where
    T: FromStr<Err = std::num::ParseIntError>,
{
    match s.split_once(sep) {
        Some((head, tail)) => {
            let n = tail.parse::<T>().map_err(|e| RingError::BadNumber {
                field,
                value: tail.to_string(),
                source: e,
            })?;
            Ok((head, Some(n)))
        }
        None => Ok((s, None)),
    }
}
