use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

/// Virtual nodes per unit of weight; unweighted shards count as weight 1.
const VNODES_PER_WEIGHT: usize = 40;

/// Weighted consistent-hash ring mapping keys to shard identifiers.
///
/// Each shard is placed on a `u64` ring at `weight * VNODES_PER_WEIGHT`
/// positions; a key resolves to the first virtual node at or after its own
/// position, wrapping around. Positions depend only on the shard identifier
/// and replica index, so resolution is stable across process restarts for
/// identical membership and weighting.
#[derive(Debug, Clone)]
pub struct HashRing {
    vnodes: BTreeMap<u64, String>,
}

impl HashRing {
    /// Build a uniformly weighted ring from a flat list of shard ids.
    pub fn new<I, S>(shards: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let weights: HashMap<String, usize> = shards
            .into_iter()
            .map(|s| (s.as_ref().to_string(), 1))
            .collect();
        Self::with_weights(&weights)
    }

    /// Build a ring where each shard owns a share of the key space
    /// proportional to its weight.
    pub fn with_weights(weights: &HashMap<String, usize>) -> Self {
        let mut vnodes = BTreeMap::new();
        for (shard, weight) in weights {
            let replicas = (*weight).max(1) * VNODES_PER_WEIGHT;
            for replica in 0..replicas {
                vnodes.insert(vnode_position(shard, replica), shard.clone());
            }
        }
        HashRing { vnodes }
    }

    /// Resolve a key to its owning shard id. `None` only when the ring is
    /// empty.
    pub fn resolve(&self, key: &str) -> Option<&str> {
        if self.vnodes.is_empty() {
            return None;
        }
        let pos = key_position(key);
        self.vnodes
            .range(pos..)
            .next()
            .or_else(|| self.vnodes.iter().next())
            .map(|(_, shard)| shard.as_str())
    }
}

fn vnode_position(shard: &str, replica: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    shard.hash(&mut hasher);
    replica.hash(&mut hasher);
    hasher.finish()
}

fn key_position(key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}
