//! Integration tests against a running Redis-compatible backend.
//!
//! All tests here are ignored by default; run them with a backend
//! listening on 127.0.0.1:6379:
//!
//! ```text
//! cargo test --test ring_live -- --ignored
//! ```

use std::sync::Arc;

use shardcache::{CodecKind, Ring, RingError, RingOptions};

fn init_log() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env(),
        )
        .try_init();
}

fn two_shard_options(codec: CodecKind) -> RingOptions {
    RingOptions {
        addrs: vec![
            "redis://127.0.0.1:6379/0".to_string(),
            "redis://:@127.0.0.1:6379/1".to_string(),
        ],
        codec,
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "needs a running redis on 127.0.0.1:6379"]
async fn set_then_get_round_trips_identity() -> Result<(), RingError> {
    init_log();
    let ring = Ring::new(two_shard_options(CodecKind::Identity))?;
    ring.set("aa", "haha", 0).await?;
    let data = ring.get("aa").await?;
    assert_eq!(data.as_ref(), b"haha");
    ring.close().await
}

#[tokio::test]
#[ignore = "needs a running redis on 127.0.0.1:6379"]
async fn set_then_get_round_trips_binary() -> Result<(), RingError> {
    let ring = Ring::new(two_shard_options(CodecKind::Binary))?;
    ring.set("aa", "haha", 0).await?;
    assert_eq!(ring.get("aa").await?.as_ref(), b"haha");
    ring.set("ab", vec![0u8, 1, 2, 255], 0).await?;
    assert_eq!(ring.get("ab").await?.as_ref(), &[0u8, 1, 2, 255][..]);
    ring.close().await
}

#[tokio::test]
#[ignore = "needs a running redis on 127.0.0.1:6379"]
async fn get_of_a_key_never_set_is_empty_not_an_error() -> Result<(), RingError>
{
    let ring = Ring::new(two_shard_options(CodecKind::Identity))?;
    let data = ring.get("shardcache-test-never-set").await?;
    assert!(data.is_empty());
    ring.close().await
}

#[tokio::test]
#[ignore = "needs a running redis on 127.0.0.1:6379"]
async fn exists_delete_lifecycle() -> Result<(), RingError> {
    let ring = Ring::new(two_shard_options(CodecKind::Identity))?;
    ring.set("life", "1", 0).await?;
    assert!(ring.exists("life").await?);
    ring.delete("life").await?;
    assert!(!ring.exists("life").await?);
    ring.close().await
}

#[tokio::test]
#[ignore = "needs a running redis on 127.0.0.1:6379"]
async fn counters_move_by_the_requested_amounts() -> Result<(), RingError> {
    let ring = Ring::new(two_shard_options(CodecKind::Identity))?;
    ring.delete("ctr").await?;
    assert_eq!(ring.incr("ctr", 0).await?, 1);
    assert_eq!(ring.incr("ctr", 0).await?, 2);
    assert_eq!(ring.incr_by("ctr", 3, 10).await?, 5);
    assert_eq!(ring.decr("ctr", 0).await?, 4);
    assert_eq!(ring.decr_by("ctr", 4, 0).await?, 0);
    ring.close().await
}

#[tokio::test]
#[ignore = "needs a running redis on 127.0.0.1:6379"]
async fn expire_is_accepted() -> Result<(), RingError> {
    let ring = Ring::new(two_shard_options(CodecKind::Identity))?;
    ring.set("ttl", "x", 0).await?;
    assert!(ring.expire("ttl", 100).await?);
    ring.close().await
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "needs a running redis on 127.0.0.1:6379"]
async fn two_hundred_concurrent_callers_do_not_interfere() {
    init_log();
    let ring = Arc::new(
        Ring::new(RingOptions {
            max_idle: 250,
            max_active: 250,
            ..two_shard_options(CodecKind::Identity)
        })
        .unwrap(),
    );

    let mut handles = Vec::new();
    for i in 1..=200 {
        let ring = ring.clone();
        handles.push(tokio::spawn(async move {
            let key = format!("race-{i}");
            let value = format!("value-{i}");
            ring.set(&key, value.clone(), 0).await.unwrap();
            let got = ring.get(&key).await.unwrap();
            assert_eq!(got.as_ref(), value.as_bytes(), "key {key}");
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    ring.close().await.unwrap();
}
