mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use cloak::memcache::Client;
use cloak::CloakError;
use common::{key_hex, MemoryCache};

fn cache_client() -> Client<MemoryCache> {
    Client::new(&key_hex(), MemoryCache::new()).unwrap()
}

#[tokio::test]
async fn set_get_delete() {
    let client = cache_client();
    assert!(client.set("user:1", "alice", None).await.unwrap());
    assert_eq!(client.get("user:1").await.unwrap(), Some(b"alice".to_vec()));
    assert!(!client.cache().raw_keys().iter().any(|k| &k[..] == b"user:1"));

    assert!(client.delete("user:1").await.unwrap());
    assert_eq!(client.get("user:1").await.unwrap(), None);
}

#[tokio::test]
async fn add_and_replace_respect_presence() {
    let client = cache_client();
    assert!(!client.replace("k", "v", None).await.unwrap());
    assert!(client.add("k", "v", None).await.unwrap());
    assert!(!client.add("k", "w", None).await.unwrap());
    assert!(client.replace("k", "w", None).await.unwrap());
    assert_eq!(client.get("k").await.unwrap(), Some(b"w".to_vec()));
}

#[tokio::test]
async fn get_multi_is_keyed_by_plaintext() {
    let client = cache_client();
    client.set("a", "1", None).await.unwrap();
    client.set("b", "2", None).await.unwrap();
    let found = client.get_multi(["a", "b", "c"]).await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found.get(&b"a"[..]), Some(&b"1".to_vec()));
    assert_eq!(found.get(&b"b"[..]), Some(&b"2".to_vec()));
}

#[tokio::test]
async fn fetch_computes_only_on_a_miss() {
    let client = cache_client();
    let calls = AtomicUsize::new(0);
    for _ in 0..2 {
        let value = client
            .fetch("expensive", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                "computed"
            })
            .await
            .unwrap();
        assert_eq!(value, b"computed".to_vec());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn counters_are_stored_in_the_clear() {
    let client = cache_client();
    assert_eq!(client.incr("n", 1, None, None).await.unwrap(), None);
    assert_eq!(client.incr("n", 5, None, Some(10)).await.unwrap(), Some(10));
    assert_eq!(client.incr("n", 5, None, None).await.unwrap(), Some(15));
    assert_eq!(client.decr("n", 20, None, None).await.unwrap(), Some(0));
    assert_eq!(client.get("n").await, Err(CloakError::DecryptionFailed));
}

#[tokio::test]
async fn administrative_calls_pass_through() {
    let client = cache_client();
    client.set("k", "v", None).await.unwrap();
    let stats = client.stats().await.unwrap();
    assert_eq!(stats["memory:0"]["curr_items"], "1");
    assert!(client.touch("k", None).await.unwrap());
    client.flush(None).await.unwrap();
    assert_eq!(client.get("k").await.unwrap(), None);
    assert_eq!(client.version().await.unwrap()["memory:0"], "1.6.0");
}
