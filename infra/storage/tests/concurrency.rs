use depot_storage::*;
use fxhash::FxHashSet;
use tempfile::TempDir;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_uploads_of_one_name_never_collide() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::builder().root(temp.path()).connect().await.unwrap();

    let handles: Vec<_> = (0..64u8)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.store(Upload::new("same.txt", vec![i; 8])).await })
        })
        .collect();

    let mut names = FxHashSet::default();
    for handle in handles {
        let record = handle.await.unwrap().unwrap();
        assert!(names.insert(record.stored_name().to_owned()), "duplicate stored name");
    }

    let listed = store.list(None).await.unwrap();
    assert_eq!(listed.len(), 64);
    assert!(listed.iter().all(|r| r.original_name() == "same.txt"));
    assert_eq!(store.cache_len(), 64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn listing_tolerates_concurrent_deletes() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::builder().root(temp.path()).connect().await.unwrap();

    let mut stored = Vec::new();
    for i in 0..32 {
        stored.push(store.store(Upload::new(format!("f{i}.txt"), b"x".to_vec())).await.unwrap());
    }

    let deleter = {
        let store = store.clone();
        let names: Vec<String> = stored.iter().map(|r| r.stored_name().to_owned()).collect();
        tokio::spawn(async move {
            for name in names {
                assert!(store.delete(&name).await.unwrap());
            }
        })
    };

    for _ in 0..8 {
        let listed = store.list(None).await.unwrap();
        assert!(listed.len() <= 32);
    }

    deleter.await.unwrap();
    assert!(store.list(None).await.unwrap().is_empty());
    assert_eq!(store.cache_len(), 0);
}

#[derive(Debug)]
struct SingleSlot;

impl NameScheme for SingleSlot {
    fn stored_name(&self, _sanitized: &str) -> String {
        "slot.txt".to_owned()
    }

    fn original_name(&self, stored: &str) -> String {
        stored.to_owned()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cache_never_outlives_a_racing_delete() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::builder().root(temp.path()).namer(SingleSlot).connect().await.unwrap();

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 0..200u8 {
                store.store(Upload::new("slot.txt", vec![i; 4])).await.unwrap();
            }
        })
    };
    let deleter = {
        let store = store.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                store.delete("slot.txt").await.unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    writer.await.unwrap();
    deleter.await.unwrap();

    if store.cache().contains("slot.txt") {
        assert!(store.root().join("slot.txt").exists(), "cached record without a file");
    }
}
