use crate::integration::support::Fixture;
use image_gallery::{FileEntry, GalleryError};
use proptest::prelude::*;

fn assert_consistent(fx: &Fixture, rel: &str) {
    let bookmarked = fx
        .gallery
        .metadata_store()
        .load(rel)
        .unwrap()
        .map(|m| m.bookmarked)
        .unwrap_or(false);
    let indexed = fx.gallery.bookmarks().list().unwrap().iter().any(|p| p == rel);
    assert_eq!(indexed, bookmarked, "index and metadata disagree for {}", rel);
}

#[tokio::test]
async fn toggle_twice_restores_state_and_index() {
    let fx = Fixture::new();
    fx.file("photos/a.jpg", 100);

    let first = fx.gallery.toggle_bookmark("photos/a.jpg").await.unwrap();
    assert!(first.bookmarked);
    assert!(first.bookmarked_at.is_some());
    assert_consistent(&fx, "photos/a.jpg");
    assert_eq!(fx.gallery.bookmarks().list().unwrap(), vec!["photos/a.jpg"]);

    let second = fx.gallery.toggle_bookmark("photos/a.jpg").await.unwrap();
    assert!(!second.bookmarked);
    assert_consistent(&fx, "photos/a.jpg");
    assert!(fx.gallery.bookmarks().list().unwrap().is_empty());
}

#[tokio::test]
async fn differently_spelled_paths_share_one_index_entry() {
    let fx = Fixture::new();
    fx.file("photos/a.jpg", 100);

    fx.gallery.toggle_bookmark("photos\\a.jpg").await.unwrap();
    assert!(!fx.gallery.bookmarks().add("photos/a.jpg").unwrap());
    assert_eq!(fx.gallery.bookmarks().list().unwrap(), vec!["photos/a.jpg"]);

    fx.gallery.toggle_bookmark("./photos//a.jpg").await.unwrap();
    assert!(fx.gallery.bookmarks().list().unwrap().is_empty());
}

#[tokio::test]
async fn index_failure_rolls_back_metadata() {
    let fx = Fixture::new();
    fx.file("a.jpg", 100);
    // an unreadable index: a directory where the record should be
    std::fs::create_dir(fx.path(".bookmark")).unwrap();

    let result = fx.gallery.toggle_bookmark("a.jpg").await;
    assert!(matches!(
        result,
        Err(GalleryError::Io { .. }) | Err(GalleryError::PersistenceFailed { .. })
    ));

    let stored = fx.gallery.metadata_store().load("a.jpg").unwrap().unwrap();
    assert!(!stored.bookmarked);
}

#[tokio::test]
async fn bookmarked_view_filters_hidden_missing_and_stale_entries() {
    let fx = Fixture::new();
    fx.file("a.jpg", 100);
    fx.file("b.jpg", 200);
    fx.file("c.jpg", 300);
    fx.file("d.jpg", 400);

    for rel in ["c.jpg", "a.jpg", "b.jpg"] {
        fx.gallery.toggle_bookmark(rel).await.unwrap();
    }
    fx.gallery.hide("b.jpg").await.unwrap();
    std::fs::remove_file(fx.path("c.jpg")).unwrap();
    // index entry without a matching metadata flag
    fx.gallery.bookmarks().add("d.jpg").unwrap();

    let entries = fx.gallery.bookmarked_entries().await.unwrap();
    let paths: Vec<&str> = entries.iter().map(|e: &FileEntry| e.path.as_str()).collect();
    assert_eq!(paths, vec!["a.jpg"]);
    assert!(entries[0].metadata.bookmarked);
}

#[tokio::test]
async fn bookmarked_view_ignores_entries_outside_the_root() {
    let fx = Fixture::new();
    fx.file("a.jpg", 100);
    fx.gallery.toggle_bookmark("a.jpg").await.unwrap();
    std::fs::write(
        fx.path(".bookmark"),
        r#"{"files":["../escape.jpg","a.jpg.meta","./a.jpg"]}"#,
    )
    .unwrap();

    let entries = fx.gallery.bookmarked_entries().await.unwrap();
    let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["a.jpg"]);
    assert!(!fx.temp.path().join("../escape.jpg.meta").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_toggles_on_one_file_are_serialized() {
    let fx = Fixture::new();
    fx.file("a.jpg", 100);

    let handles: Vec<_> = (0..9)
        .map(|_| {
            let gallery = fx.gallery.clone();
            tokio::spawn(async move { gallery.toggle_bookmark("a.jpg").await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // nine flips from false end at true; a lost update would break parity
    let stored = fx.gallery.metadata_store().load("a.jpg").unwrap().unwrap();
    assert!(stored.bookmarked);
    assert_consistent(&fx, "a.jpg");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn concurrent_toggles_never_split_index_and_metadata(
        choices in prop::collection::vec(0usize..3, 1..16),
        listings in 0usize..3,
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let fx = Fixture::new();
            let files = ["a.jpg", "b.jpg", "c.jpg"];
            for (i, rel) in files.iter().enumerate() {
                fx.file(rel, 100 + i as u64);
            }

            let mut handles = Vec::new();
            for &choice in &choices {
                let gallery = fx.gallery.clone();
                let rel = files[choice];
                handles.push(tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    gallery.toggle_bookmark(rel).await.map(|_| ())
                }));
            }
            for _ in 0..listings {
                let gallery = fx.gallery.clone();
                handles.push(tokio::spawn(async move {
                    gallery.list_directory("").await.map(|_| ())
                }));
            }
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            let index = fx.gallery.bookmarks().list().unwrap();
            let mut deduped = index.clone();
            deduped.sort();
            deduped.dedup();
            assert_eq!(deduped.len(), index.len(), "duplicate index entries: {:?}", index);

            for (i, rel) in files.iter().enumerate() {
                let toggles = choices.iter().filter(|&&c| c == i).count();
                let stored = fx
                    .gallery
                    .metadata_store()
                    .load(rel)
                    .unwrap()
                    .unwrap_or_default();
                assert_eq!(stored.bookmarked, toggles % 2 == 1);
                assert_consistent(&fx, rel);
            }
        });
    }
}
