use crate::integration::support::{FakeTranscoder, Fixture};
use image_gallery::preview::PreviewSettings;
use image_gallery::GalleryOptions;
use std::time::Duration;

#[tokio::test]
async fn preview_generated_once_across_listings() {
    let fx = Fixture::new();
    fx.file("a.jpg", 100);

    let first = fx.gallery.list_directory("").await.unwrap();
    let second = fx.gallery.list_directory("").await.unwrap();

    assert_eq!(fx.transcoder.calls(), 1);
    assert_eq!(first[0].preview_path, "a.jpg.preview");
    assert_eq!(first[0].preview_path, second[0].preview_path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_listings_share_generation() {
    let fx = Fixture::with_transcoder(FakeTranscoder::slow(Duration::from_millis(50)));
    fx.file("a.jpg", 100);
    fx.file("b.jpg", 200);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let gallery = fx.gallery.clone();
            tokio::spawn(async move { gallery.list_directory("").await })
        })
        .collect();
    for handle in handles {
        let entries = handle.await.unwrap().unwrap();
        assert!(entries.iter().all(|e| e.has_distinct_preview()));
    }

    assert_eq!(fx.transcoder.calls(), 2);
}

#[tokio::test]
async fn transcoder_timeout_falls_back_to_source() {
    let options = GalleryOptions {
        preview: PreviewSettings {
            timeout: Duration::from_millis(50),
            max_concurrent: 1,
        },
        ..GalleryOptions::default()
    };
    let fx = Fixture::with_options(FakeTranscoder::slow(Duration::from_secs(30)), options);
    fx.file("big.mov", 100);

    let entries = fx.gallery.list_directory("").await.unwrap();
    assert_eq!(entries[0].preview_path, "big.mov");
    assert!(!fx.path("big.mov.preview").exists());
}

#[tokio::test]
async fn failed_preview_is_retried_on_next_listing() {
    let fx = Fixture::with_transcoder(FakeTranscoder::failing());
    fx.file("a.jpg", 100);

    fx.gallery.list_directory("").await.unwrap();
    fx.gallery.list_directory("").await.unwrap();
    assert_eq!(fx.transcoder.calls(), 2);
}

#[tokio::test]
async fn hidden_files_get_no_preview() {
    let fx = Fixture::new();
    fx.file("a.jpg", 100);
    fx.gallery.hide("a.jpg").await.unwrap();

    fx.gallery.list_directory("").await.unwrap();
    assert_eq!(fx.transcoder.calls(), 0);
    assert!(!fx.path("a.jpg.preview").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn large_first_scan_is_bounded_by_pool() {
    let options = GalleryOptions {
        listing_concurrency: 16,
        preview: PreviewSettings {
            timeout: Duration::from_secs(5),
            max_concurrent: 2,
        },
        ..GalleryOptions::default()
    };
    let fx = Fixture::with_options(FakeTranscoder::slow(Duration::from_millis(30)), options);
    for i in 0..12 {
        fx.file(&format!("img{:02}.jpg", i), 100 + i);
    }

    let entries = fx.gallery.list_directory("").await.unwrap();
    assert_eq!(entries.len(), 12);
    assert_eq!(fx.transcoder.calls(), 12);
    assert_eq!(entries[0].path, "img11.jpg");
    assert!(fx.transcoder.peak() >= 1);
    assert!(
        fx.transcoder.peak() <= 2,
        "{} transcodes ran at once",
        fx.transcoder.peak()
    );
}
