use crate::integration::support::Fixture;
use image_gallery::GalleryError;

#[tokio::test]
async fn hide_removes_file_from_every_later_listing() {
    let fx = Fixture::new();
    fx.file("photos/a.jpg", 100);
    fx.file("photos/b.jpg", 200);

    let metadata = fx.gallery.hide("photos/a.jpg").await.unwrap();
    assert!(metadata.hidden);
    assert!(metadata.hidden_at.is_some());

    for _ in 0..2 {
        let entries = fx.gallery.list_directory("photos").await.unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["photos/b.jpg"]);
    }
    // the file itself is untouched
    assert!(fx.path("photos/a.jpg").exists());
}

#[tokio::test]
async fn hide_is_idempotent() {
    let fx = Fixture::new();
    fx.file("a.jpg", 100);

    let first = fx.gallery.hide("a.jpg").await.unwrap();
    let second = fx.gallery.hide("a.jpg").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.hidden_at, second.hidden_at);
}

#[tokio::test]
async fn mutations_reject_directories() {
    let fx = Fixture::new();
    fx.dir("album", 100);

    for result in [
        fx.gallery.hide("album").await,
        fx.gallery.toggle_bookmark("album").await,
        fx.gallery.hide("").await,
    ] {
        assert!(matches!(result, Err(GalleryError::InvalidTarget { .. })));
    }
    assert!(!fx.path("album.meta").exists());
}

#[tokio::test]
async fn mutations_reject_artifacts_without_side_effects() {
    let fx = Fixture::new();
    fx.file("a.jpg", 100);
    std::fs::write(fx.path("a.jpg.meta"), "{}").unwrap();
    std::fs::write(fx.path("a.jpg.preview"), "x").unwrap();

    for target in ["a.jpg.meta", "a.jpg.preview", ".bookmark"] {
        assert!(matches!(
            fx.gallery.hide(target).await,
            Err(GalleryError::InvalidTarget { .. })
        ));
        assert!(matches!(
            fx.gallery.toggle_bookmark(target).await,
            Err(GalleryError::InvalidTarget { .. })
        ));
    }
    assert!(!fx.path("a.jpg.meta.meta").exists());
    assert!(!fx.path(".bookmark").exists());
}

#[tokio::test]
async fn mutations_on_missing_files_are_not_found() {
    let fx = Fixture::new();
    assert!(matches!(
        fx.gallery.hide("ghost.jpg").await,
        Err(GalleryError::NotFound(_))
    ));
    assert!(matches!(
        fx.gallery.toggle_bookmark("ghost.jpg").await,
        Err(GalleryError::NotFound(_))
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn failed_sidecar_write_is_reported() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    fx.file("locked/a.jpg", 100);
    // seed the record so the failure is the mutation's own write
    fx.gallery.list_directory("locked").await.unwrap();

    let dir = fx.path("locked");
    std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o555)).unwrap();
    let writable = std::fs::write(dir.join("check"), b"x");
    if writable.is_ok() {
        // running as root; permissions are not enforced
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = fx.gallery.hide("locked/a.jpg").await;
    std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(result, Err(GalleryError::PersistenceFailed { .. })));
    let stored = fx.gallery.metadata_store().load("locked/a.jpg").unwrap().unwrap();
    assert!(!stored.hidden);
}
