//! Video upload integration tests.
//!
//! Run with: `cargo test -p reelstore-api --test video_upload_test`

mod helpers;

use helpers::fakes::OPTIMIZED_MARKER;
use helpers::{
    file_count, setup_test_app, setup_test_app_with, FakeOptimizer, FakeProber, BASE_URL, BUCKET,
};
use reelstore_core::ObjectReference;
use reelstore_db::AssetRepository;
use serde_json::Value;
use uuid::Uuid;

const VIDEO_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42 fake video payload";

/// Key name is 32 random bytes as unpadded base64url.
fn assert_key_shape(key: &str, prefix: &str) {
    let name = key
        .strip_prefix(&format!("{}/", prefix))
        .and_then(|rest| rest.strip_suffix(".mp4"))
        .unwrap_or_else(|| panic!("unexpected key {}", key));
    assert_eq!(name.len(), 43);
    assert!(name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
}

#[tokio::test]
async fn test_upload_video_stores_remuxed_file_and_signs_url() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();
    let video = app.register_video(owner).await;

    let response = app.upload_video(owner, video.id, VIDEO_BYTES).await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["id"], video.id.to_string());
    assert_eq!(body["user_id"], owner.to_string());

    let video_url = body["video_url"].as_str().expect("video_url is set");
    assert!(video_url.starts_with(&format!("{}/objects/{}/landscape/", BASE_URL, BUCKET)));
    assert!(video_url.contains("expires="));
    assert!(video_url.contains("signature="));

    let stored = app.assets.get_asset(video.id).await.unwrap().unwrap();
    let reference = stored.video_reference.expect("reference persisted");
    assert_eq!(reference.bucket, BUCKET);
    assert_key_shape(&reference.key, "landscape");

    let on_disk = std::fs::read(app.objects_dir().join(BUCKET).join(&reference.key)).unwrap();
    assert!(on_disk.starts_with(OPTIMIZED_MARKER));
    assert!(on_disk.ends_with(VIDEO_BYTES));

    assert_eq!(app.prober.calls(), 1);
    assert_eq!(app.optimizer.calls(), 1);
    assert_eq!(file_count(&app.staging_dir()), 0);
}

#[tokio::test]
async fn test_persisted_reference_recovers_bucket_and_key() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();
    let video = app.register_video(owner).await;

    let response = app.upload_video(owner, video.id, VIDEO_BYTES).await;
    assert_eq!(response.status_code(), 200);

    let stored = app.assets.get_asset(video.id).await.unwrap().unwrap();
    let reference = stored.video_reference.unwrap();
    let encoded = reference.encode();
    assert_eq!(encoded, format!("{},{}", reference.bucket, reference.key));

    let parsed: ObjectReference = encoded.parse().unwrap();
    assert_eq!(parsed, reference);
    assert!(app
        .objects_dir()
        .join(&parsed.bucket)
        .join(&parsed.key)
        .is_file());
}

#[tokio::test]
async fn test_aspect_class_selects_key_prefix() {
    for (width, height, prefix) in [(1080, 1920, "portrait"), (1000, 1000, "other")] {
        let app =
            setup_test_app_with(FakeProber::with_dimensions(width, height), FakeOptimizer::copying())
                .await;
        let owner = Uuid::new_v4();
        let video = app.register_video(owner).await;

        let response = app.upload_video(owner, video.id, VIDEO_BYTES).await;
        assert_eq!(response.status_code(), 200);

        let stored = app.assets.get_asset(video.id).await.unwrap().unwrap();
        assert_key_shape(&stored.video_reference.unwrap().key, prefix);
    }
}

#[tokio::test]
async fn test_non_owner_is_rejected_before_staging() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let video = app.register_video(owner).await;

    let response = app.upload_video(intruder, video.id, VIDEO_BYTES).await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"], "Unauthorized");
    assert!(!response.text().contains(&owner.to_string()));

    assert_eq!(app.prober.calls(), 0);
    assert_eq!(file_count(&app.staging_dir()), 0);
    assert_eq!(file_count(&app.objects_dir()), 0);

    let stored = app.assets.get_asset(video.id).await.unwrap().unwrap();
    assert!(stored.video_reference.is_none());
}

#[tokio::test]
async fn test_optimizer_failure_cleans_up_staging() {
    let app = setup_test_app_with(FakeProber::landscape(), FakeOptimizer::failing()).await;
    let owner = Uuid::new_v4();
    let video = app.register_video(owner).await;

    let response = app.upload_video(owner, video.id, VIDEO_BYTES).await;
    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["code"], "OPTIMIZE_FAILED");
    assert_eq!(body["error"], "Internal server error");
    assert!(body.get("details").is_none());

    assert_eq!(app.optimizer.calls(), 1);
    assert_eq!(file_count(&app.staging_dir()), 0);
    assert_eq!(file_count(&app.objects_dir()), 0);

    let stored = app.assets.get_asset(video.id).await.unwrap().unwrap();
    assert!(stored.video_reference.is_none());
}

#[tokio::test]
async fn test_probe_failure_stops_pipeline() {
    let app = setup_test_app_with(FakeProber::failing(), FakeOptimizer::copying()).await;
    let owner = Uuid::new_v4();
    let video = app.register_video(owner).await;

    let response = app.upload_video(owner, video.id, VIDEO_BYTES).await;
    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["code"], "PROBE_FAILED");

    assert_eq!(app.optimizer.calls(), 0);
    assert_eq!(file_count(&app.staging_dir()), 0);
    assert_eq!(file_count(&app.objects_dir()), 0);
}

#[tokio::test]
async fn test_unknown_video_is_not_found() {
    let app = setup_test_app().await;
    let response = app
        .upload_video(Uuid::new_v4(), Uuid::new_v4(), VIDEO_BYTES)
        .await;
    assert_eq!(response.status_code(), 404);
    assert_eq!(file_count(&app.staging_dir()), 0);
}

#[tokio::test]
async fn test_invalid_video_id_is_bad_request() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();
    let response = app
        .client()
        .post("/videos/not-a-uuid/video")
        .add_header("Authorization", app.bearer(owner))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_missing_or_invalid_token_is_unauthorized() {
    let app = setup_test_app().await;
    let video = app.register_video(Uuid::new_v4()).await;
    let path = format!("/videos/{}/video", video.id);

    let response = app.client().post(&path).await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let response = app
        .client()
        .post(&path)
        .add_header("Authorization", "Bearer not-a-jwt")
        .await;
    assert_eq!(response.status_code(), 401);

    let response = app
        .client()
        .post(&path)
        .add_header("Authorization", "Basic dXNlcjpwYXNz")
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_wrong_field_name_is_bad_request() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();
    let video = app.register_video(owner).await;

    let response = app
        .upload(owner, video.id, "video", "file", "video/mp4", VIDEO_BYTES)
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(app.prober.calls(), 0);
}

#[tokio::test]
async fn test_disallowed_video_type_is_bad_request() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();
    let video = app.register_video(owner).await;

    let response = app
        .upload(owner, video.id, "video", "video", "video/webm", VIDEO_BYTES)
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(app.prober.calls(), 0);
    assert_eq!(file_count(&app.staging_dir()), 0);
}

#[tokio::test]
async fn test_oversized_video_is_bad_request() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();
    let video = app.register_video(owner).await;

    // Test config caps videos at 64 KiB.
    let payload = vec![7u8; 70 * 1024];
    let response = app.upload_video(owner, video.id, &payload).await;
    assert_eq!(response.status_code(), 400);

    assert_eq!(app.prober.calls(), 0);
    assert_eq!(file_count(&app.staging_dir()), 0);
    assert_eq!(file_count(&app.objects_dir()), 0);
}

#[tokio::test]
async fn test_signed_urls_resolve_to_the_same_object() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();
    let video = app.register_video(owner).await;
    let response = app.upload_video(owner, video.id, VIDEO_BYTES).await;
    assert_eq!(response.status_code(), 200);

    let first: Value = app
        .client()
        .get(&format!("/videos/{}", video.id))
        .add_header("Authorization", app.bearer(owner))
        .await
        .json();
    let second: Value = app
        .client()
        .get(&format!("/videos/{}", video.id))
        .add_header("Authorization", app.bearer(owner))
        .await
        .json();

    let first_url = first["video_url"].as_str().unwrap();
    let second_url = second["video_url"].as_str().unwrap();
    let path_of = |url: &str| url.split('?').next().unwrap().to_string();
    assert_eq!(path_of(first_url), path_of(second_url));

    let a = app.fetch_signed(first_url).await;
    let b = app.fetch_signed(second_url).await;
    assert_eq!(a.status_code(), 200);
    assert_eq!(b.status_code(), 200);
    assert_eq!(a.as_bytes(), b.as_bytes());
    assert!(a.as_bytes().ends_with(VIDEO_BYTES));
}

#[tokio::test]
async fn test_tampered_signature_is_rejected() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();
    let video = app.register_video(owner).await;
    let body: Value = app.upload_video(owner, video.id, VIDEO_BYTES).await.json();
    let url = body["video_url"].as_str().unwrap();

    let (base, query) = url.split_once('?').unwrap();
    let expires = query
        .split('&')
        .find_map(|kv| kv.strip_prefix("expires="))
        .unwrap()
        .parse::<u64>()
        .unwrap();
    let signature = query
        .split('&')
        .find_map(|kv| kv.strip_prefix("signature="))
        .unwrap();

    // Extending the expiry invalidates the signature.
    let forged = format!("{}?expires={}&signature={}", base, expires + 3600, signature);
    let response = app.fetch_signed(&forged).await;
    assert_eq!(response.status_code(), 401);

    let forged = format!("{}?expires={}&signature=AAAA", base, expires);
    let response = app.fetch_signed(&forged).await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_storage_failure_keeps_previous_video() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();
    let video = app.register_video(owner).await;

    let response = app.upload_video(owner, video.id, VIDEO_BYTES).await;
    assert_eq!(response.status_code(), 200);
    let before = app.assets.get_asset(video.id).await.unwrap().unwrap();

    app.storage.fail_writes();
    let response = app.upload_video(owner, video.id, VIDEO_BYTES).await;
    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["code"], "UPLOAD_FAILED");
    assert_eq!(body["error"], "Internal server error");
    assert!(!response.text().contains("connection reset"));

    assert_eq!(file_count(&app.staging_dir()), 0);
    assert_eq!(file_count(&app.objects_dir()), 1);
    let after = app.assets.get_asset(video.id).await.unwrap().unwrap();
    assert_eq!(after.video_reference, before.video_reference);
}

#[tokio::test]
async fn test_record_update_failure_leaves_reference_unchanged() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();
    let video = app.register_video(owner).await;

    let response = app.upload_video(owner, video.id, VIDEO_BYTES).await;
    assert_eq!(response.status_code(), 200);
    let before = app.assets.get_asset(video.id).await.unwrap().unwrap();

    app.records.fail_updates();
    let response = app.upload_video(owner, video.id, VIDEO_BYTES).await;
    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["code"], "PERSISTENCE_FAILED");
    assert!(body.get("details").is_none());

    assert_eq!(file_count(&app.staging_dir()), 0);
    // The second object was written before the update failed and stays orphaned.
    assert_eq!(file_count(&app.objects_dir()), 2);
    let after = app.assets.get_asset(video.id).await.unwrap().unwrap();
    assert_eq!(after.video_reference, before.video_reference);
}
