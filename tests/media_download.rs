//! Integration tests for media downloading against a mock media host.

use reqwest::Client;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use x_likes_exporter::download::{DownloadOptions, MediaDownloader};
use x_likes_exporter::fs::OutputLayout;
use x_likes_exporter::record::{parse_record, DownloadStatus, MediaKind};
use x_likes_exporter::{RecordCollection, Shutdown};

/// A liked post with the given `extended_entities.media` entries.
fn post_with_media(id: &str, media: serde_json::Value) -> x_likes_exporter::Record {
    let raw = json!({
        "__typename": "Tweet",
        "rest_id": id,
        "core": {"user_results": {"result": {
            "rest_id": "42",
            "legacy": {"screen_name": "ferris", "name": "Ferris"}
        }}},
        "legacy": {
            "id_str": id,
            "full_text": "look at this",
            "created_at": "Sun Nov 09 11:05:17 +0000 2025",
            "extended_entities": {"media": media}
        }
    });
    parse_record(&raw, false).unwrap()
}

fn downloader(layout: &OutputLayout) -> MediaDownloader {
    MediaDownloader::new(
        Client::new(),
        layout,
        DownloadOptions {
            workers: 2,
            optimize: None,
        },
    )
}

#[tokio::test]
async fn test_downloads_photos_and_videos() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());

    Mock::given(method("GET"))
        .and(path("/media/photo1.jpg"))
        .and(query_param("name", "orig"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(b"jpeg-bytes".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/video/stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "video/mp4")
                .set_body_bytes(b"mp4-bytes".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let record = post_with_media(
        "100",
        json!([
            {
                "type": "photo",
                "url": "https://t.co/p",
                "media_url_https": format!("{}/media/photo1.jpg", server.uri())
            },
            {
                "type": "video",
                "url": "https://t.co/v",
                "media_url_https": format!("{}/media/poster.jpg", server.uri()),
                "video_info": {"variants": [
                    {"content_type": "application/x-mpegURL", "url": format!("{}/video/list.m3u8", server.uri())},
                    {"content_type": "video/mp4", "bitrate": 832000, "url": format!("{}/video/stream", server.uri())}
                ]}
            }
        ]),
    );
    let mut records = RecordCollection::from_records(vec![record]);

    let summary = downloader(&layout)
        .download_collection(&mut records, &Shutdown::new())
        .await;

    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.failed, 0);

    let media = &records.get("100").unwrap().media;
    assert_eq!(media[0].kind, MediaKind::Photo);
    assert_eq!(media[0].local_path.as_deref(), Some("media/100_0.jpg"));
    assert_eq!(media[1].local_path.as_deref(), Some("media/100_1.mp4"));
    assert!(media.iter().all(|m| m.download == DownloadStatus::Downloaded));

    let photo = std::fs::read(layout.media_dir().join("100_0.jpg")).unwrap();
    assert_eq!(photo, b"jpeg-bytes");
    let video = std::fs::read(layout.media_dir().join("100_1.mp4")).unwrap();
    assert_eq!(video, b"mp4-bytes");
}

#[tokio::test]
async fn test_failed_item_does_not_stop_others() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());

    Mock::given(method("GET"))
        .and(path("/media/gone.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/ok.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(b"png".to_vec()),
        )
        .mount(&server)
        .await;

    let mut records = RecordCollection::from_records(vec![
        post_with_media(
            "1",
            json!([{"type": "photo", "media_url_https": format!("{}/media/gone.jpg", server.uri())}]),
        ),
        post_with_media(
            "2",
            json!([{"type": "photo", "media_url_https": format!("{}/media/ok.png", server.uri())}]),
        ),
    ]);

    let summary = downloader(&layout)
        .download_collection(&mut records, &Shutdown::new())
        .await;

    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.failed, 1);

    let failed = &records.get("1").unwrap().media[0];
    assert!(matches!(failed.download, DownloadStatus::Failed(_)));
    assert!(failed.local_path.is_none());

    // Photos are always requested as jpg originals.
    let ok = &records.get("2").unwrap().media[0];
    assert_eq!(ok.local_path.as_deref(), Some("media/2_0.jpg"));
    assert!(layout.media_dir().join("2_0.jpg").exists());
}

#[tokio::test]
async fn test_second_run_reuses_files_on_disk() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());

    Mock::given(method("GET"))
        .and(path("/media/once.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let record = post_with_media(
        "7",
        json!([{"type": "photo", "media_url_https": format!("{}/media/once.jpg", server.uri())}]),
    );

    let mut first = RecordCollection::from_records(vec![record.clone()]);
    let summary = downloader(&layout)
        .download_collection(&mut first, &Shutdown::new())
        .await;
    assert_eq!(summary.downloaded, 1);

    let mut second = RecordCollection::from_records(vec![record]);
    let summary = downloader(&layout)
        .download_collection(&mut second, &Shutdown::new())
        .await;
    assert_eq!(summary.downloaded, 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(
        second.get("7").unwrap().media[0].local_path.as_deref(),
        Some("media/7_0.jpg")
    );
}
