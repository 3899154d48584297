//! End-to-end scrape runs against a mock vendor server
//!
//! Each test stands up a wiremock server playing the vendor API, points the
//! scraper's base URL at it and checks the files it leaves behind.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notes_dl::{Config, FlushStrategy, NoteScraper, SaveMode, SearchFilters};

/// Config pointed at the mock server with millisecond retry and pacing
fn test_config(server: &MockServer, out: &TempDir) -> Config {
    let mut config = Config::new("web_session=test");
    config.base_url = server.uri();
    config.output.media_dir = out.path().join("media");
    config.output.spreadsheet_dir = out.path().join("sheets");
    config.retry.max_attempts = 2;
    config.retry.initial_delay = Duration::from_millis(1);
    config.retry.max_delay = Duration::from_millis(2);
    config.pacing.min = Duration::from_millis(1);
    config.pacing.max = Duration::from_millis(2);
    config
}

fn note_url(server: &MockServer, note_id: &str) -> String {
    format!("{}/explore/{note_id}?xsec_token=tok-{note_id}", server.uri())
}

fn video_record(server: &MockServer, note_id: &str, user_id: &str) -> Value {
    json!({
        "id": note_id,
        "model_type": "note",
        "note_card": {
            "type": "video",
            "title": format!("clip {note_id}"),
            "time": 1717000000000_i64,
            "user": {"user_id": user_id, "nickname": "owner"},
            "interact_info": {"liked_count": "3"},
            "video": {
                "image": {"first_frame": format!("{}/assets/{note_id}/cover.jpg", server.uri())},
                "media": {"stream": {"h264": [
                    {"master_url": format!("{}/assets/{note_id}/clip.mp4", server.uri())}
                ]}}
            }
        }
    })
}

fn image_record(server: &MockServer, note_id: &str, user_id: &str) -> Value {
    json!({
        "id": note_id,
        "model_type": "note",
        "note_card": {
            "type": "normal",
            "title": format!("photos {note_id}"),
            "user": {"user_id": user_id, "nickname": "owner"},
            "image_list": [
                {"url_default": format!("{}/assets/{note_id}/img0.webp", server.uri())},
                {"url_default": format!("{}/assets/{note_id}/img1.webp", server.uri())}
            ]
        }
    })
}

/// Serve a successful feed envelope for one note id
async fn mount_feed(server: &MockServer, note_id: &str, record: Value) {
    Mock::given(method("POST"))
        .and(path("/api/sns/web/v1/feed"))
        .and(body_partial_json(json!({"source_note_id": note_id})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "msg": "",
            "code": 0,
            "data": {"items": [record]}
        })))
        .mount(server)
        .await;
}

/// Serve fixed bytes for every media asset URL
async fn mount_assets(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex("^/assets/.+"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"asset-bytes".to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn streaming_all_run_writes_rows_and_media() {
    let server = MockServer::start().await;
    let out = tempfile::tempdir().unwrap();
    let config = test_config(&server, &out);

    mount_feed(&server, "n1", video_record(&server, "n1", "u1")).await;
    mount_feed(&server, "n2", image_record(&server, "n2", "u2")).await;
    mount_assets(&server).await;

    let scraper = NoteScraper::new(config.clone()).unwrap();
    let urls = vec![note_url(&server, "n1"), note_url(&server, "n2")];
    let summary = scraper
        .scrape_notes(&urls, SaveMode::All, "run")
        .await
        .unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.rows_written, 2);
    assert_eq!(summary.media_saved, 2);

    // One header plus one row per note, in input order
    let csv = std::fs::read_to_string(config.output.spreadsheet_dir.join("run.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("n1,"), "{}", lines[1]);
    assert!(lines[2].starts_with("n2,"), "{}", lines[2]);

    // Media lands under media_root/{user_id}/{note_id}/ with extensions
    // taken from the asset URLs
    let media = &config.output.media_dir;
    assert!(media.join("u1/n1/cover.jpg").exists());
    assert!(media.join("u1/n1/video_0.mp4").exists());
    assert!(media.join("u2/n2/image_0.webp").exists());
    assert!(media.join("u2/n2/image_1.webp").exists());
    assert_eq!(
        std::fs::read(media.join("u1/n1/video_0.mp4")).unwrap(),
        b"asset-bytes"
    );

    // Nothing beyond the four assets landed anywhere in the tree
    let file_count = walkdir::WalkDir::new(media)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count();
    assert_eq!(file_count, 4);
}

#[tokio::test]
async fn failed_note_is_skipped_and_batch_continues() {
    let server = MockServer::start().await;
    let out = tempfile::tempdir().unwrap();
    let config = test_config(&server, &out);

    mount_feed(&server, "good1", image_record(&server, "good1", "u1")).await;
    mount_feed(&server, "good2", image_record(&server, "good2", "u1")).await;

    // The bad note fails the envelope's success flag on every attempt, so
    // the retry budget (2 attempts here) is spent in full
    Mock::given(method("POST"))
        .and(path("/api/sns/web/v1/feed"))
        .and(body_partial_json(json!({"source_note_id": "bad"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "msg": "note is private",
            "code": -510001
        })))
        .expect(2)
        .mount(&server)
        .await;

    let scraper = NoteScraper::new(config.clone()).unwrap();
    let urls = vec![
        note_url(&server, "good1"),
        note_url(&server, "bad"),
        note_url(&server, "good2"),
    ];
    let summary = scraper
        .scrape_notes(&urls, SaveMode::Spreadsheet, "run")
        .await
        .unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.rows_written, 2);
    assert_eq!(summary.media_saved, 0, "spreadsheet mode downloads nothing");

    let csv = std::fs::read_to_string(config.output.spreadsheet_dir.join("run.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3, "header plus the two surviving notes");
    assert!(lines[1].starts_with("good1,"));
    assert!(lines[2].starts_with("good2,"));
}

#[tokio::test]
async fn unparsable_url_is_skipped_and_batch_continues() {
    let server = MockServer::start().await;
    let out = tempfile::tempdir().unwrap();
    let config = test_config(&server, &out);

    mount_feed(&server, "good", image_record(&server, "good", "u1")).await;

    let scraper = NoteScraper::new(config.clone()).unwrap();
    let urls = vec!["not a url".to_string(), note_url(&server, "good")];
    let summary = scraper
        .scrape_notes(&urls, SaveMode::Spreadsheet, "run")
        .await
        .unwrap();

    assert_eq!(summary.attempted, 2, "the bad URL still counts as attempted");
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.rows_written, 1);

    let csv = std::fs::read_to_string(config.output.spreadsheet_dir.join("run.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2, "header plus the surviving note");
    assert!(lines[1].starts_with("good,"));
}

#[tokio::test]
async fn buffered_run_writes_rows_once_at_the_end() {
    let server = MockServer::start().await;
    let out = tempfile::tempdir().unwrap();
    let mut config = test_config(&server, &out);
    config.flush = FlushStrategy::Buffered;

    mount_feed(&server, "n1", video_record(&server, "n1", "u1")).await;
    mount_feed(&server, "n2", image_record(&server, "n2", "u2")).await;
    mount_assets(&server).await;

    let scraper = NoteScraper::new(config.clone()).unwrap();
    let urls = vec![note_url(&server, "n1"), note_url(&server, "n2")];
    let summary = scraper
        .scrape_notes(&urls, SaveMode::All, "run")
        .await
        .unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.rows_written, 2, "both rows land in the final write");
    assert_eq!(summary.media_saved, 2, "media is still downloaded per item");

    let csv = std::fs::read_to_string(config.output.spreadsheet_dir.join("run.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("n1,"));
    assert!(lines[2].starts_with("n2,"));

    let media = &config.output.media_dir;
    assert!(media.join("u1/n1/video_0.mp4").exists());
    assert!(media.join("u2/n2/image_0.webp").exists());
}

#[tokio::test]
async fn search_resolves_only_note_results() {
    let server = MockServer::start().await;
    let out = tempfile::tempdir().unwrap();
    let config = test_config(&server, &out);

    // Five raw results, three of which are genuine notes
    Mock::given(method("POST"))
        .and(path("/api/sns/web/v1/search/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "items": [
                    {"model_type": "note", "id": "s1", "xsec_token": "t1"},
                    {"model_type": "user", "id": "someone"},
                    {"model_type": "note", "id": "s2", "xsec_token": "t2"},
                    {"model_type": "ads", "id": "promo"},
                    {"model_type": "note", "id": "s3", "xsec_token": "t3"}
                ],
                "has_more": false
            }
        })))
        .mount(&server)
        .await;

    for id in ["s1", "s2", "s3"] {
        mount_feed(&server, id, image_record(&server, id, "u1")).await;
    }

    let scraper = NoteScraper::new(config.clone()).unwrap();
    let (refs, summary) = scraper
        .scrape_search_notes("coffee", 10, &SearchFilters::default(), SaveMode::Spreadsheet)
        .await
        .unwrap();

    assert_eq!(refs.len(), 3);
    assert_eq!(refs[0].note_id, "s1");
    assert_eq!(refs[0].xsec_token, "t1");
    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.rows_written, 3);

    // Spreadsheet is named after the keyword
    let csv = std::fs::read_to_string(config.output.spreadsheet_dir.join("coffee.csv")).unwrap();
    assert_eq!(csv.lines().count(), 4);
}

#[tokio::test]
async fn user_notes_follow_cursor_pagination() {
    let server = MockServer::start().await;
    let out = tempfile::tempdir().unwrap();
    let config = test_config(&server, &out);

    Mock::given(method("GET"))
        .and(path("/api/sns/web/v1/user_posted"))
        .and(query_param("user_id", "u99"))
        .and(query_param("cursor", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "notes": [
                    {"note_id": "p1", "xsec_token": "ta"},
                    {"note_id": "p2", "xsec_token": "tb"}
                ],
                "has_more": true,
                "cursor": "c2"
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sns/web/v1/user_posted"))
        .and(query_param("user_id", "u99"))
        .and(query_param("cursor", "c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "notes": [{"note_id": "p3", "xsec_token": "tc"}],
                "has_more": false,
                "cursor": ""
            }
        })))
        .mount(&server)
        .await;

    for id in ["p1", "p2", "p3"] {
        mount_feed(&server, id, image_record(&server, id, "u99")).await;
    }

    let scraper = NoteScraper::new(config.clone()).unwrap();
    let profile_url = format!("{}/user/profile/u99", server.uri());
    let (refs, summary) = scraper
        .scrape_user_notes(&profile_url, SaveMode::Spreadsheet)
        .await
        .unwrap();

    assert_eq!(refs.len(), 3, "both pages collected");
    assert_eq!(
        refs[0].url,
        format!("{}/explore/p1?xsec_token=ta", server.uri())
    );
    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.rows_written, 3);

    // Spreadsheet is named after the owner id
    let csv = std::fs::read_to_string(config.output.spreadsheet_dir.join("u99.csv")).unwrap();
    assert_eq!(csv.lines().count(), 4);
}

#[tokio::test]
async fn retry_recovers_from_one_transient_failure() {
    let server = MockServer::start().await;
    let out = tempfile::tempdir().unwrap();
    let config = test_config(&server, &out);

    // First attempt returns an empty items array, second succeeds
    Mock::given(method("POST"))
        .and(path("/api/sns/web/v1/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"items": []}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_feed(&server, "n1", image_record(&server, "n1", "u1")).await;

    let scraper = NoteScraper::new(config.clone()).unwrap();
    let summary = scraper
        .scrape_notes(&[note_url(&server, "n1")], SaveMode::Spreadsheet, "run")
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.rows_written, 1);
}
