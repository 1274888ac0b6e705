//! Integration tests for the streaming routes.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{body_bytes, body_json, pattern, TestHarness, MIB, SHORT};
use http_body_util::BodyExt;
use tower::ServiceExt;

fn header_str<'a>(response: &'a axum::http::Response<Body>, name: header::HeaderName) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Full and partial responses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_object_without_range() {
    let h = TestHarness::new();
    let data = pattern(3 * MIB + 17);
    h.insert(42, Some("clip.mp4"), Some("video/mp4"), data.clone());

    let response = h.get(&format!("/file/42/clip.mp4?hash={SHORT}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "video/mp4");
    assert_eq!(
        header_str(&response, header::CONTENT_LENGTH),
        data.len().to_string()
    );
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        format!("bytes 0-{}/{}", data.len() - 1, data.len())
    );
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), "bytes");
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        "inline; filename=\"clip.mp4\""
    );
    assert_eq!(
        header_str(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN),
        "*"
    );

    let body = body_bytes(response).await;
    assert_eq!(body, data);
    assert_eq!(h.sources[0].chunk_fetches(), 4);
    assert_eq!(h.loads(), vec![0]);
}

#[tokio::test]
async fn single_byte_range() {
    let h = TestHarness::new();
    let data = pattern(2048);
    h.insert(7, Some("a.bin"), None, data.clone());

    let response = h
        .get(&format!("/file/7/a.bin?hash={SHORT}"), Some("bytes=0-0"))
        .await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), "1");
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        "bytes 0-0/2048"
    );
    assert_eq!(body_bytes(response).await, vec![data[0]]);
}

#[tokio::test]
async fn aligned_range_reads_exactly_one_chunk() {
    let h = TestHarness::new();
    let data = pattern(10 * MIB);
    h.insert(42, Some("movie.mkv"), None, data.clone());

    let response = h
        .get(
            &format!("/file/42/movie.mkv?hash={SHORT}"),
            Some("bytes=1048576-2097151"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        "video/x-matroska"
    );
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        "bytes 1048576-2097151/10485760"
    );

    let body = body_bytes(response).await;
    assert_eq!(body.len(), MIB);
    assert_eq!(body, data[MIB..2 * MIB]);
    assert_eq!(h.sources[0].chunk_fetches(), 1);
}

#[tokio::test]
async fn unaligned_range_spanning_chunks() {
    let h = TestHarness::new();
    let data = pattern(4 * MIB);
    h.insert(5, Some("x.webm"), None, data.clone());

    let start = MIB - 10;
    let end = 3 * MIB + 9;
    let response = h
        .get(
            &format!("/file/5/x.webm?hash={SHORT}"),
            Some(&format!("bytes={start}-{end}")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "video/webm");

    let body = body_bytes(response).await;
    assert_eq!(body, data[start..=end]);
    assert_eq!(h.sources[0].chunk_fetches(), 4);
}

#[tokio::test]
async fn open_ended_range() {
    let h = TestHarness::new();
    let data = pattern(MIB + 100);
    h.insert(9, None, Some("audio/ogg"), data.clone());

    let response = h
        .get(&format!("/9?hash={SHORT}"), Some("bytes=1048570-"))
        .await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "audio/ogg");
    assert!(header_str(&response, header::CONTENT_DISPOSITION).ends_with(".bin\""));
    assert_eq!(body_bytes(response).await, data[1_048_570..]);
}

#[tokio::test]
async fn head_request_reports_headers() {
    let h = TestHarness::new();
    h.insert(3, Some("clip.mp4"), None, pattern(4096));

    let response = h
        .router()
        .oneshot(
            Request::head(format!("/file/3/clip.mp4?hash={SHORT}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), "4096");
}

// ---------------------------------------------------------------------------
// Path forms
// ---------------------------------------------------------------------------

#[tokio::test]
async fn compact_path_form() {
    let h = TestHarness::new();
    let data = pattern(1000);
    h.insert(42, Some("clip.mp4"), None, data.clone());

    let response = h.get(&format!("/{SHORT}42"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, data);
}

#[tokio::test]
async fn bare_id_with_query_hash() {
    let h = TestHarness::new();
    h.insert(42, Some("clip.mp4"), None, pattern(1000));

    let response = h.get(&format!("/42/anything.mp4?hash={SHORT}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn download_flag_sets_attachment() {
    let h = TestHarness::new();
    h.insert(42, Some("my \"clip\".mp4"), None, pattern(10));

    let response = h
        .get(&format!("/file/42/clip.mp4?hash={SHORT}&download=1"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        "attachment; filename=\"my _clip_.mp4\""
    );
}

#[tokio::test]
async fn post_to_stream_path_is_rejected() {
    let h = TestHarness::new();
    h.insert(42, None, None, pattern(10));

    let response = h
        .router()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/{SHORT}42"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wrong_token_is_forbidden_without_load_change() {
    let h = TestHarness::new();
    h.insert(42, Some("clip.mp4"), None, pattern(4096));

    let response = h.get("/file/42/clip.mp4?hash=ZZZZZZ", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "invalid_hash");

    assert_eq!(h.loads(), vec![0]);
    assert_eq!(h.sources[0].chunk_fetches(), 0);
}

#[tokio::test]
async fn missing_token_is_forbidden() {
    let h = TestHarness::new();
    h.insert(42, Some("clip.mp4"), None, pattern(4096));

    let response = h.get("/file/42/clip.mp4", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_object_is_not_found() {
    let h = TestHarness::new();

    let response = h.get(&format!("/file/404/none.mp4?hash={SHORT}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "not_found");
    assert_eq!(h.loads(), vec![0]);
}

#[tokio::test]
async fn unparseable_path_is_bad_request() {
    let h = TestHarness::new();

    let response = h.get(&format!("/file/abc/none.mp4?hash={SHORT}"), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = h.get("/favicon.ico", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn range_past_end_is_unsatisfiable() {
    let h = TestHarness::new();
    h.insert(42, Some("movie.mkv"), None, pattern(10 * MIB));

    let response = h
        .get(
            &format!("/file/42/movie.mkv?hash={SHORT}"),
            Some("bytes=20000000-"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        "bytes */10485760"
    );
    assert_eq!(h.loads(), vec![0]);
    assert_eq!(h.sources[0].chunk_fetches(), 0);
}

#[tokio::test]
async fn malformed_range_is_bad_request() {
    let h = TestHarness::new();
    h.insert(42, Some("clip.mp4"), None, pattern(100));

    for range in ["items=0-1", "bytes=a-b", "bytes=0-1,5-6", "bytes=-10"] {
        let response = h
            .get(&format!("/file/42/clip.mp4?hash={SHORT}"), Some(range))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "range {range}");
    }
    // Rejected before the object is ever looked up.
    assert_eq!(h.sources[0].metadata_lookups(), 0);
    assert_eq!(h.loads(), vec![0]);
}

#[tokio::test]
async fn oversized_range_position_is_unsatisfiable() {
    let h = TestHarness::new();
    h.insert(42, Some("clip.mp4"), None, pattern(10));

    let response = h
        .get(
            &format!("/file/42/clip.mp4?hash={SHORT}"),
            Some("bytes=0-99999999999999999999999"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes */10");
}

#[tokio::test]
async fn blank_range_header_serves_whole_object() {
    let h = TestHarness::new();
    let data = pattern(300);
    h.insert(42, Some("clip.mp4"), None, data.clone());

    let response = h
        .get(&format!("/file/42/clip.mp4?hash={SHORT}"), Some(""))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, data);
}

// ---------------------------------------------------------------------------
// Load accounting and caching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_streams_spread_across_clients() {
    let h = TestHarness::with_clients(2);
    h.insert(42, Some("movie.mkv"), None, pattern(4 * MIB));
    let uri = format!("/file/42/movie.mkv?hash={SHORT}");

    // Bodies are held unread so both sessions stay open.
    let first = h.get(&uri, None).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(h.loads(), vec![1, 0]);

    let second = h.get(&uri, None).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(h.loads(), vec![1, 1]);

    let third = h.get(&uri, None).await;
    assert_eq!(h.loads(), vec![2, 1]);

    drop(first);
    assert_eq!(h.loads(), vec![1, 1]);
    body_bytes(second).await;
    body_bytes(third).await;
    assert_eq!(h.loads(), vec![0, 0]);
}

#[tokio::test]
async fn abandoned_body_releases_load() {
    let h = TestHarness::new();
    h.insert(42, Some("movie.mkv"), None, pattern(4 * MIB));

    let response = h.get(&format!("/file/42/movie.mkv?hash={SHORT}"), None).await;
    let mut body = response.into_body();
    let first = body.frame().await.unwrap().unwrap();
    assert_eq!(first.into_data().unwrap().len(), MIB);
    assert_eq!(h.loads(), vec![1]);

    drop(body);
    assert_eq!(h.loads(), vec![0]);
    assert_eq!(h.sources[0].chunk_fetches(), 1);
}

#[tokio::test]
async fn upstream_failure_truncates_body_and_releases_load() {
    let h = TestHarness::new();
    h.insert(42, Some("movie.mkv"), None, pattern(3 * MIB));
    h.sources[0].fail_from_chunk(1);

    let response = h.get(&format!("/file/42/movie.mkv?hash={SHORT}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.into_body().collect().await.is_err());
    assert_eq!(h.loads(), vec![0]);
}

#[tokio::test]
async fn metadata_is_resolved_once_per_client() {
    let h = TestHarness::new();
    h.insert(42, Some("clip.mp4"), None, pattern(100));
    let uri = format!("/file/42/clip.mp4?hash={SHORT}");

    for range in ["bytes=0-9", "bytes=10-19", "bytes=20-"] {
        let response = h.get(&uri, Some(range)).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        body_bytes(response).await;
    }
    assert_eq!(h.sources[0].metadata_lookups(), 1);
    assert_eq!(h.ctx.resolver.cache().len(), 1);
}
