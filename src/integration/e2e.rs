//! End-to-end integration tests

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    use crate::config::ServerConfig;
    use crate::http::create_router;
    use crate::integration::fixtures::{StaticSource, BROKEN_VIDEO, DISABLED_VIDEO};
    use crate::source::CaptionSource;
    use crate::state::AppState;

    async fn get(source: Arc<StaticSource>, uri: &str) -> (StatusCode, Value) {
        let source: Arc<dyn CaptionSource> = source;
        let state = Arc::new(AppState::with_source(ServerConfig::default(), source));
        let response = create_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_window_scenario() {
        let source = Arc::new(StaticSource::hello_world());
        let (status, body) = get(
            source.clone(),
            "/get_transcript?video_id=abc&target_time=10&window=20",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "time_segment": "0:00 to 0:20", "text": "Hello world" })
        );
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_default_parameters() {
        let source = Arc::new(StaticSource::hello_world());
        let (status, body) = get(source, "/get_transcript?video_id=abc").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["time_segment"], "0:-20 to 0:20");
        assert_eq!(body["text"], "Hello world");
    }

    #[tokio::test]
    async fn test_fractional_and_late_window() {
        let source = Arc::new(StaticSource::hello_world());
        let (status, body) = get(
            source,
            "/get_transcript?video_id=abc&target_time=32.5&window=5",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["time_segment"], "0:30 to 0:35");
        assert_eq!(body["text"], "ignored");
    }

    #[tokio::test]
    async fn test_missing_video_id() {
        let source = Arc::new(StaticSource::hello_world());
        for uri in ["/get_transcript", "/get_transcript?video_id=&target_time=5"] {
            let (status, body) = get(source.clone(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({ "error": "video_id is required" }));
        }
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_number() {
        let source = Arc::new(StaticSource::hello_world());
        let (status, body) = get(
            source.clone(),
            "/get_transcript?video_id=abc&window=wide",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "window must be a number");
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_repeated_parameter_takes_first_value() {
        let source = Arc::new(StaticSource::hello_world());
        let (status, body) = get(
            source.clone(),
            "/get_transcript?video_id=abc&target_time=10&window=20&window=30",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "time_segment": "0:00 to 0:20", "text": "Hello world" })
        );
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_captions_unavailable() {
        let source = Arc::new(StaticSource::hello_world());
        let uri = format!("/get_transcript?video_id={}", DISABLED_VIDEO);
        let (status, body) = get(source, &uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Captions are not available for video no-captions: Subtitles are disabled for this video"
        );
    }

    #[tokio::test]
    async fn test_upstream_failure() {
        let source = Arc::new(StaticSource::hello_world());
        let uri = format!("/get_transcript?video_id={}", BROKEN_VIDEO);
        let (status, body) = get(source, &uri).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("Failed to retrieve captions:"));
        assert!(message.contains("503"));
    }

    #[tokio::test]
    async fn test_non_positive_window() {
        let source = Arc::new(StaticSource::hello_world());
        let (status, body) = get(
            source,
            "/get_transcript?video_id=abc&target_time=20&window=-4",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["time_segment"], "0:22 to 0:18");
        assert_eq!(body["text"], "");
    }

    #[tokio::test]
    async fn test_empty_track() {
        let source = Arc::new(StaticSource::new(Vec::new()));
        let (status, body) = get(
            source,
            "/get_transcript?video_id=abc&target_time=100",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "time_segment": "1:20 to 2:00", "text": "" })
        );
    }
}
