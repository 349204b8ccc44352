use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use culinary::{
    build_prompt, CulinaryError, GeminiClient, ImageModel, InlineData, PhotoTransformer,
    TransformMode, TransformRequest, TRANSFORM_FAILED_MESSAGE,
};

const ENDPOINT: &str = "/v1beta/models/gemini-2.5-flash-image:generateContent";

fn build_client(base_url: &str) -> GeminiClient {
    GeminiClient::builder()
        .api_key("test-key")
        .base_url(base_url)
        .build()
        .unwrap()
}

fn request() -> TransformRequest {
    TransformRequest::new("/9j/4AAQ", "image/jpeg", TransformMode::Reimagine).with_label("Ramen")
}

#[tokio::test]
async fn test_sends_documented_body_and_key() {
    let mock_server = MockServer::start().await;
    let expected = json!({
        "contents": [{
            "parts": [
                {"inlineData": {"mimeType": "image/jpeg", "data": "/9j/4AAQ"}},
                {"text": build_prompt(TransformMode::Reimagine, Some("Ramen"))}
            ]
        }],
        "generationConfig": {"responseModalities": ["IMAGE", "TEXT"]}
    });

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_json(expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "Here is your photo"},
                        {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
                    ]
                },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transformer = PhotoTransformer::from_model(build_client(&mock_server.uri()));
    let image = transformer.transform(&request()).await.unwrap();
    assert_eq!(image, "iVBORw0KGgo=");
}

#[tokio::test]
async fn test_only_first_candidate_is_scanned() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                {"content": {"parts": [{"text": "I cannot edit this image."}]}},
                {"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "AAAA"}}]}}
            ]
        })))
        .mount(&mock_server)
        .await;

    let transformer = PhotoTransformer::from_model(build_client(&mock_server.uri()));
    let err = transformer.transform(&request()).await.unwrap_err();
    assert!(matches!(err, CulinaryError::NoImageReturned));
}

#[tokio::test]
async fn test_zero_candidates_is_no_image() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&mock_server)
        .await;

    let transformer = PhotoTransformer::from_model(build_client(&mock_server.uri()));
    let err = transformer.transform(&request()).await.unwrap_err();
    assert!(matches!(err, CulinaryError::NoImageReturned));
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "API key not valid", "status": "UNAUTHENTICATED"}
        })))
        .mount(&mock_server)
        .await;

    let client = build_client(&mock_server.uri());
    let image = InlineData::new("image/jpeg", "/9j/4AAQ");
    let err = client.send_image_and_prompt(&image, "prompt").await.unwrap_err();
    assert!(matches!(err, CulinaryError::Auth(ref m) if m == "API key not valid"));
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&mock_server)
        .await;

    let client = build_client(&mock_server.uri());
    let image = InlineData::new("image/jpeg", "/9j/4AAQ");
    let err = client.send_image_and_prompt(&image, "prompt").await.unwrap_err();
    assert!(matches!(
        err,
        CulinaryError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(7)
    ));
}

#[tokio::test]
async fn test_server_error_becomes_transform_failed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend unavailable"))
        .mount(&mock_server)
        .await;

    let transformer = PhotoTransformer::from_model(build_client(&mock_server.uri()));
    let err = transformer.transform(&request()).await.unwrap_err();

    assert_eq!(err.user_message(), TRANSFORM_FAILED_MESSAGE);
    match err {
        CulinaryError::TransformFailed { source } => {
            assert!(matches!(
                *source,
                CulinaryError::Api { status: 500, ref message } if message == "backend unavailable"
            ));
        }
        other => panic!("expected TransformFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_prompt_feedback_block() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&mock_server)
        .await;

    let client = build_client(&mock_server.uri());
    let image = InlineData::new("image/jpeg", "/9j/4AAQ");
    let err = client.send_image_and_prompt(&image, "prompt").await.unwrap_err();
    assert!(matches!(err, CulinaryError::ContentBlocked(ref m) if m == "Prompt blocked: SAFETY"));
}

#[tokio::test]
async fn test_unknown_model_is_api_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/no-such-model:generateContent"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = GeminiClient::builder()
        .api_key("test-key")
        .base_url(mock_server.uri())
        .model(culinary::GeminiModel::Custom("no-such-model".into()))
        .build()
        .unwrap();
    let image = InlineData::new("image/jpeg", "/9j/4AAQ");
    let err = client.send_image_and_prompt(&image, "prompt").await.unwrap_err();
    assert!(matches!(err, CulinaryError::Api { status: 404, ref message } if message.contains("no-such-model")));
}
