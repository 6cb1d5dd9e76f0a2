use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use mathsolver_gateway::{
    ai::{
        gemini::{Content, Part},
        GeminiClient, MockModelClient,
    },
    models::Config,
    prompts,
    server::GatewayServer,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "X-MATHSOLVER-BOUNDARY";
const GENERATE_CONTENT_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

fn mock_app(mock: Arc<MockModelClient>) -> Router {
    GatewayServer::new(Config::default(), mock).build_router()
}

fn gemini_app(server: &MockServer, api_key: Option<&str>) -> Router {
    let client = GeminiClient::new(api_key.map(str::to_string)).with_base_url(server.uri());
    GatewayServer::new(Config::default(), Arc::new(client)).build_router()
}

/// Multipart field: (name, filename + content type for files, bytes).
type FormField<'a> = (&'a str, Option<(&'a str, Option<&'a str>)>, &'a [u8]);

fn multipart_body(fields: &[FormField<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file, data) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file {
            Some((filename, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                if let Some(content_type) = content_type {
                    body.extend_from_slice(
                        format!("Content-Type: {}\r\n", content_type).as_bytes(),
                    );
                }
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n", name).as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn image_request(fields: &[FormField<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/solve/image")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(fields)))
        .unwrap()
}

fn text_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/solve/text")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_liveness_endpoints() {
    let app = mock_app(Arc::new(MockModelClient::new()));

    let (status, json) = send(
        app.clone(),
        Request::builder().uri("/").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "message": "Hello from FastAPI Backend!" }));

    let (status, json) = send(
        app,
        Request::builder()
            .uri("/api/hello")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "message": "Hello from the backend API!" }));
}

#[tokio::test]
async fn test_diagnostics_endpoint() {
    let config = Config {
        database_url_set: true,
        ..Config::default()
    };
    let app = GatewayServer::new(config, Arc::new(MockModelClient::new())).build_router();

    let (status, json) = send(
        app,
        Request::builder().uri("/test").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["backend"], "✅ Running");
    assert_eq!(json["database_url"], "✅ Set");
    assert_eq!(json["database_name"], "❌ Not Set");
    assert_eq!(json["collections"], json!([]));
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = mock_app(Arc::new(MockModelClient::new()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/hello")
                .header(header::ORIGIN, "https://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_solve_text_builds_three_parts() {
    let mock = Arc::new(MockModelClient::new().with_response("x = 3".to_string()));
    let app = mock_app(mock.clone());

    let (status, json) = send(app, text_request(json!({ "query": "x + 2 = 5" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "answer": "x = 3" }));
    assert_eq!(
        mock.requests(),
        vec![vec![Content::user(vec![
            Part::text(prompts::TEXT_INSTRUCTION),
            Part::text("Problem:"),
            Part::text("x + 2 = 5"),
        ])]]
    );
}

#[tokio::test]
async fn test_solve_text_with_null_instruction_uses_default() {
    let mock = Arc::new(MockModelClient::new());
    let app = mock_app(mock.clone());

    let (status, _) = send(
        app,
        text_request(json!({ "query": "1 + 1", "system_instruction": null })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        mock.requests()[0][0].parts[0],
        Part::text(prompts::TEXT_INSTRUCTION)
    );
}

#[tokio::test]
async fn test_solve_text_rejects_missing_query() {
    let mock = Arc::new(MockModelClient::new());
    let app = mock_app(mock.clone());

    let (status, json) = send(app, text_request(json!({ "system_instruction": "hi" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.starts_with("Invalid request body: "));
    assert!(detail.contains("query"));
    assert_eq!(mock.get_call_count(), 0);
}

#[tokio::test]
async fn test_solve_text_rejects_malformed_json_with_detail_body() {
    let mock = Arc::new(MockModelClient::new());
    let app = mock_app(mock.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/solve/text")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"query\": "))
        .unwrap();
    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body: "));
    assert_eq!(mock.get_call_count(), 0);
}

#[tokio::test]
async fn test_solve_image_with_query_builds_four_parts() {
    let mock = Arc::new(MockModelClient::new().with_response("area = 12".to_string()));
    let app = mock_app(mock.clone());

    let (status, json) = send(
        app,
        image_request(&[
            ("image", Some(("problem.jpg", Some("image/jpeg"))), &[1, 2, 3]),
            ("query", None, b"units are cm"),
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["answer"], "area = 12");

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0][0].parts,
        vec![
            Part::text(prompts::IMAGE_INSTRUCTION),
            Part::inline_data("image/jpeg", "AQID"),
            Part::text("Additional context:"),
            Part::text("units are cm"),
        ]
    );
}

#[tokio::test]
async fn test_solve_image_without_query_builds_two_parts() {
    let mock = Arc::new(MockModelClient::new());
    let app = mock_app(mock.clone());

    let png: [u8; 6] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A];
    let (status, _) = send(
        app,
        image_request(&[("image", Some(("problem", None)), &png)]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let parts = &mock.requests()[0][0].parts;
    assert_eq!(parts.len(), 2);
    match &parts[1] {
        Part::InlineData { inline_data } => assert_eq!(inline_data.mime_type, "image/png"),
        other => panic!("expected inline data, got {:?}", other),
    }
}

#[tokio::test]
async fn test_solve_image_empty_upload_is_rejected() {
    let mock = Arc::new(MockModelClient::new());
    let app = mock_app(mock.clone());

    let (status, json) = send(
        app,
        image_request(&[("image", Some(("empty.png", Some("image/png"))), &[])]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "Empty image upload");
    assert_eq!(mock.get_call_count(), 0);
}

#[tokio::test]
async fn test_solve_image_missing_file_is_rejected() {
    let mock = Arc::new(MockModelClient::new());
    let app = mock_app(mock.clone());

    let (status, json) = send(app, image_request(&[("query", None, b"no image")])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "Missing image upload");
    assert_eq!(mock.get_call_count(), 0);
}

#[tokio::test]
async fn test_solve_image_over_upload_limit_is_rejected() {
    let mock = Arc::new(MockModelClient::new());
    let config = Config {
        max_upload_bytes: 64,
        ..Config::default()
    };
    let app = GatewayServer::new(config, mock.clone()).build_router();

    let big = vec![0xAB_u8; 4096];
    let (status, _) = send(
        app,
        image_request(&[(
            "image",
            Some(("big.png", Some("image/png"))),
            big.as_slice(),
        )]),
    )
    .await;

    assert!(status.is_client_error());
    assert_eq!(mock.get_call_count(), 0);
}

#[tokio::test]
async fn test_solve_text_end_to_end_with_gemini() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_CONTENT_PATH))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "a" }, { "text": "b" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = send(
        gemini_app(&server, Some("test-key")),
        text_request(json!({ "query": "say a then b" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "answer": "a\nb" }));
}

#[tokio::test]
async fn test_missing_api_key_fails_both_solve_endpoints_without_network() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, json) = send(
        gemini_app(&server, None),
        text_request(json!({ "query": "1 + 1" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["detail"], "GEMINI_API_KEY not configured on server");

    let (status, json) = send(
        gemini_app(&server, None),
        image_request(&[("image", Some(("p.png", Some("image/png"))), &[1])]),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["detail"], "GEMINI_API_KEY not configured on server");
}

#[tokio::test]
async fn test_provider_rate_limit_is_mirrored() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_CONTENT_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = send(
        gemini_app(&server, Some("test-key")),
        text_request(json!({ "query": "1 + 1" })),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["detail"], "Gemini API error: rate limited");
}

#[tokio::test]
async fn test_malformed_provider_response_still_answers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_CONTENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&server)
        .await;

    let (status, json) = send(
        gemini_app(&server, Some("test-key")),
        image_request(&[("image", Some(("p.png", Some("image/png"))), &[9, 9])]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let answer = json["answer"].as_str().unwrap();
    assert!(answer.starts_with("Unable to parse model response. Raw: "));
}

#[tokio::test]
async fn test_unreachable_provider_returns_bad_gateway() {
    let client =
        GeminiClient::new(Some("test-key".to_string())).with_base_url("http://127.0.0.1:9".into());
    let app = GatewayServer::new(Config::default(), Arc::new(client)).build_router();

    let (status, json) = send(app, text_request(json!({ "query": "1 + 1" }))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .starts_with("Error contacting Gemini: "));
}
