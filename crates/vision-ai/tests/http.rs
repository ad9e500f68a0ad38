//! Integration tests for the HTTP backend using wiremock.

use futures::StreamExt;
use vision_ai::{Backend, Error, HttpBackend, Message, StreamUpdate, stream::decode_all};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse_body(records: &[&str]) -> String {
    records
        .iter()
        .map(|r| format!("data: {}\n\n", r))
        .collect()
}

#[tokio::test]
async fn open_posts_history_to_chat_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("accept", "text/event-stream"))
        .and(body_json(serde_json::json!({
            "messages": [
                {"role": "user", "content": "hello"},
                {"role": "assistant", "content": "hi!"},
                {"role": "user", "content": "look", "image_data": ["AAAA", "BBBB"]}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse_body(&[r#"{"status":"done","content":"ok"}"#]),
            "text/event-stream",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(&mock_server.uri()).unwrap();
    let messages = vec![
        Message::user("hello"),
        Message::assistant("hi!"),
        Message::user_with_images("look", vec!["AAAA".into(), "BBBB".into()]),
    ];

    let body = backend.open(&messages).await.expect("should open");
    let terminal = decode_all(body, |_| {}).await.unwrap();
    assert_eq!(terminal, "ok");
}

#[tokio::test]
async fn open_streams_partial_updates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse_body(&[
                r#"{"status":"streaming","content":"The "}"#,
                r#"{"status":"streaming","content":"answer"}"#,
                r#"{"status":"done"}"#,
            ]),
            "text/event-stream",
        ))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(&mock_server.uri()).unwrap();
    let body = backend.open(&[Message::user("q")]).await.unwrap();

    let updates: Vec<StreamUpdate> = vision_ai::stream::decode_stream(body)
        .map(|u| u.expect("no read errors"))
        .collect()
        .await;

    assert_eq!(
        updates,
        vec![
            StreamUpdate::Partial {
                text: "The ".into()
            },
            StreamUpdate::Partial {
                text: "The answer".into()
            },
            StreamUpdate::Done {
                text: "The answer".into()
            },
        ]
    );
}

#[tokio::test]
async fn open_maps_server_error_to_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream failed"))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(&mock_server.uri()).unwrap();
    let err = match backend.open(&[Message::user("q")]).await {
        Ok(_) => panic!("expected an error"),
        Err(e) => e,
    };

    match err {
        Error::Status { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "upstream failed");
        }
        other => panic!("expected Status, got: {:?}", other),
    }
}

#[tokio::test]
async fn open_maps_empty_body_to_missing_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(&mock_server.uri()).unwrap();
    let result = backend.open(&[Message::user("q")]).await;
    assert!(matches!(result, Err(Error::MissingBody)));
}

#[tokio::test]
async fn open_reports_connection_failure() {
    // Nothing listens on the mock server's address once it is dropped.
    let uri = {
        let mock_server = MockServer::start().await;
        mock_server.uri()
    };

    let backend = HttpBackend::new(&uri).unwrap();
    let result = backend.open(&[Message::user("q")]).await;
    match result {
        Err(e) => assert!(e.is_transport(), "got: {:?}", e),
        Ok(_) => panic!("expected a connection failure"),
    }
}
