//! Integration tests for `ApiClient` against an in-process HTTP server.

use std::time::Duration;

use draftdesk_core::api::{ApiClient, GenerationRequest, RegenerateRequest};
use draftdesk_core::error::{ApiError, ErrorKind};
use draftdesk_core::types::ContentType;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const SSE_HEAD: &str =
    "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n";

/// Serves exactly one connection: reads the request, then writes each part
/// with a short pause between them and closes. Resolves to the raw request.
async fn serve_once(parts: Vec<String>) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        for part in parts {
            socket.write_all(part.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        socket.shutdown().await.ok();
        request
    });
    (base, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn json_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}

fn request() -> GenerationRequest {
    let mut req = GenerationRequest::new("alice", ContentType::Tweet);
    req.topic = Some("rust".into());
    req
}

fn client(base: &str) -> ApiClient {
    client_with_timeout(base, Duration::from_secs(5))
}

fn client_with_timeout(base: &str, timeout: Duration) -> ApiClient {
    // Loopback only; ignore any proxy configured in the environment.
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .no_proxy()
        .build()
        .unwrap();
    ApiClient::with_http(base, http)
}

#[tokio::test]
async fn streamed_progress_then_completion() {
    let (base, server) = serve_once(vec![
        SSE_HEAD.to_string(),
        "data: {\"step\":\"progress\",\"message\":\"researching\"}\n\n".to_string(),
        "data: {\"step\":\"complete\",\"message\":\"done\",\"data\":{\"proposals\":{}}}\n\n"
            .to_string(),
    ])
    .await;

    let mut steps = Vec::new();
    let result = client(&base)
        .generate_stream(&request(), |e| steps.push((e.step, e.message)))
        .await
        .unwrap();

    assert_eq!(steps, vec![("progress".to_string(), "researching".to_string())]);
    assert!(result.proposals.is_empty());

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /api/inspire/stream "));
    assert!(raw.contains("\"username\":\"alice\""));
}

#[tokio::test]
async fn event_split_across_writes_is_reassembled() {
    let (base, _server) = serve_once(vec![
        SSE_HEAD.to_string(),
        "data: {\"step\":\"comp".to_string(),
        "lete\",\"message\":\"\",\"data\":{\"proposals\":{},\"research_id\":\"r9\"}}\n\n"
            .to_string(),
    ])
    .await;

    let result = client(&base).generate_stream(&request(), |_| {}).await.unwrap();
    assert_eq!(result.research_id.as_deref(), Some("r9"));
}

#[tokio::test]
async fn stream_closing_early_is_a_protocol_error() {
    let (base, _server) = serve_once(vec![
        SSE_HEAD.to_string(),
        "data: {\"step\":\"progress\",\"message\":\"researching\"}\n\n".to_string(),
    ])
    .await;

    let mut fired = 0;
    let err = client(&base)
        .generate_stream(&request(), |_| fired += 1)
        .await
        .unwrap_err();
    assert_eq!(fired, 1);
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn stalled_stream_past_the_client_timeout_is_a_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let _server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(SSE_HEAD.as_bytes()).await.unwrap();
        socket
            .write_all(b"data: {\"step\":\"research\",\"message\":\"digging\"}\n\n")
            .await
            .unwrap();
        socket.flush().await.unwrap();
        // Hold the connection open well past the client's deadline.
        tokio::time::sleep(Duration::from_secs(3)).await;
    });

    let mut fired = 0;
    let err = client_with_timeout(&base, Duration::from_millis(700))
        .generate_stream(&request(), |_| fired += 1)
        .await
        .unwrap_err();
    assert_eq!(fired, 1);
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn refused_connection_is_a_connectivity_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = client(&base)
        .generate_stream(&request(), |_| {})
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connectivity);
}

#[tokio::test]
async fn proxy_timeout_maps_to_timeout() {
    let (base, _server) = serve_once(vec![json_response("504 Gateway Timeout", "")]).await;
    let err = client(&base).generate(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn service_error_detail_is_surfaced() {
    let (base, _server) = serve_once(vec![json_response(
        "400 Bad Request",
        r#"{"detail":"Tweet URL is required for content type 'reply'"}"#,
    )])
    .await;

    let err = client(&base).generate(&request()).await.unwrap_err();
    match err {
        ApiError::Application { status, message } => {
            assert_eq!(status, Some(400));
            assert_eq!(message, "Tweet URL is required for content type 'reply'");
        }
        other => panic!("expected application error, got {other:?}"),
    }
}

#[tokio::test]
async fn regenerate_posts_suggestions_and_decodes_proposals() {
    let (base, server) = serve_once(vec![json_response(
        "200 OK",
        r#"{"proposals":{"tweet":[{"content":"fresh take","virality_score":8.0}]}}"#,
    )])
    .await;

    let req = RegenerateRequest {
        research_id: "r-1".into(),
        content_type: ContentType::Tweet,
        thread_count: 5,
        vibe: None,
        context: None,
        suggestions: Some("For \"love\": stronger verb".into()),
    };
    let response = client(&base).regenerate(&req).await.unwrap();
    assert_eq!(response.proposals.tweet.len(), 1);
    assert_eq!(response.proposals.tweet[0].content.items(), vec!["fresh take"]);

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /api/inspire/regenerate "));
    assert!(raw.contains(r#""suggestions":"For \"love\": stronger verb""#));
}

#[tokio::test]
async fn invalid_request_is_never_sent() {
    // Nothing listens here; validation must fail first.
    let api = client("http://127.0.0.1:9");
    let req = GenerationRequest::new("alice", ContentType::Quote);
    let err = api.generate_stream(&req, |_| {}).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn health_reports_status() {
    let (base, server) = serve_once(vec![json_response("200 OK", r#"{"status":"healthy"}"#)]).await;
    let health = client(&base).health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert!(server.await.unwrap().starts_with("GET /health "));
}
