//! End-to-end tests of the reqwest transport against a local mock server.

use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncRead, ReadBuf};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::errors::{ApiErrorKind, Error};
use crate::files::{File, Files, Params};
use crate::{Bot, Config};

fn bot_for(server: &MockServer, timeout: Duration) -> Bot {
    let mut config = Config::new(Url::parse(&server.uri()).unwrap(), "123:secret");
    config.timeout = timeout;
    Bot::new(&config).unwrap()
}

async fn parse_form(content_type: &str, body: Vec<u8>) -> HashMap<String, (Option<String>, Vec<u8>)> {
    let boundary = multer::parse_boundary(content_type).unwrap();
    let stream = futures::stream::once(async move { Ok::<_, std::io::Error>(bytes::Bytes::from(body)) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap().to_string();
        let file_name = field.file_name().map(str::to_string);
        fields.insert(name, (file_name, field.bytes().await.unwrap().to_vec()));
    }
    fields
}

/// Hands out one chunk and then never becomes ready again.
struct StalledReader {
    sent: bool,
}

impl AsyncRead for StalledReader {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
        if self.sent {
            return Poll::Pending;
        }
        self.sent = true;
        buf.put_slice(b"first chunk");
        Poll::Ready(Ok(()))
    }
}

#[test_log::test(tokio::test)]
async fn test_get_me_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:secret/getMe"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"id": 42, "is_bot": true, "first_name": "Test", "username": "test_bot"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let me = bot_for(&server, Duration::from_secs(5)).get_me().await.unwrap();

    assert_eq!(me.id, 42);
    assert_eq!(me.username.as_deref(), Some("test_bot"));
}

#[test_log::test(tokio::test)]
async fn test_rate_limit_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:secret/sendMessage"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "ok": false,
            "error_code": 429,
            "description": "Too Many Requests: retry after 5",
            "parameters": {"retry_after": 5}
        })))
        .mount(&server)
        .await;

    let err = bot_for(&server, Duration::from_secs(5))
        .send_text(&1i64, "hello", None)
        .await
        .unwrap_err();

    match err {
        Error::Api(api) => {
            assert_eq!(api.kind, ApiErrorKind::TooManyRequests);
            assert_eq!(api.code, 429);
            assert_eq!(api.retry_after, Some(5));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[test_log::test(tokio::test)]
async fn test_streamed_upload_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:secret/sendDocument"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"message_id": 1, "date": 0, "chat": {"id": 7, "type": "private"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Several chunks worth of data from disk
    let content: Vec<u8> = (0..crate::multipart::CHUNK_SIZE * 5 + 17).map(|i| (i % 251) as u8).collect();
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("archive.bin");
    std::fs::write(&file_path, &content).unwrap();

    let files = Files::from([("document".to_string(), File::from_disk(&file_path))]);
    let params = Params::from([
        ("chat_id".to_string(), "7".to_string()),
        ("caption".to_string(), "weekly backup".to_string()),
    ]);

    bot_for(&server, Duration::from_secs(10))
        .send_files("sendDocument", files, params)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let content_type = requests[0].headers.get("content-type").unwrap().to_str().unwrap().to_string();
    assert!(content_type.starts_with("multipart/form-data; boundary="));

    let fields = parse_form(&content_type, requests[0].body.clone()).await;
    assert_eq!(fields["chat_id"].1, b"7");
    assert_eq!(fields["caption"].1, b"weekly backup");
    assert_eq!(fields["document"].0.as_deref(), Some("archive.bin"));
    assert_eq!(fields["document"].1, content);
}

#[test_log::test(tokio::test)]
async fn test_multipart_internal_server_error_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:secret/sendPhoto"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"ok": true, "result": true})))
        .mount(&server)
        .await;

    let files = Files::from([("photo".to_string(), File::from_bytes("p.jpg", &b"jpeg bytes"[..]))]);
    let err = bot_for(&server, Duration::from_secs(5))
        .send_files("sendPhoto", files, Params::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InternalServer), "got {err:?}");
}

#[test_log::test(tokio::test)]
async fn test_plain_500_is_decoded_as_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:secret/getMe"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "ok": false,
            "error_code": 500,
            "description": "Internal Server Error"
        })))
        .mount(&server)
        .await;

    let err = bot_for(&server, Duration::from_secs(5)).get_me().await.unwrap_err();
    assert_eq!(err.api_kind(), Some(ApiErrorKind::InternalServer));
}

#[test_log::test(tokio::test)]
async fn test_stalled_upload_times_out_and_stops_writer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})))
        .mount(&server)
        .await;

    let files = Files::from([("video".to_string(), File::from_reader(StalledReader { sent: false }))]);
    let bot = bot_for(&server, Duration::from_millis(300));

    let result = tokio::time::timeout(Duration::from_secs(10), bot.send_files("sendVideo", files, Params::new()))
        .await
        .expect("dispatch must return once the client times out");

    match result {
        Err(Error::Transport(e)) => assert!(e.is_timeout(), "expected timeout, got {e}"),
        other => panic!("expected transport timeout, got {other:?}"),
    }
}

#[test_log::test(tokio::test)]
async fn test_connection_refused_is_transport_error() {
    // Bind and drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = Config::new(Url::parse(&format!("http://127.0.0.1:{port}")).unwrap(), "123:secret");
    let bot = Bot::new(&config).unwrap();

    let err = bot.get_me().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
}
