//! Wire contract of the Gist backend, checked against a loopback server.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use pinboard_core::StoreError;
use pinboard_core::config::RemoteConfig;
use pinboard_core::remote::{Credential, DocumentStore, GistStore};

#[derive(Debug)]
struct Recorded {
    method: String,
    path: String,
    authorization: Option<String>,
    body: String,
}

struct Reply {
    status: u16,
    body: String,
}

fn reply(status: u16, body: impl Into<String>) -> Reply {
    Reply {
        status,
        body: body.into(),
    }
}

fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let base = format!("http://{}", listener.local_addr().expect("addr"));
    (listener, base)
}

/// Answer one request per reply, in order, then return what was received.
fn serve(listener: TcpListener, replies: Vec<Reply>) -> JoinHandle<Vec<Recorded>> {
    thread::spawn(move || {
        let mut seen = Vec::new();
        for reply in replies {
            let (stream, _) = listener.accept().expect("accept");
            seen.push(handle(stream, &reply));
        }
        seen
    })
}

fn handle(stream: TcpStream, reply: &Reply) -> Recorded {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("header line");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            match name.to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().expect("length"),
                "authorization" => authorization = Some(value.to_string()),
                _ => {}
            }
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).expect("body");

    let mut stream = stream;
    write!(
        stream,
        "HTTP/1.1 {} Reply\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reply.body.len(),
        reply.body
    )
    .expect("write reply");
    stream.flush().expect("flush");

    Recorded {
        method,
        path,
        authorization,
        body: String::from_utf8(body).expect("utf8 body"),
    }
}

fn store(base: &str) -> GistStore {
    GistStore::new(RemoteConfig {
        api_base: base.to_string(),
        timeout_secs: Some(5),
        ..RemoteConfig::default()
    })
}

fn token() -> Credential {
    Credential::new("ghp_secret").expect("token")
}

#[test]
fn fetch_is_anonymous_and_reads_the_payload_file() {
    let (listener, base) = bind();
    let server = serve(
        listener,
        vec![reply(
            200,
            r#"{"id":"abc","files":{"events.json":{"content":"{\"events\":[],\"lastUpdate\":\"t1\"}","truncated":false}}}"#,
        )],
    );

    let doc = store(&base).fetch("abc").expect("fetch");
    assert_eq!(doc.id, "abc");
    assert!(doc.content.contains("\"lastUpdate\":\"t1\""));

    let seen = server.join().expect("server");
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].path, "/gists/abc");
    assert!(seen[0].authorization.is_none());
}

#[test]
fn truncated_payload_is_fetched_from_raw_url() {
    let (listener, base) = bind();
    let listing = format!(
        r#"{{"id":"abc","files":{{"events.json":{{"content":"{{\"ev","truncated":true,"raw_url":"{base}/raw/events.json"}}}}}}"#
    );
    let full = r#"{"events":[],"lastUpdate":"t9","version":9}"#;
    let server = serve(listener, vec![reply(200, listing), reply(200, full)]);

    let doc = store(&base).fetch("abc").expect("fetch");
    assert_eq!(doc.content, full);

    let seen = server.join().expect("server");
    assert_eq!(seen[1].path, "/raw/events.json");
}

#[test]
fn gist_without_payload_file_is_not_found() {
    let (listener, base) = bind();
    let server = serve(
        listener,
        vec![reply(200, r#"{"id":"abc","files":{"notes.md":{"content":"hi"}}}"#)],
    );

    let err = store(&base).fetch("abc").unwrap_err();
    assert_eq!(
        err,
        StoreError::NotFound {
            document_id: "abc".to_string()
        }
    );
    server.join().expect("server");
}

#[test]
fn missing_gist_is_not_found() {
    let (listener, base) = bind();
    let server = serve(listener, vec![reply(404, r#"{"message":"Not Found"}"#)]);

    let err = store(&base).fetch("gone").unwrap_err();
    assert!(matches!(err, StoreError::NotFound { document_id } if document_id == "gone"));
    server.join().expect("server");
}

#[test]
fn create_posts_public_gist_with_bearer_token() {
    let (listener, base) = bind();
    let server = serve(listener, vec![reply(201, r#"{"id":"new123"}"#)]);

    let id = store(&base).create(&token(), "{}").expect("create");
    assert_eq!(id, "new123");

    let seen = server.join().expect("server");
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].path, "/gists");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer ghp_secret"));

    let body: serde_json::Value = serde_json::from_str(&seen[0].body).expect("json body");
    assert_eq!(body["public"], true);
    assert_eq!(body["description"], "Pinboard events");
    assert_eq!(body["files"]["events.json"]["content"], "{}");
}

#[test]
fn replace_patches_without_visibility() {
    let (listener, base) = bind();
    let server = serve(listener, vec![reply(200, r#"{"id":"abc"}"#)]);

    store(&base)
        .replace(&token(), "abc", "{\"events\":[]}")
        .expect("replace");

    let seen = server.join().expect("server");
    assert_eq!(seen[0].method, "PATCH");
    assert_eq!(seen[0].path, "/gists/abc");
    let body: serde_json::Value = serde_json::from_str(&seen[0].body).expect("json body");
    assert!(body.get("public").is_none());
    assert_eq!(body["files"]["events.json"]["content"], "{\"events\":[]}");
}

#[test]
fn rejected_token_is_unauthorized() {
    let (listener, base) = bind();
    let server = serve(listener, vec![reply(401, r#"{"message":"Bad credentials"}"#)]);

    let err = store(&base).replace(&token(), "abc", "{}").unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized { .. }));
    assert!(!err.to_string().contains("ghp_secret"));
    server.join().expect("server");
}

#[test]
fn server_error_is_request_failed() {
    let (listener, base) = bind();
    let server = serve(listener, vec![reply(502, "upstream down")]);

    let err = store(&base).create(&token(), "{}").unwrap_err();
    assert!(matches!(err, StoreError::RequestFailed { reason } if reason.contains("502")));
    server.join().expect("server");
}
